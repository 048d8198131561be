pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod period;
pub mod reminder;
pub mod storage;
pub mod streak;
pub mod task_store;
pub mod tool_call;
pub mod view;

#[cfg(test)]
mod tests {
    use crate::error::AppError;

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.message(), "missing title");
        assert_eq!(err.to_string(), "invalid_input - missing title");
    }

    #[test]
    fn io_errors_convert() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert_eq!(err.code(), "io_error");
    }
}
