use crate::error::AppError;
use crate::model::{Task, format_reminder_time};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

const DISABLE_ENV_VAR: &str = "ADIUTOR_DISABLE_NOTIFICATIONS";
const APP_NAME: &str = "adiutor";

/// Delivers a fired reminder to the desktop.
pub trait Notifier {
    fn notify(&self, task: &Task) -> Result<(), AppError>;

    fn notify_with_action(&self, task: &Task, action: &str) -> Result<(), AppError> {
        let _ = action;
        self.notify(task)
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _task: &Task) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct NotificationOutcome {
    pub delivered: Vec<Task>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub error: AppError,
}

/// Sends every task, collecting failures instead of stopping at the first.
pub fn deliver(notifier: &dyn Notifier, tasks: &[Task]) -> NotificationOutcome {
    let mut delivered = Vec::new();
    let mut failures = Vec::new();

    for task in tasks {
        let action = activation_argument(task.id());
        match notifier.notify_with_action(task, &action) {
            Ok(()) => delivered.push(task.clone()),
            Err(error) => {
                tracing::warn!(id = task.id(), %error, "notification failed");
                failures.push(NotificationFailure {
                    task_id: task.id().to_string(),
                    error,
                });
            }
        }
    }

    NotificationOutcome {
        delivered,
        failures,
    }
}

pub fn notification_body(task: &Task) -> String {
    match task.reminder_time() {
        Some(at) => format!("{} (due {})", task.title(), format_reminder_time(at)),
        None => task.title().to_string(),
    }
}

/// `enabled` comes from configuration; the environment switch overrides it.
pub fn notifier_for(enabled: bool) -> Result<Box<dyn Notifier>, AppError> {
    if !enabled || std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Ok(Box::new(NoopNotifier));
    }

    match platform_notifier() {
        Ok(notifier) => Ok(notifier),
        Err(err) => match err {
            AppError::InvalidData(_) => Ok(Box::new(NoopNotifier)),
            other => Err(other),
        },
    }
}

const ACTION_PREFIX: &str = "show:";

pub fn activation_argument(task_id: &str) -> String {
    format!("{ACTION_PREFIX}{task_id}")
}

pub fn parse_activation_argument(argument: &str) -> Option<String> {
    argument
        .strip_prefix(ACTION_PREFIX)
        .map(|id| id.to_string())
}

/// Re-launches the current executable as `<exe> show <id>`.
pub fn launch_show(task_id: &str) -> Result<(), AppError> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(exe)
        .arg("show")
        .arg(task_id)
        .spawn()?;
    Ok(())
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
