mod streak;
mod task;

pub use streak::{LegacyStreak, StreakPeriod, StreakSettings, StreakState};
pub use task::{
    Category, Priority, Task, TaskStatus, format_due_date, format_reminder_time,
    normalize_tags, parse_due_date, parse_reminder_time, split_tags,
};
