use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

const DUE_DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const REMINDER_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");

time::serde::format_description!(due_date_format, Date, "[year]-[month]-[day]");
time::serde::format_description!(
    reminder_format,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]"
);

/// A tracked unit of work.
///
/// Fields are only writable inside the crate so that `TaskStore` stays the
/// single place where status and reminder invariants are maintained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) status: TaskStatus,
    #[serde(default)]
    pub(crate) priority: Priority,
    #[serde(default)]
    pub(crate) category: Category,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(
        default,
        with = "due_date_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) due_date: Option<Date>,
    #[serde(
        default,
        with = "reminder_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) reminder_time: Option<PrimitiveDateTime>,
    #[serde(default)]
    pub(crate) reminded: bool,
}

impl Task {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Always equal to `status == Done`; there is no separate flag to drift.
    pub fn completed(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn due_date(&self) -> Option<Date> {
        self.due_date
    }

    pub fn reminder_time(&self) -> Option<PrimitiveDateTime> {
        self.reminder_time
    }

    pub fn reminded(&self) -> bool {
        self.reminded
    }

    /// True when the reminder is set, undelivered and not in the future.
    pub fn reminder_due(&self, now: OffsetDateTime) -> bool {
        match self.reminder_time {
            Some(at) if !self.reminded => at.assume_offset(now.offset()) <= now,
            _ => false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    /// `todo -> in-progress -> blocked -> todo`, and `done -> todo`.
    pub fn cycled(&self) -> Self {
        match self {
            Self::Todo => Self::InProgress,
            Self::InProgress => Self::Blocked,
            Self::Blocked => Self::Todo,
            Self::Done => Self::Todo,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = enum_key(value);
        Self::ALL
            .into_iter()
            .find(|status| enum_key(status.as_str()) == key)
            .ok_or_else(|| AppError::invalid_input(format!("unknown status '{}'", value.trim())))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Sort rank, higher is more important.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn cycled(&self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = enum_key(value);
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == key)
            .ok_or_else(|| {
                AppError::invalid_input(format!("unknown priority '{}'", value.trim()))
            })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Health,
    Finance,
    Learning,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Finance,
        Category::Learning,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Finance => "Finance",
            Self::Learning => "Learning",
            Self::Other => "Other",
        }
    }

    /// Unknown names clamp to `Other`.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = enum_key(value);
        Self::ALL
            .into_iter()
            .find(|category| enum_key(category.as_str()) == key)
            .ok_or_else(|| {
                AppError::invalid_input(format!("unknown category '{}'", value.trim()))
            })
    }
}

fn enum_key(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Trims, drops blanks, sorts and de-duplicates.
pub fn normalize_tags<I, T>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut normalized: Vec<String> = tags
        .into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Splits a comma separated tag list the way the edit form accepts it.
pub fn split_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

pub fn parse_due_date(value: &str) -> Result<Date, AppError> {
    Date::parse(value.trim(), DUE_DATE_FORMAT)
        .map_err(|_| AppError::invalid_input("due date must be YYYY-MM-DD"))
}

pub fn parse_reminder_time(value: &str) -> Result<PrimitiveDateTime, AppError> {
    PrimitiveDateTime::parse(value.trim(), REMINDER_FORMAT)
        .map_err(|_| AppError::invalid_input("reminder time must be YYYY-MM-DDTHH:mm"))
}

pub fn format_due_date(date: Date) -> String {
    date.format(DUE_DATE_FORMAT).unwrap_or_default()
}

pub fn format_reminder_time(at: PrimitiveDateTime) -> String {
    at.format(REMINDER_FORMAT).unwrap_or_default()
}
