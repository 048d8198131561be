use crate::error::AppError;
use crate::model::{LegacyStreak, StreakSettings, StreakState, Task};
use crate::period::daily_key;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::Date;
use tracing::warn;

pub const SCHEMA_VERSION: u32 = 1;
pub const TASKS_KEY: &str = "tasks";
pub const STREAK_KEY: &str = "streak_v2";
pub const LEGACY_STREAK_KEY: &str = "streak";
pub const SETTINGS_KEY: &str = "streak_settings";

#[derive(Debug, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
struct StoredTasksRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedStreak {
    pub state: StreakState,
    /// Set when the state came from the legacy single-field record.
    pub migrated: bool,
}

pub fn load_tasks<S: Storage + ?Sized>(storage: &S) -> Result<Vec<Task>, AppError> {
    let content = match storage.read(TASKS_KEY)? {
        Some(content) => content,
        None => return Ok(Vec::new()),
    };
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut ids = HashSet::new();
    for task in &stored.tasks {
        if !ids.insert(task.id()) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id '{}'",
                task.id()
            )));
        }
        if task.title().trim().is_empty() {
            return Err(AppError::invalid_data(format!(
                "task '{}' has a blank title",
                task.id()
            )));
        }
    }

    Ok(stored.tasks)
}

pub fn save_tasks<S: Storage + ?Sized>(storage: &mut S, tasks: &[Task]) -> Result<(), AppError> {
    let stored = StoredTasksRef {
        schema_version: SCHEMA_VERSION,
        tasks,
    };
    let content = serde_json::to_string_pretty(&stored)?;
    storage.write(TASKS_KEY, &content)
}

/// Missing or unreadable settings fall back to the defaults.
pub fn load_settings<S: Storage + ?Sized>(storage: &S) -> Result<StreakSettings, AppError> {
    let content = match storage.read(SETTINGS_KEY)? {
        Some(content) => content,
        None => return Ok(StreakSettings::default()),
    };
    match serde_json::from_str::<StreakSettings>(&content) {
        Ok(settings) => Ok(settings.normalized()),
        Err(err) => {
            warn!(error = %err, "streak settings unreadable, using defaults");
            Ok(StreakSettings::default())
        }
    }
}

pub fn save_settings<S: Storage + ?Sized>(
    storage: &mut S,
    settings: &StreakSettings,
) -> Result<(), AppError> {
    let content = serde_json::to_string(settings)?;
    storage.write(SETTINGS_KEY, &content)
}

/// Reads the current streak record, migrating the legacy `{count, lastDate}`
/// record when no current one exists. Unreadable records start fresh.
pub fn load_streak<S: Storage + ?Sized>(
    storage: &S,
    today: Date,
) -> Result<LoadedStreak, AppError> {
    let fresh = || LoadedStreak {
        state: StreakState::fresh(daily_key(today)),
        migrated: false,
    };

    if let Some(content) = storage.read(STREAK_KEY)? {
        return Ok(match serde_json::from_str::<StreakState>(&content) {
            Ok(state) => LoadedStreak {
                state,
                migrated: false,
            },
            Err(err) => {
                warn!(error = %err, "streak record unreadable, starting fresh");
                fresh()
            }
        });
    }

    if let Some(content) = storage.read(LEGACY_STREAK_KEY)? {
        return Ok(match serde_json::from_str::<LegacyStreak>(&content) {
            Ok(legacy) => LoadedStreak {
                state: legacy.migrate(daily_key(today)),
                migrated: true,
            },
            Err(err) => {
                warn!(error = %err, "legacy streak record unreadable, starting fresh");
                fresh()
            }
        });
    }

    Ok(fresh())
}

pub fn save_streak<S: Storage + ?Sized>(
    storage: &mut S,
    state: &StreakState,
) -> Result<(), AppError> {
    let content = serde_json::to_string(state)?;
    storage.write(STREAK_KEY, &content)
}
