use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakPeriod {
    #[default]
    Daily,
    Weekly,
}

impl StreakPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl fmt::Display for StreakPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreakPeriod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            other => Err(AppError::invalid_input(format!(
                "unknown streak period '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSettings {
    pub target: u32,
    pub period: StreakPeriod,
}

impl StreakSettings {
    /// A zero target is meaningless; it clamps to one.
    pub fn normalized(self) -> Self {
        Self {
            target: self.target.max(1),
            period: self.period,
        }
    }
}

impl Default for StreakSettings {
    fn default() -> Self {
        Self {
            target: 1,
            period: StreakPeriod::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub count: u32,
    #[serde(default)]
    pub last_satisfied_period: Option<String>,
    #[serde(default)]
    pub current_period_progress: u32,
    pub current_period_key: String,
}

impl StreakState {
    pub fn fresh(current_period_key: String) -> Self {
        Self {
            count: 0,
            last_satisfied_period: None,
            current_period_progress: 0,
            current_period_key,
        }
    }
}

/// The single-field record written before per-period progress existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStreak {
    pub count: u32,
    #[serde(default)]
    pub last_date: Option<String>,
}

impl LegacyStreak {
    pub fn migrate(self, current_period_key: String) -> StreakState {
        StreakState {
            count: self.count,
            last_satisfied_period: self.last_date,
            current_period_progress: 0,
            current_period_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LegacyStreak, StreakPeriod, StreakSettings, StreakState};

    #[test]
    fn settings_default_to_one_daily_task() {
        let settings = StreakSettings::default();
        assert_eq!(settings.target, 1);
        assert_eq!(settings.period, StreakPeriod::Daily);
    }

    #[test]
    fn zero_target_is_clamped() {
        let settings = StreakSettings {
            target: 0,
            period: StreakPeriod::Weekly,
        }
        .normalized();
        assert_eq!(settings.target, 1);
        assert_eq!(settings.period, StreakPeriod::Weekly);
    }

    #[test]
    fn legacy_record_maps_last_date() {
        let legacy: LegacyStreak =
            serde_json::from_str(r#"{"count":4,"lastDate":"2025-02-03"}"#).unwrap();
        let state = legacy.migrate("2025-02-04".to_string());

        assert_eq!(
            state,
            StreakState {
                count: 4,
                last_satisfied_period: Some("2025-02-03".to_string()),
                current_period_progress: 0,
                current_period_key: "2025-02-04".to_string(),
            }
        );
    }

    #[test]
    fn state_uses_camel_case_keys() {
        let value = serde_json::to_value(StreakState::fresh("2025-W06".to_string())).unwrap();
        assert_eq!(value["currentPeriodKey"], "2025-W06");
        assert_eq!(value["currentPeriodProgress"], 0);
        assert!(value["lastSatisfiedPeriod"].is_null());
    }
}
