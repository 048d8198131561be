//! Canonical period identifiers used to bucket streak progress.
//!
//! Daily keys are `YYYY-MM-DD`, weekly keys are ISO-8601 `YYYY-Www` where
//! the year is the ISO week-numbering year.

use crate::model::{StreakPeriod, format_due_date};
use time::{Date, Duration};

pub fn daily_key(date: Date) -> String {
    format_due_date(date)
}

pub fn weekly_key(date: Date) -> String {
    let (year, week, _) = date.to_iso_week_date();
    format!("{year:04}-W{week:02}")
}

pub fn previous_daily_key(date: Date) -> String {
    daily_key(date.previous_day().unwrap_or(date))
}

pub fn previous_weekly_key(date: Date) -> String {
    weekly_key(date.checked_sub(Duration::weeks(1)).unwrap_or(date))
}

pub fn period_key(period: StreakPeriod, date: Date) -> String {
    match period {
        StreakPeriod::Daily => daily_key(date),
        StreakPeriod::Weekly => weekly_key(date),
    }
}

pub fn previous_period_key(period: StreakPeriod, date: Date) -> String {
    match period {
        StreakPeriod::Daily => previous_daily_key(date),
        StreakPeriod::Weekly => previous_weekly_key(date),
    }
}
