use crate::model::{StreakSettings, StreakState};
use crate::period::{period_key, previous_period_key};
use time::OffsetDateTime;
use tracing::{debug, info};

/// What a completion did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Progress moved but the goal was not newly met.
    Progress,
    /// The goal was met for the first time this period and extended the run.
    Extended,
    /// The goal was met for the first time this period after a gap.
    Restarted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakEngine {
    settings: StreakSettings,
    state: StreakState,
}

impl StreakEngine {
    pub fn new(settings: StreakSettings, state: StreakState) -> Self {
        Self {
            settings: settings.normalized(),
            state,
        }
    }

    pub fn settings(&self) -> StreakSettings {
        self.settings
    }

    pub fn state(&self) -> &StreakState {
        &self.state
    }

    /// Changing the period takes effect at the next observation, since the
    /// stored key no longer matches the new granularity.
    pub fn set_settings(&mut self, settings: StreakSettings) {
        self.settings = settings.normalized();
    }

    pub fn reset(&mut self, now: OffsetDateTime) {
        self.state = StreakState::fresh(self.key_for(now));
        info!("streak reset");
    }

    fn key_for(&self, now: OffsetDateTime) -> String {
        period_key(self.settings.period, now.date())
    }

    /// Rolls progress over when `now` falls in a different period than the
    /// stored one. Returns whether a rollover happened.
    pub fn observe(&mut self, now: OffsetDateTime) -> bool {
        let key = self.key_for(now);
        if self.state.current_period_key == key {
            return false;
        }
        debug!(from = %self.state.current_period_key, to = %key, "streak period rolled over");
        self.state.current_period_key = key;
        self.state.current_period_progress = 0;
        true
    }

    pub fn record_completion(&mut self, now: OffsetDateTime) -> StreakOutcome {
        self.observe(now);
        self.state.current_period_progress += 1;

        let key = self.state.current_period_key.clone();
        if self.state.current_period_progress < self.settings.target
            || self.state.last_satisfied_period.as_deref() == Some(key.as_str())
        {
            return StreakOutcome::Progress;
        }

        let previous = previous_period_key(self.settings.period, now.date());
        let outcome = match self.state.last_satisfied_period.as_deref() {
            None => StreakOutcome::Extended,
            Some(last) if last == previous => StreakOutcome::Extended,
            Some(_) => StreakOutcome::Restarted,
        };
        self.state.count = match outcome {
            StreakOutcome::Restarted => 1,
            _ => self.state.count + 1,
        };
        self.state.last_satisfied_period = Some(key);
        info!(count = self.state.count, ?outcome, "streak goal met");
        outcome
    }

    /// Undo only walks progress back; a period already counted stays counted.
    pub fn record_undo(&mut self, now: OffsetDateTime) {
        self.observe(now);
        self.state.current_period_progress = self.state.current_period_progress.saturating_sub(1);
    }

    /// Progress as seen at `now`, treating a stale period as empty.
    pub fn progress_at(&self, now: OffsetDateTime) -> u32 {
        if self.state.current_period_key == self.key_for(now) {
            self.state.current_period_progress
        } else {
            0
        }
    }

    pub fn is_goal_met_this_period(&self, now: OffsetDateTime) -> bool {
        self.progress_at(now) >= self.settings.target
    }
}

#[cfg(test)]
mod tests {
    use super::{StreakEngine, StreakOutcome};
    use crate::model::{StreakPeriod, StreakSettings, StreakState};
    use time::macros::datetime;

    fn engine(target: u32, period: StreakPeriod, key: &str) -> StreakEngine {
        StreakEngine::new(
            StreakSettings { target, period },
            StreakState::fresh(key.to_string()),
        )
    }

    #[test]
    fn daily_target_of_two_scenario() {
        let mut streak = engine(2, StreakPeriod::Daily, "2025-03-10");
        let today = datetime!(2025-03-10 09:00 UTC);

        assert_eq!(streak.record_completion(today), StreakOutcome::Progress);
        assert_eq!(streak.state().current_period_progress, 1);
        assert_eq!(streak.state().count, 0);

        assert_eq!(streak.record_completion(today), StreakOutcome::Extended);
        assert_eq!(streak.state().current_period_progress, 2);
        assert_eq!(streak.state().count, 1);
        assert_eq!(
            streak.state().last_satisfied_period.as_deref(),
            Some("2025-03-10")
        );

        let tomorrow = datetime!(2025-03-11 08:00 UTC);
        assert_eq!(streak.record_completion(tomorrow), StreakOutcome::Progress);
        assert_eq!(streak.state().current_period_key, "2025-03-11");
        assert_eq!(streak.state().current_period_progress, 1);
        assert_eq!(streak.state().count, 1);
    }

    #[test]
    fn goal_counts_once_per_period() {
        let mut streak = engine(1, StreakPeriod::Daily, "2025-03-10");
        let today = datetime!(2025-03-10 09:00 UTC);

        streak.record_completion(today);
        streak.record_completion(today);
        streak.record_completion(today);

        assert_eq!(streak.state().count, 1);
        assert_eq!(streak.state().current_period_progress, 3);
    }

    #[test]
    fn undo_keeps_locked_in_period() {
        let mut streak = engine(1, StreakPeriod::Daily, "2025-03-10");
        let today = datetime!(2025-03-10 09:00 UTC);

        streak.record_completion(today);
        streak.record_undo(today);
        streak.record_undo(today);

        assert_eq!(streak.state().count, 1);
        assert_eq!(
            streak.state().last_satisfied_period.as_deref(),
            Some("2025-03-10")
        );
        assert_eq!(streak.state().current_period_progress, 0);
        assert!(!streak.is_goal_met_this_period(today));
    }

    #[test]
    fn consecutive_days_extend_and_gaps_restart() {
        let mut streak = engine(1, StreakPeriod::Daily, "2025-03-10");

        streak.record_completion(datetime!(2025-03-10 09:00 UTC));
        assert_eq!(
            streak.record_completion(datetime!(2025-03-11 09:00 UTC)),
            StreakOutcome::Extended
        );
        assert_eq!(streak.state().count, 2);

        assert_eq!(
            streak.record_completion(datetime!(2025-03-13 09:00 UTC)),
            StreakOutcome::Restarted
        );
        assert_eq!(streak.state().count, 1);
        assert_eq!(
            streak.state().last_satisfied_period.as_deref(),
            Some("2025-03-13")
        );
    }

    #[test]
    fn weekly_streak_continues_across_year_boundary() {
        let mut streak = engine(1, StreakPeriod::Weekly, "2024-W52");

        streak.record_completion(datetime!(2024-12-27 10:00 UTC));
        assert_eq!(
            streak.state().last_satisfied_period.as_deref(),
            Some("2024-W52")
        );

        assert_eq!(
            streak.record_completion(datetime!(2025-01-01 10:00 UTC)),
            StreakOutcome::Extended
        );
        assert_eq!(streak.state().current_period_key, "2025-W01");
        assert_eq!(streak.state().count, 2);
    }

    #[test]
    fn weekly_streak_restarts_after_skipped_week() {
        let mut streak = engine(1, StreakPeriod::Weekly, "2025-W02");

        streak.record_completion(datetime!(2025-01-08 10:00 UTC));
        assert_eq!(
            streak.record_completion(datetime!(2025-01-22 10:00 UTC)),
            StreakOutcome::Restarted
        );
        assert_eq!(streak.state().count, 1);
    }

    #[test]
    fn switching_period_rolls_progress() {
        let mut streak = engine(3, StreakPeriod::Daily, "2025-03-10");
        let now = datetime!(2025-03-10 09:00 UTC);
        streak.record_completion(now);
        assert_eq!(streak.progress_at(now), 1);

        streak.set_settings(StreakSettings {
            target: 3,
            period: StreakPeriod::Weekly,
        });
        assert_eq!(streak.progress_at(now), 0);
        assert!(streak.observe(now));
        assert_eq!(streak.state().current_period_key, "2025-W11");
        assert!(!streak.observe(now));
    }

    #[test]
    fn stale_period_reads_as_empty() {
        let mut streak = engine(1, StreakPeriod::Daily, "2025-03-10");
        streak.record_completion(datetime!(2025-03-10 09:00 UTC));

        assert!(streak.is_goal_met_this_period(datetime!(2025-03-10 23:00 UTC)));
        assert!(!streak.is_goal_met_this_period(datetime!(2025-03-11 00:30 UTC)));
    }

    #[test]
    fn reset_starts_over_in_current_period() {
        let mut streak = engine(1, StreakPeriod::Daily, "2025-03-10");
        streak.record_completion(datetime!(2025-03-10 09:00 UTC));
        streak.reset(datetime!(2025-03-12 09:00 UTC));

        assert_eq!(streak.state(), &StreakState::fresh("2025-03-12".to_string()));
    }
}
