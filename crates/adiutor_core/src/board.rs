//! The assistant's task board: one owner for the task store, the streak
//! engine and the pending reminders, persisting after every mutation.

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::{StreakSettings, StreakState, Task, format_due_date};
use crate::reminder::{self, PendingNotifications};
use crate::storage::{Storage, json_store};
use crate::streak::{StreakEngine, StreakOutcome};
use crate::task_store::{NewTask, TaskEvent, TaskPatch, TaskStats, TaskStore};
use crate::tool_call::{ToolCall, ToolInstruction};
use crate::view::TaskView;
use tracing::info;

/// Read-only state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub tasks: Vec<Task>,
    pub streak: StreakState,
    pub settings: StreakSettings,
    pub goal_met: bool,
    pub pending: Vec<Task>,
}

pub struct Board<S: Storage> {
    store: TaskStore,
    streak: StreakEngine,
    pending: PendingNotifications,
    clock: Box<dyn Clock>,
    storage: S,
}

impl<S: Storage> Board<S> {
    pub fn load(storage: S, clock: Box<dyn Clock>) -> Result<Self, AppError> {
        let mut board = Self {
            store: TaskStore::new(),
            streak: StreakEngine::new(StreakSettings::default(), StreakState::fresh(String::new())),
            pending: PendingNotifications::new(),
            clock,
            storage,
        };
        board.reload()?;
        Ok(board)
    }

    /// Re-reads tasks, streak settings and streak state from storage,
    /// discarding the in-memory copies. Pending reminders are kept.
    pub fn reload(&mut self) -> Result<(), AppError> {
        let now = self.clock.now();
        let tasks = json_store::load_tasks(&self.storage)?;
        let settings = json_store::load_settings(&self.storage)?;
        let loaded = json_store::load_streak(&self.storage, now.date())?;

        self.store = TaskStore::from_tasks(tasks);
        self.streak = StreakEngine::new(settings, loaded.state);
        if loaded.migrated {
            info!("migrated legacy streak record");
            self.save_streak()?;
            self.storage.remove(json_store::LEGACY_STREAK_KEY)?;
        }
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn save_tasks(&mut self) -> Result<(), AppError> {
        json_store::save_tasks(&mut self.storage, self.store.tasks())
    }

    fn save_streak(&mut self) -> Result<(), AppError> {
        json_store::save_streak(&mut self.storage, self.streak.state())
    }

    fn saved<T>(&mut self, value: Option<T>) -> Result<Option<T>, AppError> {
        if value.is_some() {
            self.save_tasks()?;
        }
        Ok(value)
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.store.get(id)
    }

    /// Resolves an exact id or a unique id prefix.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Option<String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return None;
        }
        if let Some(task) = self.store.get(needle) {
            return Some(task.id().to_string());
        }
        let mut matches = self
            .store
            .tasks()
            .iter()
            .filter(|task| task.id().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task.id().to_string()),
            _ => None,
        }
    }

    pub fn unique_tags(&self) -> Vec<String> {
        self.store.unique_tags()
    }

    pub fn stats(&self) -> TaskStats {
        self.store.stats()
    }

    pub fn view(&self, view: &TaskView) -> Vec<Task> {
        view.apply(self.store.tasks())
    }

    pub fn add_task(&mut self, new_task: NewTask) -> Result<Option<Task>, AppError> {
        let now = self.clock.now();
        let added = self.store.add_task(new_task, now).cloned();
        self.saved(added)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Option<Task>, AppError> {
        let updated = self
            .store
            .update_task(id, patch)
            .and_then(|_| self.store.get(id).cloned());
        self.saved(updated)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let removed = self.store.get(id).cloned();
        let event = self.store.delete_task(id);
        self.saved(event.and(removed))
    }

    /// Flips done/todo and feeds the streak engine.
    pub fn toggle_completion(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let event = match self.store.toggle_completion(id) {
            Some(event) => event,
            None => return Ok(None),
        };
        self.apply_event(&event);
        self.save_tasks()?;
        self.save_streak()?;
        Ok(self.store.get(id).cloned())
    }

    fn apply_event(&mut self, event: &TaskEvent) -> Option<StreakOutcome> {
        let now = self.clock.now();
        match event {
            TaskEvent::CompletionChanged {
                completed: true, ..
            } => Some(self.streak.record_completion(now)),
            TaskEvent::CompletionChanged {
                completed: false, ..
            } => {
                self.streak.record_undo(now);
                None
            }
            _ => None,
        }
    }

    pub fn cycle_status(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let updated = self
            .store
            .cycle_status(id)
            .and_then(|_| self.store.get(id).cloned());
        self.saved(updated)
    }

    pub fn cycle_priority(&mut self, id: &str) -> Result<Option<Task>, AppError> {
        let updated = self
            .store
            .cycle_priority(id)
            .and_then(|_| self.store.get(id).cloned());
        self.saved(updated)
    }

    pub fn clear_completed(&mut self) -> Result<usize, AppError> {
        let removed = match self.store.clear_completed() {
            TaskEvent::Cleared { removed } => removed,
            _ => 0,
        };
        if removed > 0 {
            self.save_tasks()?;
        }
        Ok(removed)
    }

    /// Applies a tool call and returns the reply the assistant shows, or
    /// `None` when the instruction was dropped as invalid.
    pub fn apply_tool_call(&mut self, call: &ToolCall) -> Result<Option<String>, AppError> {
        match call.instruction()? {
            ToolInstruction::AddTask(new_task) => {
                let added = self.add_task(new_task)?;
                Ok(added.map(|task| confirmation(&task)))
            }
        }
    }

    /// One reminder pass. Returns the reminders that became pending.
    pub fn scan_reminders(&mut self) -> Result<Vec<Task>, AppError> {
        let now = self.clock.now();
        let fired = reminder::scan(&mut self.store, now);
        if fired.is_empty() {
            return Ok(Vec::new());
        }
        self.save_tasks()?;
        Ok(self.pending.push_unique(fired))
    }

    pub fn pending_notifications(&self) -> &[Task] {
        self.pending.items()
    }

    pub fn dismiss_notification(&mut self, id: &str) -> bool {
        self.pending.dismiss(id)
    }

    pub fn dismiss_all_notifications(&mut self) -> usize {
        self.pending.dismiss_all()
    }

    pub fn streak_settings(&self) -> StreakSettings {
        self.streak.settings()
    }

    pub fn streak_state(&self) -> &StreakState {
        self.streak.state()
    }

    pub fn is_goal_met_this_period(&self) -> bool {
        self.streak.is_goal_met_this_period(self.clock.now())
    }

    /// Rolls the streak period forward if the clock has moved on.
    pub fn observe_streak(&mut self) -> Result<&StreakState, AppError> {
        let now = self.clock.now();
        if self.streak.observe(now) {
            self.save_streak()?;
        }
        Ok(self.streak.state())
    }

    pub fn set_streak_settings(&mut self, settings: StreakSettings) -> Result<(), AppError> {
        self.streak.set_settings(settings);
        json_store::save_settings(&mut self.storage, &self.streak.settings())?;
        let now = self.clock.now();
        self.streak.observe(now);
        self.save_streak()
    }

    pub fn reset_streak(&mut self) -> Result<(), AppError> {
        let now = self.clock.now();
        self.streak.reset(now);
        self.save_streak()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            tasks: self.store.tasks().to_vec(),
            streak: self.streak.state().clone(),
            settings: self.streak.settings(),
            goal_met: self.is_goal_met_this_period(),
            pending: self.pending.items().to_vec(),
        }
    }
}

fn confirmation(task: &Task) -> String {
    let mut reply = format!("I've added \"{}\" to your list", task.title());
    if let Some(due) = task.due_date() {
        reply.push_str(&format!(" (Due: {})", format_due_date(due)));
    }
    if task.reminder_time().is_some() {
        reply.push_str(" with a reminder");
    }
    reply.push('.');
    reply
}
