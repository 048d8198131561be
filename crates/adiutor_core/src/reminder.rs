use crate::error::AppError;
use crate::model::Task;
use crate::task_store::TaskStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(5);
const STOP_POLL: Duration = Duration::from_millis(100);

/// Marks every due, undelivered reminder as delivered and returns snapshots
/// of the fired tasks.
pub fn scan(store: &mut TaskStore, now: OffsetDateTime) -> Vec<Task> {
    let mut fired = Vec::new();
    for task in store.tasks_mut() {
        if task.reminder_due(now) {
            task.reminded = true;
            info!(id = %task.id, title = %task.title, "reminder fired");
            fired.push(task.clone());
        }
    }
    fired
}

/// Reminders waiting for the user to acknowledge them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingNotifications {
    items: Vec<Task>,
}

impl PendingNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Task] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends fired reminders whose task is not already pending. Returns the
    /// ones actually added.
    pub fn push_unique(&mut self, fired: Vec<Task>) -> Vec<Task> {
        let mut pending: HashSet<String> =
            self.items.iter().map(|task| task.id.clone()).collect();
        let added: Vec<Task> = fired
            .into_iter()
            .filter(|task| pending.insert(task.id.clone()))
            .collect();
        self.items.extend(added.iter().cloned());
        added
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|task| task.id != id);
        before != self.items.len()
    }

    pub fn dismiss_all(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }
}

/// Runs a tick at a fixed interval until the stop flag is raised.
#[derive(Debug, Clone)]
pub struct ScanLoop {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl ScanLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag; storing `true` ends `run` after the current tick.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Tick errors are logged and the loop keeps going. Returns the number of
    /// ticks run.
    pub fn run<F>(&self, mut tick: F) -> usize
    where
        F: FnMut() -> Result<(), AppError>,
    {
        let mut ticks = 0;
        while !self.stopped() {
            if let Err(err) = tick() {
                warn!(error = %err, "reminder scan failed");
            }
            ticks += 1;
            self.wait();
        }
        ticks
    }

    fn wait(&self) {
        let mut remaining = self.interval;
        while !remaining.is_zero() && !self.stopped() {
            let step = remaining.min(STOP_POLL);
            std::thread::sleep(step);
            remaining -= step;
        }
    }
}

impl Default for ScanLoop {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_INTERVAL)
    }
}
