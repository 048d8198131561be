use crate::model::{Category, Priority, Task, TaskStatus, normalize_tags};
use serde::Serialize;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

/// Input for `TaskStore::add_task`. Unset fields take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<Date>,
    pub reminder_time: Option<PrimitiveDateTime>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub tags: Vec<String>,
    pub category: Category,
}

impl NewTask {
    pub fn titled<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial edit. `None` leaves a field alone; the nested options on
/// `due_date` and `reminder_time` distinguish "clear" from "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_date: Option<Option<Date>>,
    pub reminder_time: Option<Option<PrimitiveDateTime>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub tags: Option<Vec<String>>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Updated { id: String },
    Deleted { id: String },
    CompletionChanged { id: String, completed: bool },
    Cleared { removed: usize },
}

/// Completed versus pending counts. Anything not `done` is pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Blank titles are dropped without touching the store.
    pub fn add_task(&mut self, new_task: NewTask, now: OffsetDateTime) -> Option<&Task> {
        let title = new_task.title.trim();
        if title.is_empty() {
            debug!("add_task ignored: blank title");
            return None;
        }

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            status: new_task.status,
            priority: new_task.priority,
            category: new_task.category,
            tags: normalize_tags(new_task.tags),
            created_at: now,
            due_date: new_task.due_date,
            reminder_time: new_task.reminder_time,
            reminded: false,
        };
        debug!(id = %task.id, "task added");
        self.tasks.push(task);
        self.tasks.last()
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Option<TaskEvent> {
        let title = match patch.title.as_deref().map(str::trim) {
            Some("") => {
                debug!(id, "update_task ignored: blank title");
                return None;
            }
            other => other.map(str::to_string),
        };

        let task = self.find_mut(id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder_time) = patch.reminder_time {
            if task.reminder_time != reminder_time {
                task.reminder_time = reminder_time;
                task.reminded = false;
            }
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(tags) = patch.tags {
            task.tags = normalize_tags(tags);
        }
        if let Some(category) = patch.category {
            task.category = category;
        }

        debug!(id, "task updated");
        Some(TaskEvent::Updated { id: id.to_string() })
    }

    pub fn delete_task(&mut self, id: &str) -> Option<TaskEvent> {
        let index = self.tasks.iter().position(|task| task.id == id)?;
        self.tasks.remove(index);
        debug!(id, "task deleted");
        Some(TaskEvent::Deleted { id: id.to_string() })
    }

    /// Flips between `done` and `todo`. Any earlier non-done status is lost.
    pub fn toggle_completion(&mut self, id: &str) -> Option<TaskEvent> {
        let task = self.find_mut(id)?;
        task.status = if task.completed() {
            TaskStatus::Todo
        } else {
            TaskStatus::Done
        };
        let completed = task.completed();
        debug!(id, completed, "completion toggled");
        Some(TaskEvent::CompletionChanged {
            id: id.to_string(),
            completed,
        })
    }

    pub fn cycle_status(&mut self, id: &str) -> Option<TaskEvent> {
        let task = self.find_mut(id)?;
        task.status = task.status.cycled();
        Some(TaskEvent::Updated { id: id.to_string() })
    }

    pub fn cycle_priority(&mut self, id: &str) -> Option<TaskEvent> {
        let task = self.find_mut(id)?;
        task.priority = task.priority.cycled();
        Some(TaskEvent::Updated { id: id.to_string() })
    }

    pub fn clear_completed(&mut self) -> TaskEvent {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed());
        let removed = before - self.tasks.len();
        debug!(removed, "completed tasks cleared");
        TaskEvent::Cleared { removed }
    }

    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.iter().filter(|task| task.completed()).count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }

    /// Distinct tags across all tasks, sorted.
    pub fn unique_tags(&self) -> Vec<String> {
        normalize_tags(self.tasks.iter().flat_map(|task| task.tags.iter()))
    }
}
