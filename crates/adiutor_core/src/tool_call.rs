//! Structured instructions issued by the chat collaborator.
//!
//! Arguments are accepted leniently: unknown enum values fall back to their
//! defaults, while malformed dates and values of the wrong JSON type are
//! dropped, so a slightly-off tool call still produces a task instead of an
//! error.

use crate::error::AppError;
use crate::model::{Category, normalize_tags, parse_due_date, parse_reminder_time};
use crate::task_store::NewTask;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInstruction {
    AddTask(NewTask),
}

/// Raw `addTask` arguments. Every field is kept as loose JSON so that a value
/// of the wrong type drops that one field instead of the whole call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskArgs {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default)]
    pub reminder_time: Option<Value>,
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    /// A list of strings or one comma separated string.
    #[serde(default)]
    pub tags: Option<Value>,
}

impl AddTaskArgs {
    pub fn into_new_task(self) -> NewTask {
        let due_date = text("dueDate", self.due_date);
        let reminder_time = text("reminderTime", self.reminder_time);
        NewTask {
            title: text("title", self.title).unwrap_or_default(),
            due_date: due_date.as_deref().and_then(|value| {
                parse_due_date(value)
                    .map_err(|err| warn!(value, error = %err, "dropping malformed dueDate"))
                    .ok()
            }),
            reminder_time: reminder_time.as_deref().and_then(|value| {
                parse_reminder_time(value)
                    .map_err(|err| warn!(value, error = %err, "dropping malformed reminderTime"))
                    .ok()
            }),
            priority: lenient(text("priority", self.priority).as_deref()),
            status: lenient(text("status", self.status).as_deref()),
            tags: tags(self.tags),
            category: text("category", self.category)
                .as_deref()
                .map(Category::parse_lenient)
                .unwrap_or_default(),
        }
    }
}

/// String fields only. `null` counts as absent; any other type is dropped.
fn text(arg: &str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(raw) => Some(raw),
        Value::Null => None,
        other => {
            warn!(arg, value = %other, "dropping non-string argument");
            None
        }
    }
}

fn tags(value: Option<Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(raw)) => normalize_tags(raw.split(',')),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(tag) => Some(tag),
                other => {
                    warn!(value = %other, "dropping non-string tag");
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!(value = %other, "dropping tags that are neither a list nor a string");
            Vec::new()
        }
    }
}

fn lenient<T>(value: Option<&str>) -> T
where
    T: std::str::FromStr + Default,
{
    value
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

/// `addTask`, `add_task` and `add task` all name the same instruction.
pub fn is_add_task(name: &str) -> bool {
    let key: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    key == "addtask"
}

impl ToolCall {
    pub fn instruction(&self) -> Result<ToolInstruction, AppError> {
        if !is_add_task(&self.name) {
            return Err(AppError::invalid_input(format!(
                "unsupported tool call '{}'",
                self.name
            )));
        }

        let args = match &self.args {
            Value::Null => AddTaskArgs::default(),
            value @ Value::Object(_) => AddTaskArgs::deserialize(value)
                .map_err(|err| AppError::invalid_data(format!("addTask args: {err}")))?,
            _ => return Err(AppError::invalid_data("addTask args must be an object")),
        };
        Ok(ToolInstruction::AddTask(args.into_new_task()))
    }
}
