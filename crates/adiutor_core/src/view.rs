use crate::error::AppError;
use crate::model::{Category, Task};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value.parse().map(Self::Only)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TagFilter {
    #[default]
    All,
    Tag(String),
}

impl TagFilter {
    pub fn tag<T: Into<String>>(tag: T) -> Self {
        Self::Tag(tag.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    /// Newest first.
    #[default]
    Created,
    /// Earliest due date first, undated last.
    Due,
    /// High, then medium, then low.
    Priority,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Due => "due",
            Self::Priority => "priority",
        }
    }

    /// Next mode in the order the sort toggle walks through them.
    pub fn cycled(&self) -> Self {
        match self {
            Self::Created => Self::Due,
            Self::Due => Self::Priority,
            Self::Priority => Self::Created,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" | "recent" => Ok(Self::Created),
            "due" | "due-date" | "due_date" => Ok(Self::Due),
            "priority" => Ok(Self::Priority),
            other => Err(AppError::invalid_input(format!("unknown sort mode '{other}'"))),
        }
    }
}

/// UI selection that projects the task list for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskView {
    pub category: CategoryFilter,
    pub tag: TagFilter,
    pub sort: SortMode,
}

impl TaskView {
    pub fn matches(&self, task: &Task) -> bool {
        let category_ok = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => task.category() == category,
        };
        let tag_ok = match &self.tag {
            TagFilter::All => true,
            TagFilter::Tag(tag) => task.has_tag(tag),
        };
        category_ok && tag_ok
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let mut visible: Vec<Task> = tasks
            .iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect();
        // `sort_by` is stable, so ties keep store order.
        match self.sort {
            SortMode::Created => visible.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            SortMode::Due => visible.sort_by(compare_due),
            SortMode::Priority => {
                visible.sort_by(|a, b| b.priority().rank().cmp(&a.priority().rank()))
            }
        }
        visible
    }
}

fn compare_due(a: &Task, b: &Task) -> Ordering {
    match (a.due_date(), b.due_date()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
