// Derived filter/search view over the task list

use crate::models::Task;
use std::fmt;
use std::str::FromStr;

/// Completion-status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Pending => !task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "All"),
            StatusFilter::Completed => write!(f, "Completed"),
            StatusFilter::Pending => write!(f, "Pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid filter '{0}' (expected all, completed or pending)")]
pub struct ParseStatusFilterError(pub String);

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "pending" => Ok(StatusFilter::Pending),
            _ => Err(ParseStatusFilterError(s.to_string())),
        }
    }
}

/// Status filter ANDed with a free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: StatusFilter,
    pub search: String,
}

impl TaskQuery {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            status,
            search: search.into(),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task) && self.matches_text(task)
    }

    /// Case-insensitive substring of name or description; blank matches everything
    fn matches_text(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        task.name.to_lowercase().contains(&needle) || task.desc.to_lowercase().contains(&needle)
    }

    /// Matching tasks, keeping list order
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }
}
