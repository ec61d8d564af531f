// Data models for the task tracker

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum task name length in characters
pub const NAME_LIMIT: usize = 50;

/// Maximum task description length in characters
pub const DESC_LIMIT: usize = 250;

/// A user-created unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: String,
    // Lists saved before edits existed carry no updatedAt
    #[serde(default)]
    pub updated_at: String,
}

impl Task {
    /// Fill in fields older stored data may lack
    pub(crate) fn normalize(&mut self) {
        if self.updated_at.is_empty() {
            self.updated_at = self.created_at.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority '{0}' (expected low, medium or high)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub desc: String,
    pub priority: Option<Priority>,
}

impl NewTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Partial edit of a task; absent or blank fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}
