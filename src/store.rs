// Task store: authoritative in-memory task list with write-through persistence

use crate::clock::{Clock, format_timestamp};
use crate::filter::TaskQuery;
use crate::gateway::PersistenceGateway;
use crate::id::IdGenerator;
use crate::models::{DESC_LIMIT, NAME_LIMIT, NewTask, Task, TaskUpdate};
use std::rc::Rc;
use tracing::{debug, info};

/// Input rejected at the store boundary; nothing was changed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Task name is required")]
    EmptyName,

    #[error("Task name cannot exceed {max} characters (got {len})")]
    NameTooLong { len: usize, max: usize },

    #[error("Description cannot exceed {max} characters (got {len})")]
    DescriptionTooLong { len: usize, max: usize },
}

/// What a mutation did, passed to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Added(i64),
    Toggled(i64),
    Updated(i64),
    Deleted(i64),
    Cleared,
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type TaskListener = Box<dyn FnMut(&TaskEvent, &[Task])>;

/// Newest-first task list; every mutation is saved before listeners run
pub struct TaskStore {
    tasks: Vec<Task>,
    gateway: PersistenceGateway,
    clock: Rc<dyn Clock>,
    ids: IdGenerator,
    listeners: Vec<(SubscriptionId, TaskListener)>,
    next_subscription: u64,
}

impl TaskStore {
    /// Load the persisted list (empty if absent or unreadable)
    pub fn load(gateway: PersistenceGateway, clock: Rc<dyn Clock>) -> Self {
        let tasks = gateway.load_tasks();
        let ids = IdGenerator::seeded(tasks.iter().map(|t| t.id));
        info!(count = tasks.len(), "Task store loaded");

        Self {
            tasks,
            gateway,
            clock,
            ids,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get_task_by_id(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Filtered and searched view, in list order
    pub fn visible_tasks(&self, query: &TaskQuery) -> Vec<&Task> {
        query.apply(&self.tasks)
    }

    pub fn add_task(&mut self, data: NewTask) -> Result<&Task, ValidationError> {
        let name = validate_name(&data.name)?;
        let desc = validate_desc(&data.desc)?;

        let now = self.clock.now();
        let timestamp = format_timestamp(now);
        let task = Task {
            id: self.ids.next_id(now.timestamp_millis(), |id| self.tasks.iter().any(|t| t.id == id)),
            name,
            desc,
            priority: data.priority.unwrap_or_default(),
            completed: false,
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let id = task.id;
        debug!(id, name = %task.name, priority = %task.priority, "add_task");
        self.tasks.insert(0, task);
        self.commit(TaskEvent::Added(id));

        Ok(&self.tasks[0])
    }

    pub fn toggle_task_completion(&mut self, id: i64) -> Option<&Task> {
        let index = self.position(id)?;
        let now = format_timestamp(self.clock.now());

        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        task.updated_at = now;
        debug!(id, completed = task.completed, "toggle_task_completion");

        self.commit(TaskEvent::Toggled(id));
        Some(&self.tasks[index])
    }

    pub fn delete_task(&mut self, id: i64) -> Option<Task> {
        let index = self.position(id)?;
        let removed = self.tasks.remove(index);
        debug!(id, "delete_task");

        self.commit(TaskEvent::Deleted(id));
        Some(removed)
    }

    /// Apply the non-blank fields of `data`; `Ok(None)` when `id` is unknown
    pub fn update_task(&mut self, id: i64, data: TaskUpdate) -> Result<Option<&Task>, ValidationError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let name = match data.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(validate_name(name)?),
            _ => None,
        };
        let desc = match data.desc.as_deref().map(str::trim) {
            Some(desc) if !desc.is_empty() => Some(validate_desc(desc)?),
            _ => None,
        };
        let now = format_timestamp(self.clock.now());

        let task = &mut self.tasks[index];
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(desc) = desc {
            task.desc = desc;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        task.updated_at = now;
        debug!(id, "update_task");

        self.commit(TaskEvent::Updated(id));
        Ok(Some(&self.tasks[index]))
    }

    /// Remove everything; returns how many tasks were dropped
    pub fn clear_tasks(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        info!(count, "clear_tasks");

        self.commit(TaskEvent::Cleared);
        count
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TaskEvent, &[Task]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }

    fn position(&self, id: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Write through, then notify
    fn commit(&mut self, event: TaskEvent) {
        self.gateway.save_tasks(&self.tasks);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, self.tasks.as_slice());
        }
    }
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > NAME_LIMIT {
        return Err(ValidationError::NameTooLong { len, max: NAME_LIMIT });
    }
    Ok(name.to_string())
}

fn validate_desc(raw: &str) -> Result<String, ValidationError> {
    let desc = raw.trim();
    let len = desc.chars().count();
    if len > DESC_LIMIT {
        return Err(ValidationError::DescriptionTooLong { len, max: DESC_LIMIT });
    }
    Ok(desc.to_string())
}
