//! Tasks that sessions can be attributed to

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PomodoroError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Unix milliseconds
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_task_id: Option<String>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task at the front. It becomes active when nothing else is.
    pub fn add(&mut self, title: impl Into<String>, created_at: i64) -> &Task {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
            created_at,
        };
        if self.active_task_id.is_none() {
            self.active_task_id = Some(task.id.clone());
        }
        self.tasks.insert(0, task);
        &self.tasks[0]
    }

    /// Flip a task's completed flag
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PomodoroError::TaskNotFound(id.to_string()))?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Remove a task. History entries that point at it are left alone.
    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PomodoroError::TaskNotFound(id.to_string()))?;
        if self.active_task_id.as_deref() == Some(id) {
            self.active_task_id = None;
        }
        Ok(self.tasks.remove(index))
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) => {
                if self.find(id).is_none() {
                    return Err(PomodoroError::TaskNotFound(id.to_string()));
                }
                self.active_task_id = Some(id.to_string());
            }
            None => self.active_task_id = None,
        }
        Ok(())
    }

    pub fn active(&self) -> Option<&Task> {
        self.active_task_id.as_deref().and_then(|id| self.find(id))
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active().map(|t| t.id.as_str())
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find by full id or by a unique id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&Task> {
        if let Some(task) = self.find(id_or_prefix) {
            return Ok(task);
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) if !id_or_prefix.is_empty() => Ok(task),
            _ => Err(PomodoroError::TaskNotFound(id_or_prefix.to_string())),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
