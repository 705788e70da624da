use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single-level checklist entry owned by one todo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Unique within the owning todo's subtask list (not globally)
    pub id: String,
    /// Subtask text
    pub text: String,
    /// Completion flag
    pub is_completed: bool,
    /// Dense rank within the owning todo's subtask list
    pub order: i64,
    /// ID of the owning todo (set by construction, never dangling)
    pub todo_id: String,
    /// Set when completed via a mutation op; the validator does not
    /// enforce the pairing with `is_completed` (see ops/check.rs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Subtask {
    /// Create a new incomplete subtask owned by `todo_id`.
    pub fn new(id: String, todo_id: String, text: String, order: i64) -> Self {
        Subtask {
            id,
            text,
            is_completed: false,
            order,
            todo_id,
            completed_at: None,
        }
    }
}

/// A task within a project, with an ordered list of subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique within the owning project's todo list (not globally)
    pub id: String,
    /// Todo text
    pub text: String,
    /// Completion flag
    pub is_completed: bool,
    /// Dense rank within the owning project's todo list
    pub order: i64,
    /// ID of the owning project (set by construction, never dangling)
    pub project_id: String,
    /// Subtasks in rank order
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Create a new incomplete todo owned by `project_id`, with no subtasks.
    pub fn new(id: String, project_id: String, text: String, order: i64) -> Self {
        Todo {
            id,
            text,
            is_completed: false,
            order,
            project_id,
            subtasks: Vec::new(),
            completed_at: None,
        }
    }
}
