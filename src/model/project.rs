use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::todo::Todo;

/// A top-level project holding an ordered list of todos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique across all projects in the store
    pub id: String,
    /// Project name
    pub name: String,
    /// Free-form description (may be empty)
    #[serde(default)]
    pub description: String,
    /// Completion flag
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Todos in rank order
    #[serde(default)]
    pub todos: Vec<Todo>,
    /// Dense rank among all projects
    #[serde(default)]
    pub order: i64,
}

impl Project {
    /// Create a new empty project with current timestamps.
    pub fn new(id: String, name: String, order: i64) -> Self {
        let now = Utc::now();
        Project {
            id,
            name,
            description: String::new(),
            is_completed: false,
            created_at: now,
            updated_at: now,
            todos: Vec::new(),
            order,
        }
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
