use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::project::Project;
use crate::model::settings::AppSettings;

/// Current store format version.
pub const DATA_VERSION: &str = "1.0.0";

/// Aggregate counts and bookkeeping timestamps for the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub total_projects: u64,
    pub total_todos: u64,
}

impl Default for AppMetadata {
    fn default() -> Self {
        let now = Utc::now();
        AppMetadata {
            created_at: now,
            last_modified: now,
            total_projects: 0,
            total_todos: 0,
        }
    }
}

/// The aggregate root: the unit persisted to disk and exchanged on
/// import/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub version: String,
    pub projects: Vec<Project>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub metadata: AppMetadata,
}

impl Default for AppData {
    fn default() -> Self {
        AppData {
            version: DATA_VERSION.to_string(),
            projects: Vec::new(),
            settings: AppSettings::default(),
            metadata: AppMetadata::default(),
        }
    }
}

impl AppData {
    /// Recompute aggregate counts from the tree and bump `last_modified`.
    /// Called by every mutation op and before every save.
    pub fn recount(&mut self) {
        self.metadata.total_projects = self.projects.len() as u64;
        self.metadata.total_todos = self
            .projects
            .iter()
            .map(|p| p.todos.len() as u64)
            .sum();
        self.metadata.last_modified = Utc::now();
    }

    /// Total number of todos across all projects.
    pub fn todo_count(&self) -> usize {
        self.projects.iter().map(|p| p.todos.len()).sum()
    }
}
