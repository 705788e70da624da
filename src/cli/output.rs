use serde::Serialize;

use crate::convert::FormatInfo;
use crate::model::{Project, Subtask, Todo};
use crate::ops::check::CheckResult;
use crate::ops::search::SearchMatch;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct SubtaskJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Serialize)]
pub struct TodoJson {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubtaskJson>,
}

#[derive(Serialize)]
pub struct ProjectJson {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub completed: bool,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub projects: Vec<ProjectJson>,
    pub total_projects: u64,
    pub total_todos: u64,
}

#[derive(Serialize)]
pub struct SearchJson {
    pub pattern: String,
    pub matches: Vec<SearchMatch>,
}

#[derive(Serialize)]
pub struct ImportPreviewJson {
    pub format: FormatInfo,
    pub projects: usize,
    pub todos: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub validation: CheckResult,
    pub committed: bool,
}

#[derive(Serialize)]
pub struct BackupListJson {
    pub backups: Vec<String>,
}

impl From<&Subtask> for SubtaskJson {
    fn from(sub: &Subtask) -> Self {
        SubtaskJson {
            id: sub.id.clone(),
            text: sub.text.clone(),
            completed: sub.is_completed,
        }
    }
}

impl From<&Todo> for TodoJson {
    fn from(todo: &Todo) -> Self {
        TodoJson {
            id: todo.id.clone(),
            text: todo.text.clone(),
            completed: todo.is_completed,
            subtasks: todo.subtasks.iter().map(SubtaskJson::from).collect(),
        }
    }
}

impl From<&Project> for ProjectJson {
    fn from(project: &Project) -> Self {
        ProjectJson {
            id: project.id.clone(),
            name: project.name.clone(),
            description: project.description.clone(),
            completed: project.is_completed,
            todos: project.todos.iter().map(TodoJson::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Human output
// ---------------------------------------------------------------------------

/// Print one project as an indented tree.
pub fn print_project(project: &Project) {
    let done = project.todos.iter().filter(|t| t.is_completed).count();
    let marker = if project.is_completed { "✓ " } else { "" };
    println!(
        "{}{} [{}] ({}/{})",
        marker,
        project.name,
        project.id,
        done,
        project.todos.len()
    );
    for todo in &project.todos {
        println!("  {} {}  `{}`", checkbox(todo.is_completed), todo.text, todo.id);
        for sub in &todo.subtasks {
            println!(
                "      {} {}  `{}`",
                checkbox(sub.is_completed),
                sub.text,
                sub.id
            );
        }
    }
}

fn checkbox(completed: bool) -> &'static str {
    if completed {
        "[x]"
    } else {
        "[ ]"
    }
}
