use chrono::Utc;

use crate::model::{AppData, Project, Subtask, Todo};

/// Error type for mutation operations
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("todo not found: {0}")]
    TodoNotFound(String),
    #[error("subtask not found: {0}")]
    SubtaskNotFound(String),
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Create a new empty project at the end of the list. Returns its ID.
pub fn add_project(data: &mut AppData, name: &str) -> String {
    let id = fresh_id("project", data.projects.len());
    let order = data.projects.len() as i64;
    data.projects
        .push(Project::new(id.clone(), name.to_string(), order));
    data.recount();
    id
}

/// Append a todo to a project's list. Returns the new todo's ID.
pub fn add_todo(data: &mut AppData, project_id: &str, text: &str) -> Result<String, OpsError> {
    let project = find_project_mut(data, project_id)?;
    let id = fresh_id("todo", project.todos.len());
    let order = project.todos.len() as i64;
    let owner = project.id.clone();
    project
        .todos
        .push(Todo::new(id.clone(), owner, text.to_string(), order));
    project.touch();
    data.recount();
    Ok(id)
}

/// Append a subtask to a todo's list. Returns the new subtask's ID.
pub fn add_subtask(data: &mut AppData, todo_id: &str, text: &str) -> Result<String, OpsError> {
    let (pi, ti) =
        locate_todo(data, todo_id).ok_or_else(|| OpsError::TodoNotFound(todo_id.to_string()))?;
    let id;
    {
        let project = &mut data.projects[pi];
        let todo = &mut project.todos[ti];
        id = fresh_id("subtask", todo.subtasks.len());
        let order = todo.subtasks.len() as i64;
        let owner = todo.id.clone();
        todo.subtasks
            .push(Subtask::new(id.clone(), owner, text.to_string(), order));
        project.touch();
    }
    data.recount();
    Ok(id)
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Set a todo's completion flag. This is where the `completed_at`
/// pairing is maintained; nothing else in the crate touches it.
pub fn set_todo_completed(
    data: &mut AppData,
    todo_id: &str,
    completed: bool,
) -> Result<(), OpsError> {
    let (pi, ti) =
        locate_todo(data, todo_id).ok_or_else(|| OpsError::TodoNotFound(todo_id.to_string()))?;
    let project = &mut data.projects[pi];
    let todo = &mut project.todos[ti];
    todo.is_completed = completed;
    todo.completed_at = completed.then(Utc::now);
    project.touch();
    data.recount();
    Ok(())
}

/// Set a subtask's completion flag, maintaining the timestamp pairing.
pub fn set_subtask_completed(
    data: &mut AppData,
    subtask_id: &str,
    completed: bool,
) -> Result<(), OpsError> {
    let (pi, ti, si) = locate_subtask(data, subtask_id)
        .ok_or_else(|| OpsError::SubtaskNotFound(subtask_id.to_string()))?;
    let project = &mut data.projects[pi];
    let sub = &mut project.todos[ti].subtasks[si];
    sub.is_completed = completed;
    sub.completed_at = completed.then(Utc::now);
    project.touch();
    data.recount();
    Ok(())
}

/// Mark a project completed or not. Does not cascade to todos.
pub fn set_project_completed(
    data: &mut AppData,
    project_id: &str,
    completed: bool,
) -> Result<(), OpsError> {
    let project = find_project_mut(data, project_id)?;
    project.is_completed = completed;
    project.touch();
    data.recount();
    Ok(())
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Delete a project. Surviving projects are re-ranked densely.
pub fn delete_project(data: &mut AppData, project_id: &str) -> Result<(), OpsError> {
    let before = data.projects.len();
    data.projects.retain(|p| p.id != project_id);
    if data.projects.len() == before {
        return Err(OpsError::ProjectNotFound(project_id.to_string()));
    }
    rerank_projects(data);
    data.recount();
    Ok(())
}

/// Delete a todo from whichever project owns it, re-ranking its siblings.
pub fn delete_todo(data: &mut AppData, todo_id: &str) -> Result<(), OpsError> {
    let (pi, ti) =
        locate_todo(data, todo_id).ok_or_else(|| OpsError::TodoNotFound(todo_id.to_string()))?;
    let project = &mut data.projects[pi];
    project.todos.remove(ti);
    for (i, todo) in project.todos.iter_mut().enumerate() {
        todo.order = i as i64;
    }
    project.touch();
    data.recount();
    Ok(())
}

/// Delete a subtask from whichever todo owns it, re-ranking its siblings.
pub fn delete_subtask(data: &mut AppData, subtask_id: &str) -> Result<(), OpsError> {
    let (pi, ti, si) = locate_subtask(data, subtask_id)
        .ok_or_else(|| OpsError::SubtaskNotFound(subtask_id.to_string()))?;
    let project = &mut data.projects[pi];
    let todo = &mut project.todos[ti];
    todo.subtasks.remove(si);
    for (i, sub) in todo.subtasks.iter_mut().enumerate() {
        sub.order = i as i64;
    }
    project.touch();
    data.recount();
    Ok(())
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Find a project by ID, or by exact name as a fallback (CLI convenience).
pub fn find_project<'a>(data: &'a AppData, key: &str) -> Option<&'a Project> {
    data.projects
        .iter()
        .find(|p| p.id == key)
        .or_else(|| data.projects.iter().find(|p| p.name == key))
}

fn find_project_mut<'a>(data: &'a mut AppData, key: &str) -> Result<&'a mut Project, OpsError> {
    let idx = data
        .projects
        .iter()
        .position(|p| p.id == key)
        .or_else(|| data.projects.iter().position(|p| p.name == key))
        .ok_or_else(|| OpsError::ProjectNotFound(key.to_string()))?;
    Ok(&mut data.projects[idx])
}

/// (project index, todo index) of a todo anywhere in the tree.
fn locate_todo(data: &AppData, todo_id: &str) -> Option<(usize, usize)> {
    for (pi, project) in data.projects.iter().enumerate() {
        if let Some(ti) = project.todos.iter().position(|t| t.id == todo_id) {
            return Some((pi, ti));
        }
    }
    None
}

/// (project index, todo index, subtask index) of a subtask anywhere.
fn locate_subtask(data: &AppData, subtask_id: &str) -> Option<(usize, usize, usize)> {
    for (pi, project) in data.projects.iter().enumerate() {
        for (ti, todo) in project.todos.iter().enumerate() {
            if let Some(si) = todo.subtasks.iter().position(|s| s.id == subtask_id) {
                return Some((pi, ti, si));
            }
        }
    }
    None
}

fn rerank_projects(data: &mut AppData) {
    for (i, project) in data.projects.iter_mut().enumerate() {
        project.order = i as i64;
    }
}

fn fresh_id(prefix: &str, index: usize) -> String {
    format!("{prefix}-{}-{index}", Utc::now().timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
