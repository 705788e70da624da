use std::collections::HashMap;

use serde_json::Value;

use crate::convert::{Conversion, ConvertError};
use crate::model::{AppData, Project, Subtask, Todo};
use crate::util::json::{get_datetime, get_i64, get_str, id_string, truthy};

/// Convert a Todoist export (projects + flat task list) into canonical
/// AppData.
///
/// Inbox projects are skipped with a warning. Tasks are matched to their
/// project by `project_id` and split into top-level tasks and children;
/// a child whose parent cannot be found among the project's top-level
/// tasks is demoted to a top-level todo rather than dropped. Canonical
/// IDs are derived from source IDs with prefixes, so re-converting the
/// same export is idempotent at the ID level.
pub fn convert_from_todoist(raw: &Value) -> Result<Conversion, ConvertError> {
    let src_projects = raw
        .get("projects")
        .and_then(Value::as_array)
        .ok_or(ConvertError::TodoistMissingArray("projects"))?;
    let items = raw
        .get("items")
        .and_then(Value::as_array)
        .ok_or(ConvertError::TodoistMissingArray("items"))?;

    let mut warnings = Vec::new();
    let mut projects: Vec<Project> = Vec::new();

    for (pidx, sp) in src_projects.iter().enumerate() {
        let name = get_str(sp, "name").unwrap_or("未命名项目").to_string();

        if is_inbox(sp) {
            warnings.push(format!("跳过收件箱项目: {name}"));
            continue;
        }

        let src_id = id_string(sp.get("id")).unwrap_or_else(|| format!("import-{pidx}"));
        let project_id = format!("project-{src_id}");

        // Partition this project's tasks into top-level tasks and children
        let mut top_level: Vec<&Value> = Vec::new();
        let mut children: Vec<&Value> = Vec::new();
        for item in items {
            if id_string(item.get("project_id")).as_deref() != Some(src_id.as_str()) {
                continue;
            }
            if id_string(item.get("parent_id")).is_some() {
                children.push(item);
            } else {
                top_level.push(item);
            }
        }

        let mut todos: Vec<Todo> = Vec::new();
        // Source task ID → index in `todos`, for attaching children
        let mut by_src_id: HashMap<String, usize> = HashMap::new();

        for (i, item) in top_level.iter().enumerate() {
            let task_src =
                id_string(item.get("id")).unwrap_or_else(|| format!("{src_id}-{i}"));
            by_src_id.insert(task_src.clone(), todos.len());
            todos.push(build_todo(item, &project_id, &task_src, i));
        }

        for item in &children {
            let parent_src = id_string(item.get("parent_id")).unwrap_or_default();
            match by_src_id.get(&parent_src) {
                Some(&idx) => {
                    let parent = &mut todos[idx];
                    let rank = parent.subtasks.len();
                    let sub_src = id_string(item.get("id"))
                        .unwrap_or_else(|| format!("{parent_src}-{rank}"));
                    let order = get_i64(item, "order")
                        .or_else(|| get_i64(item, "child_order"))
                        .unwrap_or(rank as i64);
                    let mut sub = Subtask::new(
                        format!("subtask-{sub_src}"),
                        parent.id.clone(),
                        get_str(item, "content").unwrap_or("").to_string(),
                        order,
                    );
                    sub.is_completed = item_completed(item);
                    if sub.is_completed {
                        sub.completed_at = get_datetime(item, "completed_at");
                    }
                    parent.subtasks.push(sub);
                }
                None => {
                    // Parent not among this project's top-level tasks:
                    // keep the data by promoting the child
                    let text = get_str(item, "content").unwrap_or("").to_string();
                    warnings.push(format!(
                        "任务 \"{text}\" 的父任务未找到，已提升为顶级任务"
                    ));
                    let rank = todos.len();
                    let task_src = id_string(item.get("id"))
                        .unwrap_or_else(|| format!("{src_id}-orphan-{rank}"));
                    todos.push(build_todo(item, &project_id, &task_src, rank));
                }
            }
        }

        // Empty projects are never auto-completed
        let is_completed = !todos.is_empty() && todos.iter().all(|t| t.is_completed);

        let mut project = Project::new(project_id, name, projects.len() as i64);
        project.is_completed = is_completed;
        project.todos = todos;
        projects.push(project);
    }

    let mut data = AppData {
        projects,
        ..Default::default()
    };
    data.recount();

    Ok(Conversion { data, warnings })
}

/// Inbox and team-inbox projects are excluded from import entirely.
fn is_inbox(project: &Value) -> bool {
    truthy(project.get("is_inbox_project"))
        || truthy(project.get("inbox_project"))
        || truthy(project.get("is_team_inbox"))
        || truthy(project.get("team_inbox"))
}

/// Completion flag: `is_completed` per the documented shape, with the
/// export-dump spelling `checked` as a fallback.
fn item_completed(item: &Value) -> bool {
    match item.get("is_completed").and_then(Value::as_bool) {
        Some(b) => b,
        None => truthy(item.get("checked")),
    }
}

fn build_todo(item: &Value, project_id: &str, task_src: &str, rank: usize) -> Todo {
    let order = get_i64(item, "order")
        .or_else(|| get_i64(item, "child_order"))
        .unwrap_or(rank as i64);
    let mut todo = Todo::new(
        format!("todo-{task_src}"),
        project_id.to_string(),
        get_str(item, "content").unwrap_or("").to_string(),
        order,
    );
    todo.is_completed = item_completed(item);
    if todo.is_completed {
        todo.completed_at = get_datetime(item, "completed_at");
    }
    todo
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple_export() -> Value {
        json!({
            "projects": [
                { "id": "123", "name": "My Project", "is_inbox_project": false }
            ],
            "items": [
                {
                    "id": "456", "project_id": "123", "content": "Buy groceries",
                    "is_completed": false, "order": 1
                },
                {
                    "id": "789", "project_id": "123", "content": "Buy milk",
                    "parent_id": "456", "is_completed": false, "order": 1
                }
            ]
        })
    }

    // --- Basic conversion ---

    #[test]
    fn test_convert_simple_export() {
        let conv = convert_from_todoist(&simple_export()).unwrap();
        assert!(conv.warnings.is_empty());

        let data = &conv.data;
        assert_eq!(data.projects.len(), 1);
        let project = &data.projects[0];
        assert_eq!(project.name, "My Project");
        assert_eq!(project.todos.len(), 1);
        let todo = &project.todos[0];
        assert_eq!(todo.text, "Buy groceries");
        assert_eq!(todo.subtasks.len(), 1);
        assert_eq!(todo.subtasks[0].text, "Buy milk");
    }

    #[test]
    fn test_ids_are_deterministic() {
        let a = convert_from_todoist(&simple_export()).unwrap();
        let b = convert_from_todoist(&simple_export()).unwrap();
        assert_eq!(a.data.projects[0].id, "project-123");
        assert_eq!(a.data.projects[0].todos[0].id, "todo-456");
        assert_eq!(a.data.projects[0].todos[0].subtasks[0].id, "subtask-789");
        assert_eq!(a.data.projects[0].id, b.data.projects[0].id);
    }

    #[test]
    fn test_subtask_references_parent_canonical_id() {
        let conv = convert_from_todoist(&simple_export()).unwrap();
        let todo = &conv.data.projects[0].todos[0];
        assert_eq!(todo.subtasks[0].todo_id, todo.id);
        assert_eq!(todo.project_id, conv.data.projects[0].id);
    }

    // --- Containment: N top-level + M children with valid parents ---

    #[test]
    fn test_round_trip_containment() {
        let raw = json!({
            "projects": [{ "id": "1", "name": "P" }],
            "items": [
                { "id": "10", "project_id": "1", "content": "a", "order": 0 },
                { "id": "11", "project_id": "1", "content": "b", "order": 1 },
                { "id": "12", "project_id": "1", "content": "c", "order": 2 },
                { "id": "20", "project_id": "1", "content": "a1", "parent_id": "10" },
                { "id": "21", "project_id": "1", "content": "a2", "parent_id": "10" },
                { "id": "22", "project_id": "1", "content": "b1", "parent_id": "11" }
            ]
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert!(conv.warnings.is_empty());
        let todos = &conv.data.projects[0].todos;
        assert_eq!(todos.len(), 3);
        let subtask_total: usize = todos.iter().map(|t| t.subtasks.len()).sum();
        assert_eq!(subtask_total, 3);
    }

    // --- Inbox exclusion ---

    #[test]
    fn test_inbox_project_excluded() {
        let raw = json!({
            "projects": [
                { "id": "1", "name": "Inbox", "is_inbox_project": true },
                { "id": "2", "name": "Real" }
            ],
            "items": []
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert_eq!(conv.data.projects.len(), 1);
        assert_eq!(conv.data.projects[0].name, "Real");
        assert_eq!(conv.warnings.len(), 1);
        assert!(conv.warnings[0].contains("Inbox"));
    }

    #[test]
    fn test_team_inbox_excluded() {
        let raw = json!({
            "projects": [{ "id": "1", "name": "Team Inbox", "team_inbox": true }],
            "items": []
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert!(conv.data.projects.is_empty());
        assert_eq!(conv.warnings.len(), 1);
    }

    // --- Orphan demotion ---

    #[test]
    fn test_orphan_child_demoted_with_warning() {
        let raw = json!({
            "projects": [{ "id": "1", "name": "P" }],
            "items": [
                { "id": "10", "project_id": "1", "content": "real task" },
                { "id": "20", "project_id": "1", "content": "orphan", "parent_id": "999" }
            ]
        });
        let conv = convert_from_todoist(&raw).unwrap();
        let todos = &conv.data.projects[0].todos;
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[1].text, "orphan");
        assert!(todos[1].subtasks.is_empty());
        assert_eq!(conv.warnings.len(), 1);
        assert!(conv.warnings[0].contains("orphan"));
    }

    // --- Project completion aggregate ---

    #[test]
    fn test_project_completed_when_all_todos_done() {
        let raw = json!({
            "projects": [{ "id": "1", "name": "P" }],
            "items": [
                { "id": "10", "project_id": "1", "content": "a", "is_completed": true },
                { "id": "11", "project_id": "1", "content": "b", "checked": 1 }
            ]
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert!(conv.data.projects[0].is_completed);
    }

    #[test]
    fn test_empty_project_never_auto_completed() {
        let raw = json!({
            "projects": [{ "id": "1", "name": "Empty" }],
            "items": []
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert!(!conv.data.projects[0].is_completed);
    }

    // --- Numeric source IDs ---

    #[test]
    fn test_numeric_ids_match() {
        let raw = json!({
            "projects": [{ "id": 123, "name": "P" }],
            "items": [
                { "id": 456, "project_id": 123, "content": "task" }
            ]
        });
        let conv = convert_from_todoist(&raw).unwrap();
        assert_eq!(conv.data.projects[0].todos.len(), 1);
        assert_eq!(conv.data.projects[0].todos[0].id, "todo-456");
    }

    // --- Metadata recomputed from output ---

    #[test]
    fn test_metadata_counts() {
        let conv = convert_from_todoist(&simple_export()).unwrap();
        assert_eq!(conv.data.metadata.total_projects, 1);
        assert_eq!(conv.data.metadata.total_todos, 1);
    }

    // --- Preconditions ---

    #[test]
    fn test_missing_projects_array() {
        let err = convert_from_todoist(&json!({ "items": [] })).unwrap_err();
        assert!(err.to_string().contains("projects"));
    }

    #[test]
    fn test_missing_items_array() {
        let err = convert_from_todoist(&json!({ "projects": [] })).unwrap_err();
        assert!(err.to_string().contains("items"));
    }
}
