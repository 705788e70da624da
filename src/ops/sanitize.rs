use chrono::Utc;
use serde_json::Value;

use crate::model::{
    AiReportConfig, AppData, AppMetadata, AppSettings, Project, StatusFilter, Subtask, Theme,
    Todo, DATA_VERSION, SEARCH_HISTORY_MAX,
};
use crate::util::json::{get_i64, get_str, parse_datetime, truthy};

/// Repair a canonical-shaped but possibly partial or malformed tree into
/// a structurally valid AppData.
///
/// Total: never fails, for any input including non-objects. Defaulting,
/// not validation — missing fields get defaults, generated IDs, or
/// placeholder names; null and non-object project/todo/subtask entries
/// are dropped. This is the last line of defense so a bad import
/// degrades to an empty-ish but renderable state. Run the validator
/// first if the caller wants a report of what was wrong.
///
/// Idempotent on already-valid input: when nothing is missing, nothing
/// changes.
pub fn sanitize_app_data(raw: &Value) -> AppData {
    let Some(obj) = raw.as_object() else {
        return AppData::default();
    };

    // One stamp per call; generated IDs stay unique via the index suffix
    let stamp = Utc::now().timestamp_millis();

    let version = match get_str(raw, "version") {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => DATA_VERSION.to_string(),
    };

    let projects = match obj.get("projects") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter(|p| p.is_object())
            .enumerate()
            .map(|(i, p)| sanitize_project(p, i, stamp))
            .collect(),
        _ => Vec::new(),
    };

    let settings = sanitize_settings(obj.get("settings"));
    let metadata = sanitize_metadata(obj.get("metadata"));

    AppData {
        version,
        projects,
        settings,
        metadata,
    }
}

fn sanitize_project(raw: &Value, index: usize, stamp: i64) -> Project {
    let id = match get_str(raw, "id") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("project-{stamp}-{index}"),
    };
    let name = match get_str(raw, "name") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("未命名项目 {}", index + 1),
    };

    let todos = match raw.get("todos") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter(|t| t.is_object())
            .enumerate()
            // Each kept todo's projectId is forcibly reset to the (possibly
            // freshly generated) parent ID, whatever the input claimed
            .map(|(i, t)| sanitize_todo(t, &id, i, stamp))
            .collect(),
        _ => Vec::new(),
    };

    Project {
        id,
        name,
        description: get_str(raw, "description").unwrap_or("").to_string(),
        is_completed: truthy(raw.get("isCompleted")),
        created_at: datetime_or_now(raw, "createdAt"),
        updated_at: datetime_or_now(raw, "updatedAt"),
        todos,
        order: get_i64(raw, "order").unwrap_or(index as i64),
    }
}

fn sanitize_todo(raw: &Value, project_id: &str, index: usize, stamp: i64) -> Todo {
    let id = match get_str(raw, "id") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("todo-{stamp}-{index}"),
    };
    let text = match get_str(raw, "text") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("未命名任务 {}", index + 1),
    };

    let subtasks = match raw.get("subtasks") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter(|s| s.is_object())
            .enumerate()
            .map(|(i, s)| sanitize_subtask(s, &id, i, stamp))
            .collect(),
        _ => Vec::new(),
    };

    Todo {
        id,
        text,
        is_completed: truthy(raw.get("isCompleted")),
        order: get_i64(raw, "order").unwrap_or(index as i64),
        project_id: project_id.to_string(),
        subtasks,
        completed_at: get_str(raw, "completedAt").and_then(parse_datetime),
    }
}

fn sanitize_subtask(raw: &Value, todo_id: &str, index: usize, stamp: i64) -> Subtask {
    let id = match get_str(raw, "id") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("subtask-{stamp}-{index}"),
    };
    let text = match get_str(raw, "text") {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => format!("未命名子任务 {}", index + 1),
    };

    Subtask {
        id,
        text,
        is_completed: truthy(raw.get("isCompleted")),
        order: get_i64(raw, "order").unwrap_or(index as i64),
        todo_id: todo_id.to_string(),
        completed_at: get_str(raw, "completedAt").and_then(parse_datetime),
    }
}

fn sanitize_settings(raw: Option<&Value>) -> AppSettings {
    let mut settings = AppSettings::default();
    let Some(raw) = raw.filter(|v| v.is_object()) else {
        return settings;
    };

    // Theme coerces to auto unless exactly one of the valid values
    if let Some(theme) = get_str(raw, "theme").and_then(Theme::parse_theme) {
        settings.theme = theme;
    }
    if raw.get("autoSave").is_some() {
        settings.auto_save = truthy(raw.get("autoSave"));
    }
    if raw.get("showCompletedProjects").is_some() {
        settings.show_completed_projects = truthy(raw.get("showCompletedProjects"));
    }
    if raw.get("backupEnabled").is_some() {
        settings.backup_enabled = truthy(raw.get("backupEnabled"));
    }
    // Out-of-range values keep the default rather than wrapping
    if let Some(minutes) = get_i64(raw, "backupIntervalMinutes")
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| *m > 0)
    {
        settings.backup_interval_minutes = minutes;
    }
    settings.last_backup_time = get_str(raw, "lastBackupTime").and_then(parse_datetime);

    if let Some(entries) = raw.get("collapsedProjects").and_then(Value::as_array) {
        settings.collapsed_projects = entries
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
    }
    if let Some(entries) = raw.get("searchHistory").and_then(Value::as_array) {
        settings.search_history = entries
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .take(SEARCH_HISTORY_MAX)
            .collect();
    }
    if let Some(filter) = get_str(raw, "statusFilter") {
        settings.status_filter = match filter {
            "active" => StatusFilter::Active,
            "completed" => StatusFilter::Completed,
            _ => StatusFilter::All,
        };
    }
    if let Some(report) = raw.get("aiReport").filter(|v| v.is_object()) {
        settings.ai_report = Some(AiReportConfig {
            ollama_url: get_str(report, "ollamaUrl")
                .unwrap_or("http://localhost:11434")
                .to_string(),
            model_name: get_str(report, "modelName").unwrap_or("").to_string(),
            temperature: report
                .get("temperature")
                .and_then(Value::as_f64)
                .unwrap_or(0.7),
        });
    }

    settings
}

fn sanitize_metadata(raw: Option<&Value>) -> AppMetadata {
    let Some(raw) = raw.filter(|v| v.is_object()) else {
        return AppMetadata::default();
    };

    AppMetadata {
        created_at: datetime_or_now(raw, "createdAt"),
        last_modified: datetime_or_now(raw, "lastModified"),
        total_projects: count_or_zero(raw, "totalProjects"),
        total_todos: count_or_zero(raw, "totalTodos"),
    }
}

fn datetime_or_now(obj: &Value, key: &str) -> chrono::DateTime<Utc> {
    get_str(obj, key)
        .and_then(parse_datetime)
        .unwrap_or_else(Utc::now)
}

fn count_or_zero(obj: &Value, key: &str) -> u64 {
    get_i64(obj, key).filter(|n| *n >= 0).unwrap_or(0) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
