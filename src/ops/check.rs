use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::model::Theme;
use crate::util::json::parse_datetime;

/// Options controlling validation.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Enable duplicate-ID detection (per sibling scope)
    pub check_ids: bool,
    /// Reserved for lenient acceptance; the validator itself emits the
    /// same findings either way, callers decide what to tolerate
    pub allow_partial_data: bool,
    /// Whether the caller treats warnings as blocking. Not consulted
    /// here; governs caller behavior only (e.g. `td check --strict`)
    pub strict_mode: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            check_ids: true,
            allow_partial_data: false,
            strict_mode: false,
        }
    }
}

/// Structured result from validation, suitable for --json output.
///
/// The validator never rejects anything itself; callers decide based on
/// `valid` (errors) and their own strictness (warnings).
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

impl CheckResult {
    fn merge(&mut self, other: CheckResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// A validation error: the tree is structurally unsafe to render or
/// persist as-is.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The value at `path` is not a JSON object
    #[serde(rename = "not_an_object")]
    #[error("{path}: 不是有效的对象")]
    NotAnObject { path: String },
    /// A required field is absent
    #[serde(rename = "missing_field")]
    #[error("{path}: 缺少必需字段 {field}")]
    MissingField { path: String, field: &'static str },
    /// A field is present with the wrong JSON type
    #[serde(rename = "wrong_type")]
    #[error("{path}: 字段 {field} 应为{expected}")]
    WrongType {
        path: String,
        field: &'static str,
        expected: &'static str,
    },
    /// A required string field is present but empty
    #[serde(rename = "empty_field")]
    #[error("{path}: 字段 {field} 不能为空")]
    EmptyField { path: String, field: &'static str },
    /// settings.theme is present but not light/dark/auto
    #[serde(rename = "invalid_theme")]
    #[error("settings: 无效的主题设置 {value}")]
    InvalidTheme { value: String },
    /// Two projects share an ID
    #[serde(rename = "duplicate_project_id")]
    #[error("重复的项目 ID: {id}")]
    DuplicateProjectId { id: String },
    /// Two todos within one project share an ID
    #[serde(rename = "duplicate_todo_id")]
    #[error("项目 {project} 中重复的待办 ID: {id}")]
    DuplicateTodoId { project: String, id: String },
    /// Two subtasks within one todo share an ID
    #[serde(rename = "duplicate_subtask_id")]
    #[error("待办 {todo} 中重复的子任务 ID: {id}")]
    DuplicateSubtaskId { todo: String, id: String },
}

/// A validation warning: cosmetic or non-blocking, safe to proceed.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// A timestamp field is missing or not a parseable datetime
    #[serde(rename = "bad_timestamp")]
    #[error("{path}: 字段 {field} 不是有效的日期")]
    BadTimestamp { path: String, field: &'static str },
    /// An aggregate count is present but non-numeric or negative
    #[serde(rename = "bad_count")]
    #[error("metadata: 字段 {field} 不是有效的数量")]
    BadCount { field: &'static str },
}

// ---------------------------------------------------------------------------
// Main validation entry point
// ---------------------------------------------------------------------------

/// Validate a canonical-shaped JSON tree against the structural rules.
///
/// Read-only; accumulates every applicable finding rather than stopping
/// at the first (the only early return is a top-level non-object).
/// Duplicate-ID detection is per sibling scope: projects globally, todos
/// within one project, subtasks within one todo. IDs reused across
/// different scopes are deliberately not flagged.
///
/// Note: the `completedAt`/`isCompleted` pairing is not checked here.
/// The pairing is maintained by the mutation ops only; trees where a
/// completed entry lacks its timestamp still validate.
pub fn validate_app_data(data: &Value, opts: &ValidateOptions) -> CheckResult {
    let mut result = CheckResult::default();

    let Some(obj) = data.as_object() else {
        result.errors.push(CheckError::NotAnObject {
            path: "root".to_string(),
        });
        return result.finish();
    };

    if !obj.contains_key("version") {
        result.errors.push(CheckError::MissingField {
            path: "root".to_string(),
            field: "version",
        });
    } else if !obj["version"].is_string() {
        result.errors.push(CheckError::WrongType {
            path: "root".to_string(),
            field: "version",
            expected: "字符串",
        });
    }

    match obj.get("projects") {
        None => result.errors.push(CheckError::MissingField {
            path: "root".to_string(),
            field: "projects",
        }),
        Some(Value::Array(projects)) => {
            let mut seen_ids: HashSet<String> = HashSet::new();
            for (i, project) in projects.iter().enumerate() {
                let path = format!("projects[{i}]");
                result.merge(validate_project(project, &path, opts));

                if opts.check_ids {
                    if let Some(id) = project.get("id").and_then(Value::as_str) {
                        if !id.is_empty() && !seen_ids.insert(id.to_string()) {
                            result.errors.push(CheckError::DuplicateProjectId {
                                id: id.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: "root".to_string(),
            field: "projects",
            expected: "数组",
        }),
    }

    match obj.get("settings") {
        None => result.errors.push(CheckError::MissingField {
            path: "root".to_string(),
            field: "settings",
        }),
        Some(settings) if settings.is_object() => {
            result.merge(validate_settings(settings));
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: "root".to_string(),
            field: "settings",
            expected: "对象",
        }),
    }

    match obj.get("metadata") {
        None => result.errors.push(CheckError::MissingField {
            path: "root".to_string(),
            field: "metadata",
        }),
        Some(metadata) if metadata.is_object() => {
            result.merge(validate_metadata(metadata));
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: "root".to_string(),
            field: "metadata",
            expected: "对象",
        }),
    }

    result.finish()
}

// ---------------------------------------------------------------------------
// Per-level validators
// ---------------------------------------------------------------------------

/// Validate a single project node (recursing into its todos).
pub fn validate_project(project: &Value, path: &str, opts: &ValidateOptions) -> CheckResult {
    let mut result = CheckResult::default();

    if !project.is_object() {
        result.errors.push(CheckError::NotAnObject {
            path: path.to_string(),
        });
        return result.finish();
    }

    check_required_string(project, path, "id", true, &mut result);
    check_required_string(project, path, "name", true, &mut result);
    check_required_bool(project, path, "isCompleted", &mut result);

    // Date problems are never fatal
    check_timestamp(project, path, "createdAt", &mut result);
    check_timestamp(project, path, "updatedAt", &mut result);

    let project_label = project
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or(path)
        .to_string();

    match project.get("todos") {
        None => result.errors.push(CheckError::MissingField {
            path: path.to_string(),
            field: "todos",
        }),
        Some(Value::Array(todos)) => {
            // Fresh scope per project: todo IDs need only be unique here
            let mut seen_ids: HashSet<String> = HashSet::new();
            for (i, todo) in todos.iter().enumerate() {
                let todo_path = format!("{path}.todos[{i}]");
                result.merge(validate_todo(todo, &todo_path, opts));

                if opts.check_ids {
                    if let Some(id) = todo.get("id").and_then(Value::as_str) {
                        if !id.is_empty() && !seen_ids.insert(id.to_string()) {
                            result.errors.push(CheckError::DuplicateTodoId {
                                project: project_label.clone(),
                                id: id.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: path.to_string(),
            field: "todos",
            expected: "数组",
        }),
    }

    result.finish()
}

/// Validate a single todo node (recursing into its subtasks).
pub fn validate_todo(todo: &Value, path: &str, opts: &ValidateOptions) -> CheckResult {
    let mut result = CheckResult::default();

    if !todo.is_object() {
        result.errors.push(CheckError::NotAnObject {
            path: path.to_string(),
        });
        return result.finish();
    }

    check_required_string(todo, path, "id", true, &mut result);
    check_required_string(todo, path, "text", false, &mut result);
    check_required_bool(todo, path, "isCompleted", &mut result);

    let todo_label = todo
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or(path)
        .to_string();

    // subtasks is optional, but must be an array when present
    match todo.get("subtasks") {
        None => {}
        Some(Value::Array(subtasks)) => {
            // Fresh scope per todo: subtask IDs need only be unique here
            let mut seen_ids: HashSet<String> = HashSet::new();
            for (i, subtask) in subtasks.iter().enumerate() {
                let sub_path = format!("{path}.subtasks[{i}]");
                result.merge(validate_subtask(subtask, &sub_path));

                if opts.check_ids {
                    if let Some(id) = subtask.get("id").and_then(Value::as_str) {
                        if !id.is_empty() && !seen_ids.insert(id.to_string()) {
                            result.errors.push(CheckError::DuplicateSubtaskId {
                                todo: todo_label.clone(),
                                id: id.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: path.to_string(),
            field: "subtasks",
            expected: "数组",
        }),
    }

    result.finish()
}

/// Validate a single subtask node. No further recursion.
pub fn validate_subtask(subtask: &Value, path: &str) -> CheckResult {
    let mut result = CheckResult::default();

    if !subtask.is_object() {
        result.errors.push(CheckError::NotAnObject {
            path: path.to_string(),
        });
        return result.finish();
    }

    check_required_string(subtask, path, "id", true, &mut result);
    check_required_string(subtask, path, "text", false, &mut result);
    check_required_bool(subtask, path, "isCompleted", &mut result);

    result.finish()
}

/// Validate the settings bag. Absent optional fields are fine; fields
/// present with an invalid value are errors.
pub fn validate_settings(settings: &Value) -> CheckResult {
    let mut result = CheckResult::default();

    if let Some(theme) = settings.get("theme") {
        let valid = theme
            .as_str()
            .is_some_and(|s| Theme::parse_theme(s).is_some());
        if !valid {
            result.errors.push(CheckError::InvalidTheme {
                value: theme.to_string(),
            });
        }
    }

    for field in ["autoSave", "showCompletedProjects"] {
        if let Some(v) = settings.get(field) {
            if !v.is_boolean() {
                result.errors.push(CheckError::WrongType {
                    path: "settings".to_string(),
                    field,
                    expected: "布尔值",
                });
            }
        }
    }

    result.finish()
}

/// Validate the metadata block. Everything here is advisory: bad dates
/// and suspicious counts are warnings, never errors.
pub fn validate_metadata(metadata: &Value) -> CheckResult {
    let mut result = CheckResult::default();

    for field in ["createdAt", "lastModified"] {
        if let Some(v) = metadata.get(field) {
            let parseable = v.as_str().is_some_and(|s| parse_datetime(s).is_some());
            if !parseable {
                result.warnings.push(CheckWarning::BadTimestamp {
                    path: "metadata".to_string(),
                    field,
                });
            }
        }
    }

    for field in ["totalProjects", "totalTodos"] {
        if let Some(v) = metadata.get(field) {
            let ok = v.as_i64().is_some_and(|n| n >= 0)
                || v.as_f64().is_some_and(|f| f >= 0.0 && f.fract() == 0.0);
            if !ok {
                result.warnings.push(CheckWarning::BadCount { field });
            }
        }
    }

    result.finish()
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn check_required_string(
    obj: &Value,
    path: &str,
    field: &'static str,
    require_non_empty: bool,
    result: &mut CheckResult,
) {
    match obj.get(field) {
        None => result.errors.push(CheckError::MissingField {
            path: path.to_string(),
            field,
        }),
        Some(Value::String(s)) => {
            if require_non_empty && s.is_empty() {
                result.errors.push(CheckError::EmptyField {
                    path: path.to_string(),
                    field,
                });
            }
        }
        Some(_) => result.errors.push(CheckError::WrongType {
            path: path.to_string(),
            field,
            expected: "字符串",
        }),
    }
}

fn check_required_bool(obj: &Value, path: &str, field: &'static str, result: &mut CheckResult) {
    match obj.get(field) {
        None => result.errors.push(CheckError::MissingField {
            path: path.to_string(),
            field,
        }),
        Some(Value::Bool(_)) => {}
        Some(_) => result.errors.push(CheckError::WrongType {
            path: path.to_string(),
            field,
            expected: "布尔值",
        }),
    }
}

fn check_timestamp(obj: &Value, path: &str, field: &'static str, result: &mut CheckResult) {
    let parseable = obj
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| parse_datetime(s).is_some());
    if !parseable {
        result.warnings.push(CheckWarning::BadTimestamp {
            path: path.to_string(),
            field,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
