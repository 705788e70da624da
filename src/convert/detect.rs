use serde::Serialize;
use serde_json::Value;

/// The closed set of source formats the import pipeline recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// taskdeck's own canonical AppData shape
    PmApp,
    /// Todoist relational export: projects + flat task list
    Todoist,
    /// Trello single-board export
    Trello,
    Unknown,
}

/// Presentation info for a detected format, shown before an import commits.
#[derive(Debug, Clone, Serialize)]
pub struct FormatInfo {
    pub format: SourceFormat,
    pub description: &'static str,
    /// Fixed per-format constant, not computed from content
    pub confidence: f64,
}

/// Classify an arbitrary parsed JSON value as one of the known source
/// formats. Pure and total; rules are checked in order, first match wins.
pub fn detect_format(value: &Value) -> SourceFormat {
    let Some(obj) = value.as_object() else {
        return SourceFormat::Unknown;
    };

    // Native format: all four top-level sections present
    if obj.contains_key("version")
        && obj.contains_key("projects")
        && obj.contains_key("settings")
        && obj.contains_key("metadata")
    {
        return SourceFormat::PmApp;
    }

    // Todoist export: projects + flat items list
    if obj.get("projects").is_some_and(Value::is_array)
        && obj.get("items").is_some_and(Value::is_array)
    {
        return SourceFormat::Todoist;
    }

    // Trello single-board export
    if obj.contains_key("name")
        && obj.get("lists").is_some_and(Value::is_array)
        && obj.get("cards").is_some_and(Value::is_array)
    {
        return SourceFormat::Trello;
    }

    // Already-unwrapped Trello board metadata (no lists/cards wrapper)
    if obj.contains_key("id")
        && obj.contains_key("name")
        && obj
            .get("url")
            .and_then(Value::as_str)
            .is_some_and(|u| u.contains("trello.com"))
    {
        return SourceFormat::Trello;
    }

    SourceFormat::Unknown
}

/// Format info for UI display before committing an import.
pub fn format_info(format: SourceFormat) -> FormatInfo {
    match format {
        SourceFormat::PmApp => FormatInfo {
            format,
            description: "taskdeck 原生格式",
            confidence: 1.0,
        },
        SourceFormat::Todoist => FormatInfo {
            format,
            description: "Todoist 导出文件",
            confidence: 0.9,
        },
        SourceFormat::Trello => FormatInfo {
            format,
            description: "Trello 看板导出文件",
            confidence: 0.8,
        },
        SourceFormat::Unknown => FormatInfo {
            format,
            description: "未知格式",
            confidence: 0.0,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
