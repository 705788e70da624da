pub mod detect;
pub mod todoist;
pub mod trello;

pub use detect::{detect_format, format_info, FormatInfo, SourceFormat};
pub use todoist::convert_from_todoist;
pub use trello::convert_from_trello;

use serde_json::Value;

use crate::model::AppData;
use crate::ops::sanitize::sanitize_app_data;

/// Error type for conversion failures. Fatal to the conversion attempt;
/// there is no partial or degraded result.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("无法识别的文件格式，支持的格式: taskdeck、Todoist、Trello")]
    UnknownFormat,
    #[error("Todoist 数据缺少 {0} 数组")]
    TodoistMissingArray(&'static str),
    #[error("无效的 Trello 导出格式")]
    InvalidTrello,
}

/// A successful conversion: the canonical tree plus non-fatal warnings
/// about data the converter skipped or rearranged.
#[derive(Debug)]
pub struct Conversion {
    pub data: AppData,
    pub warnings: Vec<String>,
}

impl Conversion {
    fn clean(data: AppData) -> Self {
        Conversion {
            data,
            warnings: Vec::new(),
        }
    }
}

/// Detect the format of `raw` and convert it to canonical AppData.
///
/// Native input passes through; Todoist/Trello delegate to their
/// converters; anything else fails naming the supported formats. Callers
/// run the validator and sanitizer themselves afterward so they can show
/// a report and preview before committing (see `td import`).
pub fn convert_to_app_data(raw: &Value) -> Result<Conversion, ConvertError> {
    match detect_format(raw) {
        SourceFormat::PmApp => Ok(passthrough(raw)),
        SourceFormat::Todoist => convert_from_todoist(raw),
        SourceFormat::Trello => convert_from_trello(raw),
        SourceFormat::Unknown => Err(ConvertError::UnknownFormat),
    }
}

/// Native-format input is trusted as already canonical. A near-canonical
/// tree that fails strict deserialization is repaired by the sanitizer
/// instead of rejected, with a warning; importing native data never fails
/// at the conversion stage.
fn passthrough(raw: &Value) -> Conversion {
    match serde_json::from_value::<AppData>(raw.clone()) {
        Ok(data) => Conversion::clean(data),
        Err(_) => Conversion {
            data: sanitize_app_data(raw),
            warnings: vec!["原生数据不完整，已自动修复缺失字段".to_string()],
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_format_fails() {
        let err = convert_to_app_data(&json!({ "foo": 1 })).unwrap_err();
        assert!(err.to_string().contains("无法识别的文件格式"));
    }

    #[test]
    fn test_pmapp_passthrough_valid() {
        let data = AppData::default();
        let raw = serde_json::to_value(&data).unwrap();
        let conv = convert_to_app_data(&raw).unwrap();
        assert!(conv.warnings.is_empty());
        assert_eq!(conv.data.version, data.version);
    }

    #[test]
    fn test_pmapp_passthrough_repairs_partial() {
        // Detects as native (all four keys) but projects is malformed
        let raw = json!({
            "version": "1.0.0",
            "projects": [null, { "name": "救回来的项目" }],
            "settings": {},
            "metadata": {}
        });
        let conv = convert_to_app_data(&raw).unwrap();
        assert_eq!(conv.warnings.len(), 1);
        assert_eq!(conv.data.projects.len(), 1);
        assert_eq!(conv.data.projects[0].name, "救回来的项目");
    }

    #[test]
    fn test_delegates_to_todoist() {
        let raw = json!({ "projects": [], "items": [] });
        let conv = convert_to_app_data(&raw).unwrap();
        assert!(conv.data.projects.is_empty());
    }
}
