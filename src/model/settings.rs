use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum entries kept in the search history (most recent first).
pub const SEARCH_HISTORY_MAX: usize = 20;

/// UI color scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    /// Parse a theme name; anything but the three valid values is rejected.
    pub fn parse_theme(s: &str) -> Option<Theme> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "auto" => Some(Theme::Auto),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }
}

/// Which projects the list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Connection settings for AI report generation. Carried as data only;
/// the network client lives outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiReportConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f64,
}

/// User preference bag persisted inside the store. No relational
/// invariants; every field has a usable default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_true")]
    pub auto_save: bool,
    #[serde(default = "default_true")]
    pub show_completed_projects: bool,
    #[serde(default)]
    pub backup_enabled: bool,
    #[serde(default = "default_backup_interval")]
    pub backup_interval_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup_time: Option<DateTime<Utc>>,
    /// IDs of projects collapsed in the list view
    #[serde(default)]
    pub collapsed_projects: Vec<String>,
    /// Most recent first, capped at SEARCH_HISTORY_MAX
    #[serde(default)]
    pub search_history: Vec<String>,
    #[serde(default)]
    pub status_filter: StatusFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_report: Option<AiReportConfig>,
}

fn default_true() -> bool {
    true
}

fn default_backup_interval() -> u32 {
    60
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            theme: Theme::Auto,
            auto_save: true,
            show_completed_projects: true,
            backup_enabled: false,
            backup_interval_minutes: default_backup_interval(),
            last_backup_time: None,
            collapsed_projects: Vec::new(),
            search_history: Vec::new(),
            status_filter: StatusFilter::All,
            ai_report: None,
        }
    }
}

impl AppSettings {
    /// Record a search term: dedupe, push to front, cap the list.
    pub fn push_search(&mut self, term: &str) {
        self.search_history.retain(|t| t != term);
        self.search_history.insert(0, term.to_string());
        self.search_history.truncate(SEARCH_HISTORY_MAX);
    }
}
