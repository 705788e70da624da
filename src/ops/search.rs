use regex::RegexBuilder;
use serde::Serialize;

use crate::model::AppData;

/// What a search hit was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Project,
    Todo,
    Subtask,
}

/// A single search hit, with enough context to display it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub kind: MatchKind,
    /// ID of the matched entity itself
    pub id: String,
    pub project_name: String,
    pub text: String,
}

/// Case-insensitive regex search across project names, todo text, and
/// subtask text. A successful search is recorded in the settings'
/// search history (most recent first, capped).
pub fn search_data(
    data: &mut AppData,
    pattern: &str,
) -> Result<Vec<SearchMatch>, regex::Error> {
    let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;

    let mut matches = Vec::new();
    for project in &data.projects {
        if re.is_match(&project.name) {
            matches.push(SearchMatch {
                kind: MatchKind::Project,
                id: project.id.clone(),
                project_name: project.name.clone(),
                text: project.name.clone(),
            });
        }
        for todo in &project.todos {
            if re.is_match(&todo.text) {
                matches.push(SearchMatch {
                    kind: MatchKind::Todo,
                    id: todo.id.clone(),
                    project_name: project.name.clone(),
                    text: todo.text.clone(),
                });
            }
            for sub in &todo.subtasks {
                if re.is_match(&sub.text) {
                    matches.push(SearchMatch {
                        kind: MatchKind::Subtask,
                        id: sub.id.clone(),
                        project_name: project.name.clone(),
                        text: sub.text.clone(),
                    });
                }
            }
        }
    }

    data.settings.push_search(pattern);
    Ok(matches)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
