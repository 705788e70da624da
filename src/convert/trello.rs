use serde_json::Value;

use crate::convert::{Conversion, ConvertError};
use crate::model::{AppData, Project, Subtask, Todo};
use crate::util::json::{get_f64, get_str, id_string, truthy};

/// Convert a Trello board export into canonical AppData.
///
/// Every non-closed list becomes a project; its open cards, sorted by
/// `pos`, become todos; checklist items across all of a card's checklists
/// become subtasks. Lists with no open cards are skipped with a warning.
///
/// A list is considered "done" when its name contains "done" or "完成"
/// (case-insensitively). Trello has no board-level completion concept for
/// lists, so this naming convention is the only available signal; it is a
/// heuristic, not a structural fact.
pub fn convert_from_trello(raw: &Value) -> Result<Conversion, ConvertError> {
    let mut warnings = Vec::new();
    let board = resolve_board(raw, &mut warnings)?;

    let empty: Vec<Value> = Vec::new();
    let lists = board.get("lists").and_then(Value::as_array).unwrap_or(&empty);
    let cards = board.get("cards").and_then(Value::as_array).unwrap_or(&empty);
    let board_checklists = board.get("checklists").and_then(Value::as_array);

    let mut projects: Vec<Project> = Vec::new();

    for (lidx, list) in lists.iter().enumerate() {
        if truthy(list.get("closed")) {
            continue;
        }
        let list_id = id_string(list.get("id")).unwrap_or_else(|| format!("list-{lidx}"));
        let list_name = get_str(list, "name").unwrap_or("未命名列表").to_string();

        // Open cards belonging to this list, in pos order
        let mut list_cards: Vec<&Value> = cards
            .iter()
            .filter(|c| !truthy(c.get("closed")))
            .filter(|c| id_string(c.get("idList")).as_deref() == Some(list_id.as_str()))
            .collect();
        list_cards.sort_by(|a, b| {
            let pa = get_f64(a, "pos").unwrap_or(0.0);
            let pb = get_f64(b, "pos").unwrap_or(0.0);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        });

        // Empty lists produce no project, not an empty one
        if list_cards.is_empty() {
            warnings.push(format!("跳过空列表: {list_name}"));
            continue;
        }

        let project_id = format!("project-{list_id}");
        let mut todos: Vec<Todo> = Vec::new();

        for (i, card) in list_cards.iter().enumerate() {
            let card_id =
                id_string(card.get("id")).unwrap_or_else(|| format!("{list_id}-{i}"));
            let mut todo = Todo::new(
                format!("todo-{card_id}"),
                project_id.clone(),
                get_str(card, "name").unwrap_or("").to_string(),
                i as i64,
            );
            todo.is_completed = truthy(card.get("dueComplete"));
            todo.subtasks = card_subtasks(card, &card_id, board_checklists, &todo.id);
            todos.push(todo);
        }

        let done_name = {
            let lower = list_name.to_lowercase();
            lower.contains("done") || lower.contains("完成")
        };

        let mut project = Project::new(project_id, list_name, projects.len() as i64);
        project.is_completed = done_name;
        project.todos = todos;
        projects.push(project);
    }

    if projects.is_empty() {
        warnings.push("未找到可导入的内容".to_string());
    }

    let mut data = AppData {
        projects,
        ..Default::default()
    };
    data.recount();

    Ok(Conversion { data, warnings })
}

/// Accept either a single board object or an array of boards (first wins,
/// with a warning naming how many were found).
fn resolve_board<'a>(
    raw: &'a Value,
    warnings: &mut Vec<String>,
) -> Result<&'a Value, ConvertError> {
    match raw {
        Value::Object(obj) if obj.get("name").is_some_and(Value::is_string) => Ok(raw),
        Value::Array(boards) => {
            let first = boards
                .first()
                .filter(|b| b.get("name").is_some_and(Value::is_string))
                .ok_or(ConvertError::InvalidTrello)?;
            if boards.len() > 1 {
                let name = get_str(first, "name").unwrap_or("");
                warnings.push(format!(
                    "检测到 {} 个看板，仅导入第一个: {name}",
                    boards.len()
                ));
            }
            Ok(first)
        }
        _ => Err(ConvertError::InvalidTrello),
    }
}

/// Flatten every checklist item across all checklists attached to a card.
/// Checklists may be embedded on the card or held at the board level and
/// linked back by `idCard`.
fn card_subtasks(
    card: &Value,
    card_id: &str,
    board_checklists: Option<&Vec<Value>>,
    todo_id: &str,
) -> Vec<Subtask> {
    let mut subtasks = Vec::new();

    let embedded = card.get("checklists").and_then(Value::as_array);
    let linked: Vec<&Value> = match embedded {
        Some(lists) => lists.iter().collect(),
        None => board_checklists
            .map(|lists| {
                lists
                    .iter()
                    .filter(|cl| {
                        id_string(cl.get("idCard")).as_deref() == Some(card_id)
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };

    for checklist in linked {
        let Some(items) = checklist.get("checkItems").and_then(Value::as_array) else {
            continue;
        };
        let mut items: Vec<&Value> = items.iter().collect();
        items.sort_by(|a, b| {
            let pa = get_f64(a, "pos").unwrap_or(0.0);
            let pb = get_f64(b, "pos").unwrap_or(0.0);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        });

        for item in items {
            let rank = subtasks.len();
            let item_id =
                id_string(item.get("id")).unwrap_or_else(|| format!("{card_id}-{rank}"));
            let mut sub = Subtask::new(
                format!("subtask-{item_id}"),
                todo_id.to_string(),
                get_str(item, "name").unwrap_or("").to_string(),
                rank as i64,
            );
            sub.is_completed = get_str(item, "state") == Some("complete");
            subtasks.push(sub);
        }
    }

    subtasks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
