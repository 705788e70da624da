use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use serde_json::Value;

use crate::cli::commands::{
    AddArgs, BackupAction, BackupCmd, CheckArgs, Cli, Commands, DeleteArgs, DoneArgs, ExportArgs,
    ImportArgs, InitArgs, ListArgs, ProjectArgs, SearchArgs, SubArgs,
};
use crate::cli::output::{
    print_project, BackupListJson, ImportPreviewJson, ListJson, ProjectJson, SearchJson,
};
use crate::convert::{convert_to_app_data, detect_format, format_info};
use crate::io::backup::{create_backup, list_backups, prune_backups};
use crate::io::store::{data_file, discover_store, init_store, load_store, save_store};
use crate::ops::check::{validate_app_data, ValidateOptions};
use crate::ops::sanitize::sanitize_app_data;
use crate::ops::search::search_data;
use crate::ops::todo_ops::{
    add_project, add_subtask, add_todo, delete_project, delete_subtask, delete_todo, find_project,
    set_project_completed, set_subtask_completed, set_todo_completed, OpsError,
};

type HandlerResult = Result<(), Box<dyn Error>>;

/// Dispatch a parsed command line to its handler.
pub fn dispatch(cli: Cli) -> HandlerResult {
    let json = cli.json;
    let store_dir = cli.store_dir;
    match cli.command {
        Commands::Init(args) => cmd_init(args, json, &store_dir),
        Commands::List(args) => cmd_list(args, json, &store_dir),
        Commands::Project(args) => cmd_project(args, json, &store_dir),
        Commands::Add(args) => cmd_add(args, json, &store_dir),
        Commands::Sub(args) => cmd_sub(args, json, &store_dir),
        Commands::Done(args) => cmd_done(args, json, &store_dir),
        Commands::Delete(args) => cmd_delete(args, json, &store_dir),
        Commands::Search(args) => cmd_search(args, json, &store_dir),
        Commands::Check(args) => cmd_check(args, json, &store_dir),
        Commands::Import(args) => cmd_import(args, json, &store_dir),
        Commands::Export(args) => cmd_export(args, json, &store_dir),
        Commands::Backup(args) => cmd_backup(args, json, &store_dir),
    }
}

// ---------------------------------------------------------------------------
// Store resolution
// ---------------------------------------------------------------------------

/// The root an existing store lives under: `-C` names it directly,
/// otherwise walk up from the CWD.
fn resolve_root(store_dir: &Option<String>) -> Result<PathBuf, Box<dyn Error>> {
    match store_dir {
        Some(dir) => Ok(discover_store(&PathBuf::from(dir))?),
        None => Ok(discover_store(&env::current_dir()?)?),
    }
}

/// The root a new store should be created under.
fn init_root(store_dir: &Option<String>) -> Result<PathBuf, Box<dyn Error>> {
    match store_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(env::current_dir()?),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> HandlerResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn cmd_init(args: InitArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = init_root(store_dir)?;
    let path = init_store(&root, args.force)?;
    if json {
        print_json(&serde_json::json!({ "initialized": path }))
    } else {
        println!("Initialized taskdeck store at {}", path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let data = load_store(&root)?;

    let selected: Vec<&crate::model::Project> = match &args.project {
        Some(key) => {
            let project = find_project(&data, key)
                .ok_or_else(|| OpsError::ProjectNotFound(key.clone()))?;
            vec![project]
        }
        None => data
            .projects
            .iter()
            .filter(|p| args.all || data.settings.show_completed_projects || !p.is_completed)
            .collect(),
    };

    if json {
        let out = ListJson {
            projects: selected.iter().map(|p| ProjectJson::from(*p)).collect(),
            total_projects: data.metadata.total_projects,
            total_todos: data.metadata.total_todos,
        };
        return print_json(&out);
    }

    if selected.is_empty() {
        println!("No projects. Create one with `td project <name>`.");
        return Ok(());
    }
    for (i, project) in selected.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_project(project);
    }
    Ok(())
}

fn cmd_search(args: SearchArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    let matches = search_data(&mut data, &args.pattern)?;
    save_store(&root, &mut data)?;

    if json {
        return print_json(&SearchJson {
            pattern: args.pattern,
            matches,
        });
    }
    if matches.is_empty() {
        println!("No matches for `{}`", args.pattern);
        return Ok(());
    }
    for m in &matches {
        println!("{:?} {} ({}): {}", m.kind, m.id, m.project_name, m.text);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_project(args: ProjectArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    let id = add_project(&mut data, &args.name);
    if let Some(description) = args.description {
        if let Some(project) = data.projects.iter_mut().find(|p| p.id == id) {
            project.description = description;
        }
    }
    save_store(&root, &mut data)?;
    created(json, "project", &id, &args.name)
}

fn cmd_add(args: AddArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    let id = add_todo(&mut data, &args.project, &args.text)?;
    save_store(&root, &mut data)?;
    created(json, "todo", &id, &args.text)
}

fn cmd_sub(args: SubArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    let id = add_subtask(&mut data, &args.todo, &args.text)?;
    save_store(&root, &mut data)?;
    created(json, "subtask", &id, &args.text)
}

fn created(json: bool, kind: &str, id: &str, text: &str) -> HandlerResult {
    if json {
        print_json(&serde_json::json!({ "kind": kind, "id": id, "text": text }))
    } else {
        println!("Added {} `{}`", kind, id);
        Ok(())
    }
}

fn cmd_done(args: DoneArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    let completed = !args.undo;

    // IDs are prefixed by kind, so trying each in turn is unambiguous
    let kind = match set_todo_completed(&mut data, &args.id, completed) {
        Ok(()) => "todo",
        Err(OpsError::TodoNotFound(_)) => {
            match set_subtask_completed(&mut data, &args.id, completed) {
                Ok(()) => "subtask",
                Err(OpsError::SubtaskNotFound(_)) => {
                    set_project_completed(&mut data, &args.id, completed)
                        .map_err(|_| not_found(&args.id))?;
                    "project"
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(e) => return Err(e.into()),
    };

    save_store(&root, &mut data)?;
    if json {
        print_json(&serde_json::json!({ "kind": kind, "id": args.id, "completed": completed }))
    } else {
        let verb = if completed { "Completed" } else { "Reopened" };
        println!("{} {} `{}`", verb, kind, args.id);
        Ok(())
    }
}

fn cmd_delete(args: DeleteArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;

    let kind = match delete_todo(&mut data, &args.id) {
        Ok(()) => "todo",
        Err(OpsError::TodoNotFound(_)) => match delete_subtask(&mut data, &args.id) {
            Ok(()) => "subtask",
            Err(OpsError::SubtaskNotFound(_)) => {
                delete_project(&mut data, &args.id).map_err(|_| not_found(&args.id))?;
                "project"
            }
            Err(e) => return Err(e.into()),
        },
        Err(e) => return Err(e.into()),
    };

    save_store(&root, &mut data)?;
    if json {
        print_json(&serde_json::json!({ "kind": kind, "id": args.id, "deleted": true }))
    } else {
        println!("Deleted {} `{}`", kind, args.id);
        Ok(())
    }
}

fn not_found(id: &str) -> Box<dyn Error> {
    format!("no project, todo, or subtask with id `{}`", id).into()
}

// ---------------------------------------------------------------------------
// Check / import / export
// ---------------------------------------------------------------------------

fn cmd_check(args: CheckArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let path = match &args.file {
        Some(file) => PathBuf::from(file),
        None => data_file(&resolve_root(store_dir)?),
    };
    let text = fs::read_to_string(&path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| format!("could not parse {}: {}", path.display(), e))?;

    let opts = ValidateOptions {
        check_ids: !args.no_ids,
        allow_partial_data: false,
        strict_mode: args.strict,
    };
    let result = validate_app_data(&raw, &opts);

    if json {
        print_json(&result)?;
    } else {
        for e in &result.errors {
            println!("error: {}", e);
        }
        for w in &result.warnings {
            println!("warning: {}", w);
        }
        if result.valid && result.warnings.is_empty() {
            println!("{}: OK", path.display());
        }
    }

    if !result.valid {
        return Err(format!("{} error(s) found", result.errors.len()).into());
    }
    if args.strict && !result.warnings.is_empty() {
        return Err(format!("{} warning(s) found (strict mode)", result.warnings.len()).into());
    }
    Ok(())
}

fn cmd_import(args: ImportArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let raw: Value = serde_json::from_str(&text)
        .map_err(|e| format!("could not parse {}: {}", args.file, e))?;

    let info = format_info(detect_format(&raw));
    let conversion = convert_to_app_data(&raw)?;

    // Validate the converted tree so the preview can surface anything
    // the converter let through, then sanitize for the final commit.
    let canonical = serde_json::to_value(&conversion.data)?;
    let validation = validate_app_data(&canonical, &ValidateOptions::default());
    let mut imported = sanitize_app_data(&canonical);

    if !json {
        println!("Format: {} (confidence {:.1})", info.description, info.confidence);
        for w in &conversion.warnings {
            println!("warning: {}", w);
        }
        for e in &validation.errors {
            println!("error: {}", e);
        }
        for w in &validation.warnings {
            println!("warning: {}", w);
        }
    }

    // Replacing the store is destructive, so ask first unless --yes
    let committed = if args.dry_run {
        false
    } else {
        args.yes || confirm_import(imported.projects.len(), imported.todo_count())?
    };
    if committed {
        let mut current = load_store(&root)?;
        create_backup(&root, &mut current)?;
        imported.settings.last_backup_time = current.settings.last_backup_time;
        save_store(&root, &mut imported)?;
    }

    if json {
        return print_json(&ImportPreviewJson {
            format: info,
            projects: imported.projects.len(),
            todos: imported.todo_count(),
            warnings: conversion.warnings,
            validation,
            committed,
        });
    }

    if committed {
        println!(
            "Imported {} project(s), {} todo(s)",
            imported.projects.len(),
            imported.todo_count()
        );
    } else if args.dry_run {
        println!(
            "Would import {} project(s), {} todo(s)",
            imported.projects.len(),
            imported.todo_count()
        );
    } else {
        println!("Import cancelled.");
    }
    Ok(())
}

/// Prompt on stderr and read one line. Anything but an explicit yes
/// declines, including a closed stdin.
fn confirm_import(projects: usize, todos: usize) -> Result<bool, Box<dyn Error>> {
    eprint!(
        "Replace the current store with {} project(s), {} todo(s)? [y/N] ",
        projects, todos
    );
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn cmd_export(args: ExportArgs, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    let mut data = load_store(&root)?;
    data.recount();
    crate::io::store::write_data_file(&PathBuf::from(&args.file), &data)?;
    if json {
        print_json(&serde_json::json!({ "exported": args.file }))
    } else {
        println!("Exported store to {}", args.file);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

fn cmd_backup(args: BackupCmd, json: bool, store_dir: &Option<String>) -> HandlerResult {
    let root = resolve_root(store_dir)?;
    match args.action.unwrap_or(BackupAction::Create) {
        BackupAction::Create => {
            let mut data = load_store(&root)?;
            let path = create_backup(&root, &mut data)?;
            save_store(&root, &mut data)?;
            if json {
                print_json(&serde_json::json!({ "backup": path }))
            } else {
                println!("Wrote backup {}", path.display());
                Ok(())
            }
        }
        BackupAction::List => {
            let backups = list_backups(&root)?;
            let names: Vec<String> = backups
                .iter()
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
                .map(String::from)
                .collect();
            if json {
                print_json(&BackupListJson { backups: names })
            } else {
                if names.is_empty() {
                    println!("No backups.");
                }
                for name in &names {
                    println!("{}", name);
                }
                Ok(())
            }
        }
        BackupAction::Prune { keep } => {
            let removed = prune_backups(&root, keep)?;
            if json {
                print_json(&serde_json::json!({ "removed": removed, "kept": keep }))
            } else {
                println!("Removed {} backup(s)", removed);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_root_with_override() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();
        let dir = Some(tmp.path().to_str().unwrap().to_string());
        let root = resolve_root(&dir).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn test_resolve_root_missing_store() {
        let tmp = TempDir::new().unwrap();
        let dir = Some(tmp.path().to_str().unwrap().to_string());
        assert!(resolve_root(&dir).is_err());
    }
}
