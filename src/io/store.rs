use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::AppData;
use crate::ops::sanitize::sanitize_app_data;

/// Directory holding the store, discovered by walking up from the CWD.
pub const STORE_DIR: &str = "taskdeck";
/// The data file inside the store directory.
pub const DATA_FILE: &str = "data.json";

/// Error type for store I/O operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a taskdeck store: no taskdeck/data.json found (run `td init`)")]
    NotAStore,
    #[error("store already exists at {0}")]
    AlreadyExists(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize store: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Path of the data file under a store root.
pub fn data_file(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join(DATA_FILE)
}

/// Path of the backups directory under a store root.
pub fn backups_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR).join("backups")
}

/// Discover the store by walking up from the given directory, looking
/// for a `taskdeck/data.json`.
pub fn discover_store(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        if data_file(&current).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotAStore);
        }
    }
}

/// Create a fresh store at the given root. Fails if one already exists,
/// unless `force` is set.
pub fn init_store(root: &Path, force: bool) -> Result<PathBuf, StoreError> {
    let path = data_file(root);
    if path.exists() && !force {
        return Err(StoreError::AlreadyExists(path));
    }
    fs::create_dir_all(root.join(STORE_DIR))?;
    let mut data = AppData::default();
    save_store(root, &mut data)?;
    Ok(path)
}

/// Load the store. The load path always sanitizes, so a partial or
/// hand-edited data file degrades to a usable tree instead of failing
/// deserialization; only unreadable files and broken JSON are errors.
pub fn load_store(root: &Path) -> Result<AppData, StoreError> {
    let path = data_file(root);
    let text = fs::read_to_string(&path).map_err(|e| StoreError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    let raw: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| StoreError::ParseError { path, source: e })?;
    Ok(sanitize_app_data(&raw))
}

/// Save the store: recount aggregates, then write atomically.
pub fn save_store(root: &Path, data: &mut AppData) -> Result<(), StoreError> {
    data.recount();
    write_data_file(&data_file(root), data)
}

/// Serialize to pretty 2-space JSON and write via a temp file in the
/// same directory, so a crash mid-write never leaves a torn data file.
pub fn write_data_file(path: &Path, data: &AppData) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    // A bare filename has an empty parent; that means the current dir
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| StoreError::IoError(e.error))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::todo_ops::{add_project, add_todo};
    use tempfile::TempDir;

    #[test]
    fn test_init_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();

        let mut data = load_store(tmp.path()).unwrap();
        assert!(data.projects.is_empty());

        let p = add_project(&mut data, "Home");
        add_todo(&mut data, &p, "fix the door").unwrap();
        save_store(tmp.path(), &mut data).unwrap();

        let reloaded = load_store(tmp.path()).unwrap();
        assert_eq!(reloaded.projects.len(), 1);
        assert_eq!(reloaded.projects[0].name, "Home");
        assert_eq!(reloaded.projects[0].todos[0].text, "fix the door");
        assert_eq!(reloaded.metadata.total_todos, 1);
    }

    #[test]
    fn test_init_refuses_to_clobber() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();
        assert!(matches!(
            init_store(tmp.path(), false),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(init_store(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let found = discover_store(&nested).unwrap();
        assert_eq!(found, tmp.path());
    }

    #[test]
    fn test_discover_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_store(tmp.path()),
            Err(StoreError::NotAStore)
        ));
    }

    #[test]
    fn test_load_sanitizes_partial_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(STORE_DIR)).unwrap();
        fs::write(
            data_file(tmp.path()),
            r#"{ "projects": [ { "name": "rescued" } ] }"#,
        )
        .unwrap();

        let data = load_store(tmp.path()).unwrap();
        assert_eq!(data.projects.len(), 1);
        assert_eq!(data.projects[0].name, "rescued");
        assert_eq!(data.version, "1.0.0");
    }

    #[test]
    fn test_load_rejects_broken_json() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(STORE_DIR)).unwrap();
        fs::write(data_file(tmp.path()), "{ not json").unwrap();
        assert!(matches!(
            load_store(tmp.path()),
            Err(StoreError::ParseError { .. })
        ));
    }

    #[test]
    fn test_data_file_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();
        let text = fs::read_to_string(data_file(tmp.path())).unwrap();
        assert!(text.contains("\n  \"version\""));
    }
}
