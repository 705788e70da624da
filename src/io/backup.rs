use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::io::store::{backups_dir, write_data_file, StoreError};
use crate::model::AppData;

/// Write a timestamped backup of the store and record the backup time
/// in the settings. The caller is responsible for saving the store
/// afterward so the recorded time persists.
pub fn create_backup(root: &Path, data: &mut AppData) -> Result<PathBuf, StoreError> {
    let now = Utc::now();
    let name = format!("backup-{}.json", now.format("%Y%m%d-%H%M%S"));
    let path = backups_dir(root).join(name);
    write_data_file(&path, data)?;
    data.settings.last_backup_time = Some(now);
    Ok(path)
}

/// List backup files, newest first. The timestamped naming makes
/// lexical order chronological.
pub fn list_backups(root: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let dir = backups_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut backups: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("backup-") && n.ends_with(".json"))
        })
        .collect();
    backups.sort();
    backups.reverse();
    Ok(backups)
}

/// Delete all but the newest `keep` backups. Returns how many were
/// removed.
pub fn prune_backups(root: &Path, keep: usize) -> Result<usize, StoreError> {
    let backups = list_backups(root)?;
    let mut removed = 0;
    for old in backups.iter().skip(keep) {
        fs::remove_file(old)?;
        removed += 1;
    }
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::init_store;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_list_backup() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();
        let mut data = AppData::default();

        assert!(data.settings.last_backup_time.is_none());
        let path = create_backup(tmp.path(), &mut data).unwrap();
        assert!(path.exists());
        assert!(data.settings.last_backup_time.is_some());

        let backups = list_backups(tmp.path()).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0], path);
    }

    #[test]
    fn test_list_empty_without_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(list_backups(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_prune_keeps_newest() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path(), false).unwrap();

        // Fake names so the timestamps differ deterministically
        let dir = backups_dir(tmp.path());
        fs::create_dir_all(&dir).unwrap();
        for day in 1..=4 {
            fs::write(
                dir.join(format!("backup-2025010{day}-000000.json")),
                "{}",
            )
            .unwrap();
        }

        let removed = prune_backups(tmp.path(), 2).unwrap();
        assert_eq!(removed, 2);
        let left = list_backups(tmp.path()).unwrap();
        assert_eq!(left.len(), 2);
        assert!(left[0]
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .contains("20250104"));
    }
}
