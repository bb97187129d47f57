//! Persistence boundary for progression state.
//!
//! The engine never touches storage itself. Callers move a [`ProgressRecord`]
//! across this boundary at explicit points, through
//! [`ProgressionManager::save_to`](crate::state::ProgressionManager::save_to) and
//! [`ProgressionManager::restore_from`](crate::state::ProgressionManager::restore_from).

use crate::models::ProgressRecord;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name used by [`YamlProgressStore::in_dir`].
pub const PROGRESS_FILE_NAME: &str = "CodeXP Progress.yaml";

/// Storage for the persisted progression record.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressStore {
    /// Load the stored record, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<ProgressRecord>>;

    fn save(&self, record: &ProgressRecord) -> Result<()>;
}

/// Stores the record as a single YAML file.
#[derive(Debug, Clone)]
pub struct YamlProgressStore {
    path: Utf8PathBuf,
}

impl YamlProgressStore {
    pub fn new<P: AsRef<Utf8Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store `CodeXP Progress.yaml` inside `dir`.
    pub fn in_dir<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(PROGRESS_FILE_NAME))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ProgressStore for YamlProgressStore {
    fn load(&self) -> Result<Option<ProgressRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file_contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read progress file: {}", self.path))?;

        let record: ProgressRecord = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse progress file: {}", self.path))?;

        tracing::debug!("Loaded progress record v{} from {}", record.version, self.path);
        Ok(Some(record))
    }

    fn save(&self, record: &ProgressRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create progress directory: {}", parent))?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(record).context("Failed to serialize progress record to YAML")?;

        fs::write(&self.path, yaml_string)
            .with_context(|| format!("Failed to write progress file: {}", self.path))?;

        tracing::debug!("Saved progress record to {}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (YamlProgressStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (YamlProgressStore::in_dir(&dir), temp_dir)
    }

    #[test]
    fn test_missing_file_loads_none() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (store, _temp_dir) = create_test_store();

        let mut record = ProgressRecord::default();
        record.nickname = "ferris".to_string();
        record.total_xp = 1234;
        record.completed_challenge_ids = vec!["save-1".to_string()];

        store.save(&record).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, record);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().join("nested").join("data")).unwrap();
        let store = YamlProgressStore::in_dir(&dir);

        store.save(&ProgressRecord::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.path(), "total_xp: [not, a, number]").unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse progress file"));
    }
}
