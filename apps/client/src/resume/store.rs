//! File-backed key/value store holding the interview between runs.
//!
//! Every write re-reads the file, changes one key and atomically renames a
//! fresh copy into place, so two processes sharing the file never see a torn
//! write. The last completed write wins; each entry keeps its `updated_at`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::resume::fields::ResumeProfile;

pub const RESUME_DATA: &str = "resumeData";
pub const RESUME_SESSION_ID: &str = "resumeSessionId";
pub const RESUME_UPLOAD_ID: &str = "resumeUploadId";

const INTERVIEW_KEYS: [&str; 3] = [RESUME_DATA, RESUME_SESSION_ID, RESUME_UPLOAD_ID];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key).map(|v| v.value))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.read_for_update()?;
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                updated_at: Utc::now(),
            },
        );
        self.write_all(&entries)
    }

    pub fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.read_for_update()?;
        let before = entries.len();
        entries.retain(|k, _| !keys.contains(&k.as_str()));
        if entries.len() == before {
            return Ok(());
        }
        self.write_all(&entries)
    }

    /// Restored profile; a missing or unreadable value starts from empty.
    pub fn load_profile(&self) -> ResumeProfile {
        let raw = match self.get(RESUME_DATA) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ResumeProfile::default(),
            Err(e) => {
                warn!("Ignoring unreadable local store: {e}");
                return ResumeProfile::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring malformed {RESUME_DATA}: {e}");
            ResumeProfile::default()
        })
    }

    pub fn save_profile(&self, profile: &ResumeProfile) -> Result<(), StoreError> {
        self.set(RESUME_DATA, &serde_json::to_string(profile)?)
    }

    /// Wipes the profile and both correlation ids.
    pub fn clear_interview(&self) -> Result<(), StoreError> {
        self.remove(&INTERVIEW_KEYS)
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Writes replace a corrupt file instead of failing on it forever.
    fn read_for_update(&self) -> Result<BTreeMap<String, StoredValue>, StoreError> {
        match self.read_all() {
            Err(StoreError::Corrupt(e)) => {
                warn!(
                    "Discarding corrupt store file {}: {e}",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, StoredValue>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        let body = serde_json::to_vec_pretty(entries)?;
        tmp.write_all(&body).map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!("Wrote {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nested").join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let (_dir, store) = store();
        assert_eq!(store.get(RESUME_SESSION_ID).unwrap(), None);
        assert!(store.load_profile().is_empty());
    }

    #[test]
    fn test_set_then_get_survives_reopen() {
        let (_dir, store) = store();
        store.set(RESUME_SESSION_ID, "sess-9").unwrap();
        let reopened = LocalStore::new(store.path().to_path_buf());
        assert_eq!(reopened.get(RESUME_SESSION_ID).unwrap().as_deref(), Some("sess-9"));
    }

    #[test]
    fn test_profile_round_trips_through_store() {
        let (_dir, store) = store();
        let mut profile = ResumeProfile::default();
        profile.set("full_name", "Ada");
        profile.set("skills", "Rust, Go");
        store.save_profile(&profile).unwrap();
        assert_eq!(store.load_profile(), profile);
    }

    #[test]
    fn test_last_write_wins() {
        let (_dir, store) = store();
        let other = LocalStore::new(store.path().to_path_buf());
        store.set(RESUME_UPLOAD_ID, "1").unwrap();
        other.set(RESUME_UPLOAD_ID, "2").unwrap();
        assert_eq!(store.get(RESUME_UPLOAD_ID).unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_clear_interview_removes_only_interview_keys() {
        let (_dir, store) = store();
        store.set(RESUME_SESSION_ID, "s").unwrap();
        store.set(RESUME_UPLOAD_ID, "u").unwrap();
        store.set("theme", "dark").unwrap();
        store.clear_interview().unwrap();
        assert_eq!(store.get(RESUME_SESSION_ID).unwrap(), None);
        assert_eq!(store.get(RESUME_UPLOAD_ID).unwrap(), None);
        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_corrupt_file_is_reported_but_profile_load_recovers() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.get(RESUME_DATA), Err(StoreError::Corrupt(_))));
        assert!(store.load_profile().is_empty());
    }

    #[test]
    fn test_write_over_corrupt_file_starts_fresh() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        let mut profile = ResumeProfile::default();
        profile.set("full_name", "Ada");
        store.save_profile(&profile).unwrap();
        store.set(RESUME_SESSION_ID, "sess-2").unwrap();

        assert_eq!(store.load_profile(), profile);
        assert_eq!(store.get(RESUME_SESSION_ID).unwrap().as_deref(), Some("sess-2"));
    }
}
