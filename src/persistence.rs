//! Saved editing sessions.
//!
//! A session record is a JSON checkpoint of the user's progress on one
//! file. Records expire after a time-to-live; unknown or missing fields are
//! tolerated so that older records still load.

use crate::catalog::Side;
use crate::constants::SESSION_TTL_HOURS;
use crate::export::ExportFormat;
use crate::store::JointPositions;
use crate::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Workflow stages the user has completed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSteps {
    pub load: bool,
    pub check: bool,
    pub body_rig: bool,
    pub hand_rig: bool,
    pub check_actor: bool,
    pub motions: bool,
}

/// Persisted progress for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub file_name: String,
    pub file_size: u64,
    pub completed_steps: WorkflowSteps,
    pub joint_positions: JointPositions,
    pub symmetry: bool,
    pub using_real_bones: bool,
    pub active_hand: Side,
    pub left_hand_positions: JointPositions,
    pub right_hand_positions: JointPositions,
    pub export_format: ExportFormat,
    /// Milliseconds since the Unix epoch
    pub saved_at: u64,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            file_size: 0,
            completed_steps: WorkflowSteps::default(),
            joint_positions: JointPositions::new(),
            symmetry: true,
            using_real_bones: false,
            active_hand: Side::Left,
            left_hand_positions: JointPositions::new(),
            right_hand_positions: JointPositions::new(),
            export_format: ExportFormat::default(),
            saved_at: 0,
        }
    }
}

impl SessionRecord {
    /// True when the record is older than `ttl` at time `now_ms`
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        now_ms.saturating_sub(self.saved_at) > ttl_ms
    }
}

/// JSON file holding at most one session record
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    ttl: Duration,
}

impl SessionStore {
    /// Store at `path` with the default time-to-live
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_ttl(path, Duration::from_secs(SESSION_TTL_HOURS * 3600))
    }

    pub fn with_ttl<P: AsRef<Path>>(path: P, ttl: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Write `record` stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written
    pub fn save(&self, record: &SessionRecord) -> Result<()> {
        self.save_at(record, now_millis())
    }

    /// Write `record` stamped with `now_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written
    pub fn save_at(&self, record: &SessionRecord, now_ms: u64) -> Result<()> {
        let stamped = SessionRecord {
            saved_at: now_ms,
            ..record.clone()
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&stamped)?;
        std::fs::write(&self.path, json)?;
        debug!("Saved session for {} to {}", stamped.file_name, self.path.display());
        Ok(())
    }

    /// Load the saved record, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or removed
    pub fn load(&self) -> Result<Option<SessionRecord>> {
        self.load_at(now_millis())
    }

    /// Load the saved record as of `now_ms`. Expired records are deleted and
    /// an unreadable record is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or removed
    pub fn load_at(&self, now_ms: u64) -> Result<Option<SessionRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let record: SessionRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding unreadable session {}: {}", self.path.display(), e);
                return Ok(None);
            }
        };
        if record.is_expired(now_ms, self.ttl) {
            info!("Saved session for {} expired, clearing", record.file_name);
            self.clear()?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Delete the saved record
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rig_forge_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_partial_record_is_tolerated() {
        let record: SessionRecord = serde_json::from_str(r#"{"file_name":"hero.glb"}"#).unwrap();
        assert_eq!(record.file_name, "hero.glb");
        assert!(record.symmetry);
        assert_eq!(record.active_hand, Side::Left);
        assert!(record.joint_positions.is_empty());
    }

    #[test]
    fn test_expiry() {
        let record = SessionRecord {
            saved_at: 1_000,
            ..SessionRecord::default()
        };
        let ttl = Duration::from_secs(10);
        assert!(!record.is_expired(11_000, ttl));
        assert!(record.is_expired(11_001, ttl));
    }

    #[test]
    fn test_save_load_clear() {
        let path = temp_path("save_load");
        let store = SessionStore::new(&path);
        let mut record = SessionRecord {
            file_name: "hero.glb".to_string(),
            file_size: 2048,
            ..SessionRecord::default()
        };
        record.joint_positions.set("hips", Point3::new(0.0, 1.0, 0.0));
        record.completed_steps.load = true;

        store.save_at(&record, 5_000).unwrap();
        let loaded = store.load_at(6_000).unwrap().unwrap();
        assert_eq!(loaded.saved_at, 5_000);
        assert_eq!(loaded.joint_positions, record.joint_positions);
        assert!(loaded.completed_steps.load);

        store.clear().unwrap();
        assert!(store.load_at(6_000).unwrap().is_none());
    }

    #[test]
    fn test_expired_record_is_removed() {
        let path = temp_path("expired");
        let store = SessionStore::with_ttl(&path, Duration::from_secs(1));
        store.save_at(&SessionRecord::default(), 0).unwrap();
        assert!(store.load_at(5_000).unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_record_is_discarded() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{ not json").unwrap();
        let store = SessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
