//! Restart-state persistence.
//!
//! A versioned snapshot of every spindle's `(state, speed)` and current tool,
//! plus the active spindle name, saved with bincode. Restoring re-drives the
//! state machine but only rewrites tool bookkeeping; no tool changer or macro
//! is contacted.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use spindle_common::spindle::error::SpindleError;
use spindle_common::spindle::state::{SpindleSpeed, SpindleState, ToolNumber};
use tracing::{debug, info, warn};

/// Persisted state for one spindle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PersistedSpindleState {
    /// Spindle name (for matching on load)
    pub name: String,
    /// Last commanded state
    pub state: SpindleState,
    /// Last commanded speed
    pub speed: SpindleSpeed,
    /// Last committed tool
    pub current_tool: ToolNumber,
}

/// Persisted state for the whole spindle set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PersistedState {
    /// Version of state format
    pub version: u32,
    /// Name of the active spindle
    pub active: String,
    /// Spindle states
    pub spindles: Vec<PersistedSpindleState>,
    /// Timestamp of last save (Unix epoch seconds)
    pub saved_at: u64,
}

impl PersistedState {
    /// Current state format version.
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Self::default()
        }
    }

    /// Entry for the named spindle.
    pub fn spindle(&self, name: &str) -> Option<&PersistedSpindleState> {
        self.spindles.iter().find(|s| s.name == name)
    }

    /// One-line description of the active spindle for logs.
    pub fn summary(&self) -> String {
        match self.spindle(&self.active) {
            Some(s) => format!(
                "active '{}' {:?} at {} with tool {} ({} spindles)",
                s.name,
                s.state,
                s.speed,
                s.current_tool,
                self.spindles.len()
            ),
            None => format!(
                "active '{}' not recorded ({} spindles)",
                self.active,
                self.spindles.len()
            ),
        }
    }
}

/// State file manager.
#[derive(Debug, Clone)]
pub struct SpindleStatePersistence {
    path: PathBuf,
}

impl SpindleStatePersistence {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot, stamping `saved_at`.
    pub fn save(&self, state: &PersistedState) -> Result<(), SpindleError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| self.failure("create spindle state directory", e))?;
        }

        let mut snapshot = state.clone();
        snapshot.saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let file = File::create(&self.path).map_err(|e| self.failure("create", e))?;
        bincode::serialize_into(BufWriter::new(file), &snapshot)
            .map_err(|e| self.failure("encode", e))?;

        debug!("Spindle snapshot written: {}", snapshot.summary());
        Ok(())
    }

    /// Read the last snapshot. `None` when there is none or it was written
    /// by another format version.
    pub fn load(&self) -> Result<Option<PersistedState>, SpindleError> {
        if !self.path.exists() {
            debug!("No spindle snapshot at {:?}, spindles start Unknown", self.path);
            return Ok(None);
        }

        let file = File::open(&self.path).map_err(|e| self.failure("open", e))?;
        let snapshot: PersistedState = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| self.failure("decode", e))?;

        if snapshot.version != PersistedState::CURRENT_VERSION {
            warn!(
                "Ignoring spindle snapshot format v{} (expected v{}), spindles start Unknown",
                snapshot.version,
                PersistedState::CURRENT_VERSION
            );
            return Ok(None);
        }

        info!("Recovered spindle snapshot: {}", snapshot.summary());
        Ok(Some(snapshot))
    }

    /// Remove the snapshot so the next start is cold.
    pub fn delete(&self) -> Result<(), SpindleError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Discarded spindle snapshot {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.failure("remove", e)),
        }
    }

    fn failure(&self, action: &str, cause: impl std::fmt::Display) -> SpindleError {
        warn!("Cannot {} spindle snapshot {:?}: {}", action, self.path, cause);
        SpindleError::Persistence(format!(
            "cannot {} spindle snapshot {}: {}",
            action,
            self.path.display(),
            cause
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> PersistedState {
        PersistedState {
            version: PersistedState::CURRENT_VERSION,
            active: "router".to_string(),
            spindles: vec![PersistedSpindleState {
                name: "router".to_string(),
                state: SpindleState::Cw,
                speed: 500,
                current_tool: 7,
            }],
            saved_at: 0,
        }
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("spindle.bin");
        let persistence = SpindleStatePersistence::new(&path);

        persistence.save(&sample()).unwrap();
        assert!(path.exists());

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded.active, "router");
        assert_eq!(loaded.spindle("router"), sample().spindle("router"));
        assert!(loaded.saved_at > 0);

        persistence.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let persistence = SpindleStatePersistence::new(dir.path().join("none.bin"));
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_version_mismatch_starts_fresh() {
        let dir = tempdir().unwrap();
        let persistence = SpindleStatePersistence::new(dir.path().join("old.bin"));
        let mut state = sample();
        state.version = PersistedState::CURRENT_VERSION + 1;
        persistence.save(&state).unwrap();
        assert!(persistence.load().unwrap().is_none());
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, [0xffu8; 3]).unwrap();
        let err = SpindleStatePersistence::new(&path).load().unwrap_err();
        match err {
            SpindleError::Persistence(msg) => {
                assert!(msg.contains("decode"), "{msg}");
                assert!(msg.contains("garbage.bin"), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let persistence = SpindleStatePersistence::new(dir.path().join("never.bin"));
        persistence.delete().unwrap();
    }

    #[test]
    fn test_summary_names_active_spindle() {
        let state = sample();
        assert_eq!(state.summary(), "active 'router' Cw at 500 with tool 7 (1 spindles)");

        let mut orphan = sample();
        orphan.active = "laser".to_string();
        assert_eq!(orphan.summary(), "active 'laser' not recorded (1 spindles)");
    }
}
