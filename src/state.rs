//! Persisted run state.
//!
//! A single JSON record per library holding the highest library version
//! seen so far. The version is recorded for a future incremental sync; the
//! fetch stage does not read it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::LibraryRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    #[serde(default)]
    pub last_version: i64,
}

impl RunState {
    /// Raise `last_version` to `reported` if it is higher.
    pub fn observe_version(&mut self, reported: Option<i64>) {
        if let Some(v) = reported {
            self.last_version = self.last_version.max(v);
        }
    }
}

/// `state_groups_12345.json` in the working directory.
pub fn default_state_path(library: &LibraryRef) -> PathBuf {
    PathBuf::from(format!(
        "state_{}_{}.json",
        library.kind.path_segment(),
        library.id
    ))
}

/// Read the state file; a missing file is a fresh state.
pub fn load_state(path: &Path) -> Result<RunState> {
    if !path.exists() {
        return Ok(RunState::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file: {}", path.display()))
}

pub fn save_state(path: &Path, state: &RunState) -> Result<()> {
    let json = serde_json::to_string(state)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write state file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LibraryKind;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_fresh_state() {
        let tmp = TempDir::new().unwrap();
        let state = load_state(&tmp.path().join("none.json")).unwrap();
        assert_eq!(state.last_version, 0);
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        save_state(&path, &RunState { last_version: 4321 }).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{"last_version":4321}"#
        );
        assert_eq!(load_state(&path).unwrap().last_version, 4321);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_state(&path).is_err());
    }

    #[test]
    fn version_only_moves_forward() {
        let mut state = RunState { last_version: 50 };
        state.observe_version(Some(40));
        assert_eq!(state.last_version, 50);
        state.observe_version(None);
        assert_eq!(state.last_version, 50);
        state.observe_version(Some(75));
        assert_eq!(state.last_version, 75);
    }

    #[test]
    fn path_per_library() {
        let lib = LibraryRef::new(LibraryKind::Group, "12345");
        assert_eq!(
            default_state_path(&lib),
            PathBuf::from("state_groups_12345.json")
        );
    }
}
