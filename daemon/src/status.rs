use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current operational state of the daemon.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    /// No journal file found; the overlay files keep their last values.
    Idle,
    /// A journal file is being tailed and the overlay files track the game.
    Live,
}

/// Runtime status written by the daemon to status.toml in the app data
/// directory, for external inspection (e.g. a tray tool or the user).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DaemonStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// Current operational state.
    pub state: DaemonState,
    /// Path of the journal file currently being tailed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_file: Option<String>,
    /// RFC 3339 timestamp of the most recent journal attach, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_at: Option<String>,
    /// Human-readable error message if the daemon encountered a non-fatal error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonStatus {
    /// Constructs the initial idle status on daemon startup.
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: DaemonState::Idle,
            journal_file: None,
            attached_at: None,
            error: None,
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Logs errors to stderr rather than panicking — a status write failure
/// must never take the daemon down.
pub fn write_status(path: &Path, status: &DaemonStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("[status] Failed to create directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("[status] Failed to write status file: {e}");
            }
        }
        Err(e) => eprintln!("[status] Failed to serialize status: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── DaemonStatus::new ─────────────────────────────────────────────────────

    #[test]
    fn new_starts_idle() {
        let s = DaemonStatus::new();
        assert_eq!(s.state, DaemonState::Idle);
        assert!(s.journal_file.is_none());
        assert!(s.attached_at.is_none());
        assert!(s.error.is_none());
    }

    #[test]
    fn new_version_matches_cargo_pkg() {
        let s = DaemonStatus::new();
        assert_eq!(s.version, env!("CARGO_PKG_VERSION"));
    }

    // ── DaemonState serialization ─────────────────────────────────────────────

    #[test]
    fn state_serializes_to_lowercase() {
        // TOML requires a root table, so verify the value via DaemonStatus.
        let mut s = DaemonStatus::new();
        let idle = toml::to_string_pretty(&s).unwrap();
        assert!(idle.contains("state = \"idle\""));

        s.state = DaemonState::Live;
        let live = toml::to_string_pretty(&s).unwrap();
        assert!(live.contains("state = \"live\""));
    }

    // ── write_status ──────────────────────────────────────────────────────────

    #[test]
    fn write_status_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("status.toml");
        write_status(&path, &DaemonStatus::new());
        assert!(path.exists());
    }

    #[test]
    fn write_status_content_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");

        let mut original = DaemonStatus::new();
        original.state = DaemonState::Live;
        original.journal_file = Some("Journal.2026-08-23T101010.01.log".to_string());

        write_status(&path, &original);

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: DaemonStatus = toml::from_str(&content).unwrap();
        assert_eq!(parsed.state, DaemonState::Live);
        assert_eq!(parsed.journal_file.as_deref(), Some("Journal.2026-08-23T101010.01.log"));
    }

    #[test]
    fn write_status_omits_none_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.toml");
        write_status(&path, &DaemonStatus::new());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("journal_file"));
        assert!(!content.contains("attached_at"));
        assert!(!content.contains("error"));
    }
}
