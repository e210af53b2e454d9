use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::event::DaemonEvent;
use crate::paths;

/// Resolved at runtime by expanding %VAR% references.
#[cfg(windows)]
pub const DEFAULT_JOURNAL_DIR: &str =
    r"%USERPROFILE%\Saved Games\Frontier Developments\Elite Dangerous";
#[cfg(not(windows))]
pub const DEFAULT_JOURNAL_DIR: &str =
    "%HOME%/.local/share/Frontier Developments/Elite Dangerous";

#[cfg(windows)]
pub const DEFAULT_OUTPUT_DIR: &str = r"%USERPROFILE%\Documents\StreamSource";
#[cfg(not(windows))]
pub const DEFAULT_OUTPUT_DIR: &str = "%HOME%/.local/share/streamsource/overlay";

/// Root configuration structure. Deserialized from config.toml in the
/// app data directory.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
}

/// Daemon-wide settings.
#[derive(Debug, Deserialize)]
pub struct GlobalConfig {
    /// Directory receiving the overlay text files. %VAR% references are
    /// expanded at use.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// The game's journal directory (Journal.*.log and Status.json).
    #[serde(default = "default_journal_dir")]
    pub journal_dir: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            journal_dir: DEFAULT_JOURNAL_DIR.to_string(),
        }
    }
}

impl GlobalConfig {
    /// The output directory with environment references expanded.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(paths::expand_env(&self.output_dir))
    }

    /// The journal directory with environment references expanded.
    pub fn journal_dir(&self) -> PathBuf {
        PathBuf::from(paths::expand_env(&self.journal_dir))
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Spawns a file watcher on the parent directory of `path`.  Whenever the config
/// file is created or modified, reloads it and sends a `ConfigReloaded` event.
/// This is the "preferences changed" path: the event loop applies a changed
/// output directory to the projector and the journal tailer picks up a changed
/// journal directory on its next poll.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<DaemonEvent>) {
    // Watch the parent directory rather than the file itself: editors save
    // atomically (write-new + rename), which replaces the watched inode.
    let watch_dir = match path.parent() {
        Some(d) => d.to_path_buf(),
        None => {
            eprintln!("[config] Config path has no parent directory");
            return;
        }
    };

    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);
    let forward = move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = watch_tx.blocking_send(event);
        }
    };
    let mut watcher = match RecommendedWatcher::new(forward, NotifyConfig::default()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("[config] Failed to create file watcher: {e}");
            return;
        }
    };
    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        eprintln!("[config] Failed to watch config directory: {e}");
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        // Only writes that touch the config file itself are interesting;
        // the parent directory sees plenty of unrelated churn (status.toml
        // lives next door).
        if !matches!(event.kind, notify::EventKind::Create(_) | notify::EventKind::Modify(_)) {
            continue;
        }
        if !event.paths.iter().any(|p| p == path.as_path()) {
            continue;
        }

        match load_or_default(&path) {
            Ok(config) => {
                if tx.send(DaemonEvent::ConfigReloaded(config)).await.is_err() {
                    break;
                }
            }
            Err(e) => eprintln!("[config] Failed to reload config: {e}"),
        }
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn default_journal_dir() -> String {
    DEFAULT_JOURNAL_DIR.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn global_config_default_values() {
        let g = GlobalConfig::default();
        assert_eq!(g.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(g.journal_dir, DEFAULT_JOURNAL_DIR);
    }

    #[test]
    fn expanded_dirs_contain_no_env_references_when_vars_set() {
        // HOME (unix) / USERPROFILE (Windows) is set in any normal environment.
        let g = GlobalConfig::default();
        let expanded = g.journal_dir();
        assert!(!expanded.to_string_lossy().contains('%'), "{expanded:?}");
    }

    // ── load_or_default ───────────────────────────────────────────────────────

    #[test]
    fn load_or_default_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.global.journal_dir, DEFAULT_JOURNAL_DIR);
    }

    #[test]
    fn load_or_default_parses_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[global]
output_dir = "/tmp/overlay"
journal_dir = "/tmp/journal"
"#,
        )
        .unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.output_dir, "/tmp/overlay");
        assert_eq!(config.global.journal_dir, "/tmp/journal");
    }

    #[test]
    fn load_or_default_partial_toml_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        // Only override one field; the other should get its default.
        std::fs::write(&path, "[global]\noutput_dir = \"/tmp/overlay\"\n").unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.output_dir, "/tmp/overlay");
        assert_eq!(config.global.journal_dir, DEFAULT_JOURNAL_DIR);
    }

    #[test]
    fn load_or_default_empty_file_uses_all_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.output_dir, DEFAULT_OUTPUT_DIR);
    }

    #[test]
    fn load_or_default_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml ][[[").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
