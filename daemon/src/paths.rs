/// Canonical file paths for StreamSource data files.
///
/// Both files live under the app data directory
/// (%APPDATA%\StreamSource on Windows, $XDG_CONFIG_HOME/streamsource elsewhere):
///   - config.toml  Edited by the user, read by the daemon.
///   - status.toml  Written by the daemon for external inspection.
use std::path::PathBuf;

#[cfg(windows)]
const APP_DIR_NAME: &str = "StreamSource";
#[cfg(not(windows))]
const APP_DIR_NAME: &str = "streamsource";

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the StreamSource application data directory.
pub fn app_data_dir() -> PathBuf {
    #[cfg(windows)]
    {
        let appdata = std::env::var("APPDATA").expect("APPDATA environment variable not set");
        PathBuf::from(appdata).join(APP_DIR_NAME)
    }
    #[cfg(not(windows))]
    {
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").expect("HOME environment variable not set");
                PathBuf::from(home).join(".config")
            });
        base.join(APP_DIR_NAME)
    }
}

/// Returns the full path to the config file under [`app_data_dir`].
pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

/// Returns the full path to the status file under [`app_data_dir`].
pub fn status_file_path() -> PathBuf {
    app_data_dir().join(STATUS_FILE_NAME)
}

/// Expands `%VAR%`-style environment variable references embedded in
/// user-supplied paths (config values are typically written Windows-style).
pub fn expand_env(s: &str) -> String {
    let mut result = s.to_string();
    for var in &["USERPROFILE", "APPDATA", "LOCALAPPDATA", "HOME", "TEMP", "TMP"] {
        if let Ok(val) = std::env::var(var) {
            result = result.replace(&format!("%{var}%"), &val);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_path_has_correct_name() {
        let path = config_file_path();
        assert_eq!(path.file_name().unwrap(), CONFIG_FILE_NAME);
    }

    #[test]
    fn status_file_path_has_correct_name() {
        let path = status_file_path();
        assert_eq!(path.file_name().unwrap(), STATUS_FILE_NAME);
    }

    #[test]
    fn config_and_status_share_same_parent_dir() {
        let config = config_file_path();
        let status = status_file_path();
        assert_eq!(config.parent(), status.parent());
    }

    #[test]
    fn expand_env_replaces_known_variable() {
        // HOME is set on unix; USERPROFILE on Windows. Use whichever exists.
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(expand_env("%HOME%/overlay"), format!("{home}/overlay"));
        } else if let Ok(profile) = std::env::var("USERPROFILE") {
            assert_eq!(expand_env(r"%USERPROFILE%\overlay"), format!(r"{profile}\overlay"));
        }
    }

    #[test]
    fn expand_env_leaves_unknown_variable_alone() {
        assert_eq!(expand_env("%NO_SUCH_VAR_EVER%/x"), "%NO_SUCH_VAR_EVER%/x");
    }
}
