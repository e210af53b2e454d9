use std::path::PathBuf;

use crate::config::Config;
use crate::journal::{DashboardStatus, JournalEvent};

pub enum DaemonEvent {
    /// A relevant journal line was appended to the tailed journal file.
    Journal(JournalEvent),
    /// Status.json was rewritten by the game.
    Dashboard(DashboardStatus),
    /// The tailer started following a (new) journal file.
    JournalAttached(PathBuf),
    /// No journal file is available in the configured directory anymore.
    JournalLost,
    /// The config file changed on disk and was successfully re-parsed.
    ConfigReloaded(Config),
    /// Ctrl+C received; the daemon should record final state and exit.
    Shutdown,
}
