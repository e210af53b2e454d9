/// Journal tailer: polls the configured journal directory, follows the
/// newest `Journal.*.log`, and forwards parsed events to the main loop.
///
/// The game appends JSON lines to the journal and atomically rewrites
/// `Status.json` about once a second, so a short polling interval is both
/// simple and sufficient — no file-watch subscription survives the game's
/// rename-heavy write pattern reliably anyway.
///
/// When a journal file is first attached it is read from the beginning:
/// replaying the current session's lines reconstructs the present status
/// before live tailing takes over.
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};

use crate::config::Config;
use crate::event::DaemonEvent;
use crate::journal::{self, DashboardStatus};

const POLL_INTERVAL_MS: u64 = 500;
const STATUS_JSON: &str = "Status.json";

/// Polls the journal directory every [`POLL_INTERVAL_MS`] and emits
/// [`DaemonEvent`]s for new journal lines and Status.json rewrites.
/// Re-reads the directory from the shared config on every tick, so a
/// config change takes effect on the next poll.
pub async fn run(config: Arc<RwLock<Config>>, tx: mpsc::Sender<DaemonEvent>) {
    let mut ticker = interval(Duration::from_millis(POLL_INTERVAL_MS));
    // Currently tailed journal file and the byte offset of the next read.
    let mut tail: Option<(PathBuf, u64)> = None;
    let mut status_modified: Option<SystemTime> = None;

    loop {
        ticker.tick().await;

        let journal_dir = config.read().await.global.journal_dir();

        match latest_journal(&journal_dir) {
            Some(path) => {
                let already_attached = matches!(&tail, Some((p, _)) if *p == path);
                if !already_attached {
                    eprintln!("[watcher] Tailing journal {}", path.display());
                    tail = Some((path.clone(), 0));
                    if tx.send(DaemonEvent::JournalAttached(path)).await.is_err() {
                        return;
                    }
                }
                if let Some((path, offset)) = tail.as_mut() {
                    match read_new_lines(path, *offset) {
                        Ok((lines, new_offset)) => {
                            *offset = new_offset;
                            for line in lines {
                                if let Some(evt) = journal::parse_line(&line) {
                                    if tx.send(DaemonEvent::Journal(evt)).await.is_err() {
                                        return;
                                    }
                                }
                            }
                        }
                        Err(e) => eprintln!("[watcher] Failed to read {}: {e}", path.display()),
                    }
                }
            }
            None => {
                if tail.take().is_some() {
                    eprintln!("[watcher] No journal file in {}", journal_dir.display());
                    if tx.send(DaemonEvent::JournalLost).await.is_err() {
                        return;
                    }
                }
            }
        }

        // Status.json is rewritten whole; forward it whenever its mtime moves.
        let status_path = journal_dir.join(STATUS_JSON);
        if let Ok(modified) = std::fs::metadata(&status_path).and_then(|m| m.modified()) {
            if status_modified != Some(modified) {
                status_modified = Some(modified);
                match read_dashboard(&status_path) {
                    Ok(Some(payload)) => {
                        if tx.send(DaemonEvent::Dashboard(payload)).await.is_err() {
                            return;
                        }
                    }
                    // Empty file: the game truncates before rewriting.
                    Ok(None) => {}
                    Err(e) => eprintln!("[watcher] Failed to read {}: {e}", status_path.display()),
                }
            }
        }
    }
}

/// Returns the most recent `Journal.*.log` in `dir`, preferring modification
/// time and falling back to the (chronologically sortable) filename on ties.
pub fn latest_journal(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with("Journal.") && name.ends_with(".log")
        })
        .max_by_key(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, e.file_name())
        })
        .map(|e| e.path())
}

/// Reads complete lines appended to `path` since `offset`. Returns the
/// lines and the offset to resume from. A trailing partial line (no `\n`
/// yet) is left for the next read. If the file shrank below `offset` it is
/// re-read from the start.
pub fn read_new_lines(path: &Path, offset: u64) -> std::io::Result<(Vec<String>, u64)> {
    let mut file = std::fs::File::open(path)?;
    let len = file.metadata()?.len();
    let start = if len < offset { 0 } else { offset };

    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    // Only consume up to the last complete line.
    let consumed = match buf.iter().rposition(|&b| b == b'\n') {
        Some(pos) => pos + 1,
        None => return Ok((Vec::new(), start)),
    };
    let lines = String::from_utf8_lossy(&buf[..consumed])
        .lines()
        .map(str::to_string)
        .collect();
    Ok((lines, start + consumed as u64))
}

fn read_dashboard(path: &Path) -> anyhow::Result<Option<DashboardStatus>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── latest_journal ────────────────────────────────────────────────────────

    #[test]
    fn latest_journal_ignores_non_journal_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Status.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.log"), "").unwrap();
        assert_eq!(latest_journal(dir.path()), None);

        std::fs::write(dir.path().join("Journal.2026-08-23T101010.01.log"), "").unwrap();
        assert_eq!(
            latest_journal(dir.path()),
            Some(dir.path().join("Journal.2026-08-23T101010.01.log"))
        );
    }

    #[test]
    fn latest_journal_prefers_newest_file() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("Journal.2026-08-23T101010.01.log");
        let new = dir.path().join("Journal.2026-08-23T112233.01.log");
        std::fs::write(&old, "").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        std::fs::write(&new, "").unwrap();
        assert_eq!(latest_journal(dir.path()), Some(new));
    }

    #[test]
    fn latest_journal_missing_dir_is_none() {
        assert_eq!(latest_journal(Path::new("/no/such/dir/anywhere")), None);
    }

    // ── read_new_lines ────────────────────────────────────────────────────────

    #[test]
    fn read_new_lines_returns_appended_lines_and_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.log");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let (lines, offset) = read_new_lines(&path, 0).unwrap();
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(offset, 8);

        // Nothing new yet.
        let (lines, offset) = read_new_lines(&path, offset).unwrap();
        assert!(lines.is_empty());
        assert_eq!(offset, 8);

        // Append and read only the new line.
        let mut content = std::fs::read(&path).unwrap();
        content.extend_from_slice(b"three\n");
        std::fs::write(&path, content).unwrap();
        let (lines, offset) = read_new_lines(&path, offset).unwrap();
        assert_eq!(lines, vec!["three"]);
        assert_eq!(offset, 14);
    }

    #[test]
    fn read_new_lines_holds_back_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.log");
        std::fs::write(&path, "complete\npart").unwrap();

        let (lines, offset) = read_new_lines(&path, 0).unwrap();
        assert_eq!(lines, vec!["complete"]);
        assert_eq!(offset, 9);

        // The partial line is delivered once its newline arrives.
        std::fs::write(&path, "complete\npartial\n").unwrap();
        let (lines, offset) = read_new_lines(&path, offset).unwrap();
        assert_eq!(lines, vec!["partial"]);
        assert_eq!(offset, 17);
    }

    #[test]
    fn read_new_lines_restarts_after_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Journal.log");
        std::fs::write(&path, "a much longer first generation\n").unwrap();
        let (_, offset) = read_new_lines(&path, 0).unwrap();

        std::fs::write(&path, "short\n").unwrap();
        let (lines, offset) = read_new_lines(&path, offset).unwrap();
        assert_eq!(lines, vec!["short"]);
        assert_eq!(offset, 6);
    }
}
