mod config;
mod event;
mod journal;
mod paths;
mod projector;
mod ships;
mod status;
mod watcher;

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::event::DaemonEvent;
use crate::journal::JournalEvent;

#[tokio::main]
async fn main() {
    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        eprintln!("Failed to create app data directory {}: {e}", app_dir.display());
        std::process::exit(1);
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let initial_config = config::load_or_default(&config_path).unwrap_or_else(|e| {
        eprintln!("[config] Error (using defaults): {e}");
        config::Config::default()
    });
    let output_dir = initial_config.global.output_dir();
    let shared_config = Arc::new(RwLock::new(initial_config));

    // ── Initial status ────────────────────────────────────────────────────────
    let status_path = paths::status_file_path();
    let mut current_status = status::DaemonStatus::new();
    status::write_status(&status_path, &current_status);

    // ── Projector (writes the placeholder files immediately) ──────────────────
    let mut projector = projector::Projector::new(output_dir);

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(64);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, event_tx.clone()));
    tokio::spawn(watcher::run(Arc::clone(&shared_config), event_tx.clone()));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }

    println!("streamsource-daemon v{} started", env!("CARGO_PKG_VERSION"));
    println!("Writing overlay files to {}", projector.output_dir().display());

    // ── Event loop ────────────────────────────────────────────────────────────
    // All projector calls happen here, one at a time; the projector itself
    // is synchronous and performs its short file writes inline.
    while let Some(evt) = event_rx.recv().await {
        match evt {
            DaemonEvent::Journal(journal_evt) => match journal_evt {
                JournalEvent::SystemChange { system, star_pos, body, station } => {
                    projector.on_system_change(system, star_pos, body, station)
                }
                JournalEvent::Docked { station } => projector.on_docked(station),
                JournalEvent::Undocked => projector.on_undocked(),
                JournalEvent::ApproachBody { body } => projector.on_approach_body(body),
                JournalEvent::LeaveBody => projector.on_leave_body(),
                JournalEvent::ShipChange { ship_type, ship_name } => {
                    projector.on_ship_change(ship_type, ship_name)
                }
            },

            DaemonEvent::Dashboard(payload) => projector.on_position(payload.position()),

            DaemonEvent::JournalAttached(path) => {
                current_status.state = status::DaemonState::Live;
                current_status.journal_file = Some(path.to_string_lossy().into_owned());
                current_status.attached_at = Some(chrono::Local::now().to_rfc3339());
                current_status.error = None;
                status::write_status(&status_path, &current_status);
            }

            DaemonEvent::JournalLost => {
                current_status.state = status::DaemonState::Idle;
                current_status.journal_file = None;
                status::write_status(&status_path, &current_status);
            }

            DaemonEvent::ConfigReloaded(new_config) => {
                println!("Config reloaded");
                projector.on_output_dir_change(new_config.global.output_dir());
                *shared_config.write().await = new_config;
            }

            DaemonEvent::Shutdown => {
                println!("Shutting down");
                current_status.state = status::DaemonState::Idle;
                current_status.journal_file = None;
                status::write_status(&status_path, &current_status);
                break;
            }
        }
    }
}
