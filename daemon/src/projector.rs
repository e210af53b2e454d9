/// The status projector: folds journal and dashboard events into a small
/// status record and mirrors each field into its own text file for the
/// overlay software to display.
///
/// Every output file holds exactly the current value followed by one `\n`
/// and is fully rewritten when the value changes. Writes are diffed against
/// the last value actually written, so an event storm that does not change
/// a field costs no I/O for it. A failed write is logged and retried
/// naturally the next time the field changes; it never blocks other fields.
use std::path::{Path, PathBuf};

use crate::ships;

/// One output field and its fixed filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    System,
    StarPos,
    Station,
    Body,
    LatLon,
    StationOrBody,
    StationOrBodyOrSystem,
    ShipType,
    ShipName,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::System,
        Field::StarPos,
        Field::Station,
        Field::Body,
        Field::LatLon,
        Field::StationOrBody,
        Field::StationOrBodyOrSystem,
        Field::ShipType,
        Field::ShipName,
    ];

    /// Filename under the output directory. Names are deliberately
    /// human-readable since users point their overlay sources at them.
    pub fn file_name(self) -> &'static str {
        match self {
            Field::System => "System.txt",
            Field::StarPos => "StarPos.txt",
            Field::Station => "Station.txt",
            Field::Body => "Body.txt",
            Field::LatLon => "LatLon.txt",
            Field::StationOrBody => "Station or Body.txt",
            Field::StationOrBodyOrSystem => "Station or Body or System.txt",
            Field::ShipType => "ShipType.txt",
            Field::ShipName => "ShipName.txt",
        }
    }
}

/// Current known status. Every field is either unset (renders as the empty
/// string) or a complete value; there are no partial states.
#[derive(Debug, Default, Clone)]
struct StatusState {
    system: Option<String>,
    star_pos: Option<[f64; 3]>,
    station: Option<String>,
    body: Option<String>,
    latlon: Option<(f64, f64)>,
    /// Internal ship key as reported by the journal (e.g. "sidewinder").
    ship_type: Option<String>,
    /// Player-assigned ship name; unset when the ship has none.
    ship_name: Option<String>,
}

/// Owns the status record, the output directory, and the per-field record
/// of what was last written to disk.
pub struct Projector {
    state: StatusState,
    outdir: PathBuf,
    written: [Option<String>; 9],
}

impl Projector {
    /// Creates the projector, ensures the output directory exists, and
    /// writes a placeholder (empty value) to every output file so the
    /// overlay sources resolve immediately.
    ///
    /// Directory-creation failure is logged and non-fatal: individual
    /// writes will keep failing (and keep being logged) until the user
    /// fixes the path or changes it in the config.
    pub fn new(outdir: PathBuf) -> Self {
        ensure_output_dir(&outdir);
        let mut projector = Self {
            state: StatusState::default(),
            outdir,
            written: Default::default(),
        };
        projector.sync();
        projector
    }

    pub fn output_dir(&self) -> &Path {
        &self.outdir
    }

    // ── Event handlers (one per event kind) ───────────────────────────────────

    /// FSDJump / Location: new system and galactic coordinates. `body` and
    /// `station` are whatever the event itself reports: a fresh journal's
    /// `Location` line names the station the ship is docked at, while a
    /// jump clears both (the ship cannot stay docked through a jump).
    pub fn on_system_change(
        &mut self,
        system: String,
        star_pos: Option<[f64; 3]>,
        body: Option<String>,
        station: Option<String>,
    ) {
        self.state.system = non_empty(system);
        if star_pos.is_some() {
            self.state.star_pos = star_pos;
        }
        self.state.body = body.and_then(non_empty);
        self.state.station = station.and_then(non_empty);
        self.sync();
    }

    /// Docked: inside a station, so any body/surface context is stale.
    pub fn on_docked(&mut self, station: String) {
        self.state.station = non_empty(station);
        self.state.body = None;
        self.state.latlon = None;
        self.sync();
    }

    pub fn on_undocked(&mut self) {
        self.state.station = None;
        self.sync();
    }

    /// ApproachBody / Touchdown.
    pub fn on_approach_body(&mut self, body: String) {
        self.state.body = non_empty(body);
        self.sync();
    }

    /// LeaveBody / SupercruiseEntry: surface coordinates are meaningless
    /// once the body is gone, so they are cleared together.
    pub fn on_leave_body(&mut self) {
        self.state.body = None;
        self.state.latlon = None;
        self.sync();
    }

    /// Loadout / SetUserShipName / ShipyardSwap. A `None` field leaves the
    /// current value untouched; `ship_name` of `Some("")` clears the custom
    /// name so the display falls back to the ship type.
    pub fn on_ship_change(&mut self, ship_type: Option<String>, ship_name: Option<String>) {
        if let Some(t) = ship_type {
            self.state.ship_type = non_empty(t);
        }
        if let Some(n) = ship_name {
            self.state.ship_name = non_empty(n);
        }
        self.sync();
    }

    /// Dashboard: latest surface position, or `None` when the game no
    /// longer reports one.
    pub fn on_position(&mut self, position: Option<(f64, f64)>) {
        self.state.latlon = position;
        self.sync();
    }

    /// Preferences changed: when the output directory differs, recreate the
    /// files in the new location with all current values. The old files are
    /// left behind untouched.
    pub fn on_output_dir_change(&mut self, new_outdir: PathBuf) {
        if new_outdir == self.outdir {
            return;
        }
        eprintln!("[projector] Output directory changed to {}", new_outdir.display());
        self.outdir = new_outdir;
        ensure_output_dir(&self.outdir);
        // Nothing has been written to the new location yet.
        self.written = Default::default();
        self.sync();
    }

    // ── Rendering and diff-and-write ──────────────────────────────────────────

    /// Renders the current display string for `field`. Unset fields render
    /// as the empty string; composites apply the station > body > system
    /// fallback order.
    fn render(&self, field: Field) -> String {
        let s = &self.state;
        match field {
            Field::System => s.system.clone().unwrap_or_default(),
            Field::StarPos => s
                .star_pos
                .map(|[x, y, z]| format!("{x:.5} {y:.5} {z:.5}"))
                .unwrap_or_default(),
            Field::Station => s.station.clone().unwrap_or_default(),
            Field::Body => s.body.clone().unwrap_or_default(),
            Field::LatLon => s
                .latlon
                .map(|(lat, lon)| format!("{lat:.6} {lon:.6}"))
                .unwrap_or_default(),
            Field::StationOrBody => s
                .station
                .clone()
                .or_else(|| s.body.clone())
                .unwrap_or_default(),
            Field::StationOrBodyOrSystem => s
                .station
                .clone()
                .or_else(|| s.body.clone())
                .or_else(|| s.system.clone())
                .unwrap_or_default(),
            Field::ShipType => s
                .ship_type
                .as_deref()
                .map(ships::display_name)
                .unwrap_or_default(),
            Field::ShipName => match &s.ship_name {
                Some(name) => name.clone(),
                None => self.render(Field::ShipType),
            },
        }
    }

    /// Writes every field whose rendered value differs from the last value
    /// actually written. The last-written record is only updated on a
    /// successful write, so a field that failed to write is attempted again
    /// on the next sync.
    fn sync(&mut self) {
        for (i, field) in Field::ALL.into_iter().enumerate() {
            let value = self.render(field);
            if self.written[i].as_deref() == Some(value.as_str()) {
                continue;
            }
            if self.write_field(field, &value) {
                self.written[i] = Some(value);
            }
        }
    }

    /// Fully rewrites one output file with `value` + newline. Returns false
    /// (after logging) on failure; a single bad file never stops the rest.
    fn write_field(&self, field: Field, value: &str) -> bool {
        let path = self.outdir.join(field.file_name());
        match std::fs::write(&path, format!("{value}\n")) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[projector] Failed to write {}: {e}", path.display());
                false
            }
        }
    }
}

fn ensure_output_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("[projector] Failed to create output directory {}: {e}", dir.display());
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
