/// Typed views of the game's journal lines and Status.json payload.
///
/// Journal files are JSON-lines; every line carries an `event` tag plus
/// free-form fields. Only the handful of events that affect the overlay
/// files are translated into [`JournalEvent`] — everything else parses to
/// `None` and is dropped by the caller. Missing or malformed fields never
/// produce an error; they leave the corresponding value unset.
use serde::Deserialize;
use serde_json::Value;

/// A journal occurrence the projector reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEvent {
    /// Arrived in (or reported position within) a star system.
    /// `body` is set only when the event names a non-station body;
    /// `station` only when the event reports the ship docked there.
    SystemChange {
        system: String,
        star_pos: Option<[f64; 3]>,
        body: Option<String>,
        station: Option<String>,
    },
    /// Docked at a station.
    Docked { station: String },
    /// Left a station.
    Undocked,
    /// Close to (or landed on) a planetary body.
    ApproachBody { body: String },
    /// No longer near a body.
    LeaveBody,
    /// Ship swapped, renamed, or loadout refreshed. `None` fields leave the
    /// current value untouched; `ship_name` of `Some("")` clears the custom name.
    ShipChange {
        ship_type: Option<String>,
        ship_name: Option<String>,
    },
}

/// Parses one journal line. Returns `None` for events the overlay does not
/// care about, and for lines that are not valid JSON objects.
pub fn parse_line(line: &str) -> Option<JournalEvent> {
    let entry: Value = serde_json::from_str(line.trim()).ok()?;
    let event = entry.get("event")?.as_str()?;

    match event {
        "FSDJump" | "Location" => {
            let system = str_field(&entry, "StarSystem")?;
            Some(JournalEvent::SystemChange {
                system,
                star_pos: star_pos(&entry),
                body: body_field(&entry),
                station: docked_station(&entry),
            })
        }
        "Docked" => {
            let station = str_field(&entry, "StationName")?;
            Some(JournalEvent::Docked { station })
        }
        "Undocked" => Some(JournalEvent::Undocked),
        "ApproachBody" | "Touchdown" => {
            let body = str_field(&entry, "Body")?;
            Some(JournalEvent::ApproachBody { body })
        }
        "LeaveBody" | "SupercruiseEntry" => Some(JournalEvent::LeaveBody),
        // Dropping out of supercruise next to a planet is effectively an
        // approach; next to a station (or deep space) it is a body exit.
        "SupercruiseExit" => match body_field(&entry) {
            Some(body) => Some(JournalEvent::ApproachBody { body }),
            None => Some(JournalEvent::LeaveBody),
        },
        "Loadout" => Some(JournalEvent::ShipChange {
            ship_type: str_field(&entry, "Ship"),
            // Loadout always carries ShipName; an empty one means "no custom name".
            ship_name: Some(raw_str_field(&entry, "ShipName").unwrap_or_default()),
        }),
        "SetUserShipName" => Some(JournalEvent::ShipChange {
            ship_type: str_field(&entry, "Ship"),
            ship_name: Some(raw_str_field(&entry, "UserShipName").unwrap_or_default()),
        }),
        "ShipyardSwap" | "ShipyardNew" => Some(JournalEvent::ShipChange {
            ship_type: str_field(&entry, "ShipType"),
            // A different hull; any previous custom name belongs to the old ship.
            ship_name: Some(String::new()),
        }),
        _ => None,
    }
}

/// Non-empty string field, or `None`.
fn str_field(entry: &Value, key: &str) -> Option<String> {
    raw_str_field(entry, key).filter(|s| !s.is_empty())
}

/// String field as-is (may be empty), or `None` when absent/not a string.
fn raw_str_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key)?.as_str().map(str::to_string)
}

/// `StarPos` as `[x, y, z]`, or `None` when absent or malformed.
fn star_pos(entry: &Value) -> Option<[f64; 3]> {
    let arr = entry.get("StarPos")?.as_array()?;
    match arr.as_slice() {
        [x, y, z] => Some([x.as_f64()?, y.as_f64()?, z.as_f64()?]),
        _ => None,
    }
}

/// `StationName` from a system-level event, but only while the ship is
/// actually docked there. A journal written after a game restart opens with
/// a `Location` line carrying `Docked` and `StationName` instead of a
/// `Docked` event, so this is the only docking signal a replay ever sees.
fn docked_station(entry: &Value) -> Option<String> {
    if entry.get("Docked").and_then(Value::as_bool) == Some(true) {
        str_field(entry, "StationName")
    } else {
        None
    }
}

/// `Body` from a system-level event. Stations show up as `BodyType: "Station"`
/// and must not populate the body file.
fn body_field(entry: &Value) -> Option<String> {
    match entry.get("BodyType").and_then(Value::as_str) {
        None | Some("Station") | Some("Null") => None,
        Some(_) => str_field(entry, "Body"),
    }
}

// ── Status.json ───────────────────────────────────────────────────────────────

/// Set in `Flags` while the game reports a planetary latitude/longitude.
pub const FLAG_HAS_LAT_LONG: u32 = 1 << 21;

/// The periodically rewritten Status.json snapshot. Only the fields the
/// overlay consumes are deserialized.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardStatus {
    #[serde(rename = "Flags", default)]
    pub flags: u32,
    #[serde(rename = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    pub longitude: Option<f64>,
}

impl DashboardStatus {
    /// Returns the surface position when the game says there is one.
    /// The lat/long flag gates the coordinates: the game can briefly leave
    /// stale numbers in the file after lift-off.
    pub fn position(&self) -> Option<(f64, f64)> {
        if self.flags & FLAG_HAS_LAT_LONG == 0 {
            return None;
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
