/// Display names for the game's internal ship type keys.
///
/// Journal events carry lowercase internal identifiers ("cobramkiii",
/// "federation_corvette"); overlays want the in-game marketing names.
/// Unknown keys pass through unchanged so new ships degrade gracefully.

/// Returns the human-readable display name for an internal ship key.
/// Lookup is case-insensitive (the journal is inconsistent about casing).
pub fn display_name(key: &str) -> String {
    let normalized = key.to_lowercase();
    match normalized.as_str() {
        "adder" => "Adder",
        "anaconda" => "Anaconda",
        "asp" => "Asp Explorer",
        "asp_scout" => "Asp Scout",
        "belugaliner" => "Beluga Liner",
        "cobramkiii" => "Cobra Mk III",
        "cobramkiv" => "Cobra Mk IV",
        "cutter" => "Imperial Cutter",
        "diamondback" => "Diamondback Scout",
        "diamondbackxl" => "Diamondback Explorer",
        "dolphin" => "Dolphin",
        "eagle" => "Eagle",
        "empire_courier" => "Imperial Courier",
        "empire_eagle" => "Imperial Eagle",
        "empire_trader" => "Imperial Clipper",
        "federation_corvette" => "Federal Corvette",
        "federation_dropship" => "Federal Dropship",
        "federation_dropship_mkii" => "Federal Assault Ship",
        "federation_gunship" => "Federal Gunship",
        "ferdelance" => "Fer-de-Lance",
        "hauler" => "Hauler",
        "independant_trader" => "Keelback",
        "krait_light" => "Krait Phantom",
        "krait_mkii" => "Krait Mk II",
        "mamba" => "Mamba",
        "orca" => "Orca",
        "python" => "Python",
        "sidewinder" => "Sidewinder",
        "type6" => "Type-6 Transporter",
        "type7" => "Type-7 Transporter",
        "type9" => "Type-9 Heavy",
        "type9_military" => "Type-10 Defender",
        "typex" => "Alliance Chieftain",
        "typex_2" => "Alliance Crusader",
        "typex_3" => "Alliance Challenger",
        "viper" => "Viper Mk III",
        "viper_mkiv" => "Viper Mk IV",
        "vulture" => "Vulture",
        _ => return key.to_string(),
    }
    .to_string()
}
