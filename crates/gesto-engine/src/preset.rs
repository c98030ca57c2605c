//! Preset storage: named settings snapshots as TOML documents.
//!
//! Factory presets are embedded at compile time and always available, one
//! per patch category. User presets round-trip through
//! [`load_preset`]/[`save_preset`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PresetError;
use crate::settings::SynthSettings;

/// A named, describable settings snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Display name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// The settings snapshot itself.
    pub settings: SynthSettings,
}

/// Factory preset names, in menu order.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "glass_lead",
    "slow_pad",
    "room_bass",
    "tine_keys",
    "section_strings",
];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("glass_lead", GLASS_LEAD),
    ("slow_pad", SLOW_PAD),
    ("room_bass", ROOM_BASS),
    ("tine_keys", TINE_KEYS),
    ("section_strings", SECTION_STRINGS),
];

const GLASS_LEAD: &str = r#"
name = "Glass Lead"
description = "Bright cutting lead with LFO shimmer on the filter"

[settings]
category = "Lead"
cutoff = 2600.0
resonance = 1.2
attack = 0.005
release = 0.25
lfo_rate = 6.0
key_slide_target = "Cutoff"

[[settings.mod_routes]]
source = "Lfo"
destination = "Cutoff"
amount = 0.35
"#;

const SLOW_PAD: &str = r#"
name = "Slow Pad"
description = "Wide slow pad, envelope opens the filter"

[settings]
category = "Pad"
cutoff = 1200.0
resonance = 0.8
attack = 0.8
release = 1.5
lfo_rate = 0.6
reverb_mix = 0.55
key_slide_target = "Resonance"

[[settings.mod_routes]]
source = "Env"
destination = "Cutoff"
amount = 0.5

[[settings.mod_routes]]
source = "Lfo"
destination = "Gain"
amount = 0.15
"#;

const ROOM_BASS: &str = r#"
name = "Room Bass"
description = "Sub-heavy mono bass with short glide"

[settings]
category = "Bass"
cutoff = 700.0
resonance = 1.6
attack = 0.008
release = 0.18
glide = 0.06
mono = true
key_slide_target = "Cutoff"
"#;

const TINE_KEYS: &str = r#"
name = "Tine Keys"
description = "Plain keys, slide adds vibrato"

[settings]
category = "Keys"
cutoff = 3200.0
resonance = 0.7
attack = 0.004
release = 0.4
lfo_rate = 5.5
key_slide_target = "Vibrato"
"#;

const SECTION_STRINGS: &str = r#"
name = "Section Strings"
description = "Detuned saws with gesture control over cutoff and reverb"

[settings]
category = "Strings"
cutoff = 1800.0
resonance = 0.9
attack = 0.4
release = 0.9
lfo_rate = 4.5
reverb_mix = 0.5
key_slide_target = "Cutoff"

[[settings.mod_routes]]
source = "RightHandY"
destination = "Cutoff"
amount = 0.8

[[settings.mod_routes]]
source = "HandDistance"
destination = "Reverb"
amount = 1.0
"#;

/// Look up a factory preset by name.
pub fn factory_preset(name: &str) -> Result<Preset, PresetError> {
    let (_, text) = FACTORY_PRESETS_TOML
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| PresetError::PresetNotFound(name.to_string()))?;
    Ok(toml::from_str(text)?)
}

/// All factory presets, in menu order.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESET_NAMES
        .iter()
        .filter_map(|name| factory_preset(name).ok())
        .collect()
}

/// Load a preset from a TOML file.
pub fn load_preset(path: impl AsRef<Path>) -> Result<Preset, PresetError> {
    let path = path.as_ref();
    let text =
        std::fs::read_to_string(path).map_err(|e| PresetError::read_file(path, e))?;
    Ok(toml::from_str(&text)?)
}

/// Save a preset to a TOML file.
pub fn save_preset(path: impl AsRef<Path>, preset: &Preset) -> Result<(), PresetError> {
    let path = path.as_ref();
    let text = preset_to_toml(preset)?;
    std::fs::write(path, text).map_err(|e| PresetError::write_file(path, e))
}

/// Serialize a preset to its TOML document form.
pub fn preset_to_toml(preset: &Preset) -> Result<String, PresetError> {
    Ok(toml::to_string_pretty(preset)?)
}
