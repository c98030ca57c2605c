//! Gesto Engine - polyphonic voice and modulation engine
//!
//! Turns discrete note/control events into continuously-automated audio
//! parameter timelines: voice lifecycle, the dual-oscillator/filter/envelope
//! topology per voice, the modulation-routing matrix, pitch-bend and glide,
//! sustain hold-release bookkeeping, the arpeggiator, and the gesture
//! bridge.
//!
//! # Core Components
//!
//! ## Engine
//!
//! [`Engine`] owns the note→voice map and implements allocation (poly and
//! mono), sustain, pitch bend, global-parameter broadcast, and deterministic
//! scheduled teardown:
//!
//! ```rust
//! use gesto_engine::{Engine, SynthSettings};
//!
//! let settings = SynthSettings::default();
//! let mut engine = Engine::new(48000.0, settings.clone());
//!
//! engine.note_on("C4", &settings, 0.4, 0.5);
//! engine.note_on("E4", &settings, 0.4, 0.5);
//!
//! let mut block = vec![0.0_f32; 512];
//! engine.render(&mut block);
//!
//! engine.note_off("C4", &settings, false);
//! ```
//!
//! ## Modulation
//!
//! [`ModRoute`] triples route LFO/envelope sources into voice parameters
//! (wired once at voice creation) and gesture channels into the settings
//! snapshot (re-evaluated every gesture tick):
//!
//! - [`ModSource`] / [`ModDest`] - source and destination identifiers
//! - [`SlideTarget`] - per-note key-slide expression target
//! - [`GestureState`] - two-hand reading consumed by the gesture bridge
//!
//! ## Settings & Presets
//!
//! - [`SynthSettings`] - the immutable-per-tick snapshot the engine consumes
//! - [`PatchCategory`] - oscillator pairing / detune voicing table
//! - [`preset`] - TOML load/save plus embedded factory presets

mod arp;

pub mod engine;
pub mod error;
pub mod gesture;
pub mod preset;
pub mod routes;
pub mod settings;
pub mod voice;

// Re-export main types at crate root
pub use engine::{DEFAULT_SLIDE, DEFAULT_VELOCITY, Engine, WAVEFORM_LEN};
pub use error::PresetError;
pub use gesture::{GestureState, HandPose, apply_gesture_routes};
pub use preset::{
    FACTORY_PRESET_NAMES, Preset, factory_preset, factory_presets, load_preset, preset_to_toml,
    save_preset,
};
pub use routes::{ModDest, ModRoute, ModSource, SlideTarget};
pub use settings::{CategoryVoicing, PatchCategory, SynthSettings};
pub use voice::{Voice, bend_ratio};
