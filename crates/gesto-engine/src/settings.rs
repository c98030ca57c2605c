//! Synth settings snapshot and patch category voicing.
//!
//! [`SynthSettings`] is the immutable-per-tick snapshot the control surface
//! hands to the engine. The engine never mutates a caller's snapshot; the
//! gesture bridge produces a new snapshot and feeds it back through
//! [`crate::Engine::apply_global_params`].

use gesto_core::Waveform;
use serde::{Deserialize, Serialize};

use crate::routes::{ModRoute, SlideTarget};

/// Patch categories selecting the oscillator pairing and detune preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatchCategory {
    /// Bright cutting lead: saw + square, slightly detuned.
    #[default]
    Lead,
    /// Soft wide pad: sine + saw.
    Pad,
    /// Sub-heavy bass: square + saw an octave down.
    Bass,
    /// Piano-ish keys: sine + sine an octave up.
    Keys,
    /// Ensemble strings: saw + saw.
    Strings,
}

/// Oscillator pairing and detune preset for a patch category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryVoicing {
    /// Primary oscillator waveform.
    pub osc1: Waveform,
    /// Secondary oscillator waveform.
    pub osc2: Waveform,
    /// Fixed detune offset applied to the secondary oscillator, in cents.
    pub detune_cents: f32,
}

impl PatchCategory {
    /// Voicing table, looked up once at voice creation.
    pub fn voicing(self) -> CategoryVoicing {
        match self {
            PatchCategory::Lead => CategoryVoicing {
                osc1: Waveform::Saw,
                osc2: Waveform::Square,
                detune_cents: 12.0,
            },
            PatchCategory::Pad => CategoryVoicing {
                osc1: Waveform::Sine,
                osc2: Waveform::Saw,
                detune_cents: 7.0,
            },
            PatchCategory::Bass => CategoryVoicing {
                osc1: Waveform::Square,
                osc2: Waveform::Saw,
                detune_cents: -1200.0,
            },
            PatchCategory::Keys => CategoryVoicing {
                osc1: Waveform::Sine,
                osc2: Waveform::Sine,
                detune_cents: 1200.0,
            },
            PatchCategory::Strings => CategoryVoicing {
                osc1: Waveform::Saw,
                osc2: Waveform::Saw,
                detune_cents: 5.0,
            },
        }
    }
}

/// Settings snapshot consumed by the engine.
///
/// `resonance` is the control-surface value; voices scale it ×8 into filter
/// Q. `glide` of 0 disables portamento. `pitch_bend` is authoritative only
/// through [`crate::Engine::set_pitch_bend`] / global-parameter application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthSettings {
    /// Patch category (oscillator pairing + detune preset).
    pub category: PatchCategory,
    /// Filter cutoff in Hz.
    pub cutoff: f32,
    /// Filter resonance, control-surface scale (×8 internally).
    pub resonance: f32,
    /// Amplitude attack in seconds.
    pub attack: f32,
    /// Amplitude release in seconds.
    pub release: f32,
    /// User detune added to the category's osc2 offset, in cents.
    pub detune: f32,
    /// Voice LFO rate in Hz.
    pub lfo_rate: f32,
    /// Portamento time in seconds; 0 disables.
    pub glide: f32,
    /// Octave shift applied to incoming note names.
    pub octave: i32,
    /// Pitch-bend scalar in [-1, 1].
    pub pitch_bend: f32,
    /// Single-voice allocation policy.
    pub mono: bool,
    /// Sustain-pedal hold flag.
    pub sustain: bool,
    /// Destination for the per-note key-slide source.
    pub key_slide_target: SlideTarget,
    /// Reverb mix 0..1 (gesture-writable).
    pub reverb_mix: f32,
    /// Delay feedback 0..0.9 (gesture-writable).
    pub delay_feedback: f32,
    /// Whether the arpeggiator is engaged.
    pub arp_enabled: bool,
    /// Arpeggiator rate in beats per minute.
    pub arp_rate: f32,
    /// Modulation route list. Kept last so TOML documents serialize the
    /// array-of-tables after the scalar fields.
    pub mod_routes: Vec<ModRoute>,
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            category: PatchCategory::Lead,
            cutoff: 2000.0,
            resonance: 1.0,
            attack: 0.01,
            release: 0.3,
            detune: 0.0,
            lfo_rate: 5.0,
            glide: 0.0,
            octave: 0,
            pitch_bend: 0.0,
            mono: false,
            sustain: false,
            key_slide_target: SlideTarget::Cutoff,
            reverb_mix: 0.3,
            delay_feedback: 0.25,
            arp_enabled: false,
            arp_rate: 120.0,
            mod_routes: Vec::new(),
        }
    }
}
