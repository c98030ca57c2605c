//! Modulation route model.
//!
//! A route is a `(source, destination, amount)` triple. LFO- and
//! envelope-sourced routes are wired into a voice's signal graph once at
//! voice creation with a fixed per-connection gain; gesture-sourced routes
//! never touch the voice graph and are instead folded into the settings
//! snapshot on every gesture tick (see [`crate::gesture`]).

use serde::{Deserialize, Serialize};

/// Modulation source identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModSource {
    /// Per-voice low-frequency oscillator.
    Lfo,
    /// Amplitude envelope's 0..1 ramp.
    Env,
    /// Left hand horizontal position (0..1).
    LeftHandX,
    /// Left hand vertical position (0..1).
    LeftHandY,
    /// Right hand horizontal position (0..1).
    RightHandX,
    /// Right hand vertical position (0..1).
    RightHandY,
    /// Normalized distance between the two hands (0..1).
    HandDistance,
}

impl ModSource {
    /// Whether this source is a gesture channel (settings-level, never wired
    /// into a voice).
    pub fn is_gesture(self) -> bool {
        !matches!(self, ModSource::Lfo | ModSource::Env)
    }
}

/// Modulation destination identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModDest {
    /// Filter cutoff frequency.
    Cutoff,
    /// Filter resonance (Q).
    Resonance,
    /// Oscillator pitch.
    Pitch,
    /// Voice amplitude.
    Gain,
    /// Reverb mix (gesture-writable settings field only).
    Reverb,
    /// Delay feedback (gesture-writable settings field only).
    Delay,
}

impl ModDest {
    /// Per-destination scale for voice-wired (LFO/ENV) connections, in the
    /// destination's native units: Hz for cutoff, Q for resonance, cents for
    /// pitch, linear gain for amplitude.
    ///
    /// `None` for destinations that cannot be wired into a voice graph.
    pub fn connection_scale(self) -> Option<f32> {
        match self {
            ModDest::Cutoff => Some(6000.0),
            ModDest::Resonance => Some(15.0),
            ModDest::Pitch => Some(800.0),
            ModDest::Gain => Some(0.5),
            ModDest::Reverb | ModDest::Delay => None,
        }
    }
}

/// Per-note expression target for the key-slide source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlideTarget {
    /// Slide sweeps filter cutoff.
    #[default]
    Cutoff,
    /// Slide sweeps filter resonance.
    Resonance,
    /// Slide bends oscillator pitch.
    Pitch,
    /// Slide speeds up the voice LFO.
    Vibrato,
}

impl SlideTarget {
    /// Key-slide connection scale, in the target's native units
    /// (vibrato is Hz added to the LFO rate).
    pub fn scale(self) -> f32 {
        match self {
            SlideTarget::Cutoff => 12000.0,
            SlideTarget::Resonance => 30.0,
            SlideTarget::Pitch => 2400.0,
            SlideTarget::Vibrato => 20.0,
        }
    }
}

/// A single modulation route.
///
/// Amount 0 is observably identical to the route being absent. The editor
/// enforces at most one route per `(source, destination)` pair but the model
/// does not; gesture evaluation applies routes in list order, so the last
/// route to a destination wins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModRoute {
    /// Source of modulation.
    pub source: ModSource,
    /// Destination parameter.
    pub destination: ModDest,
    /// Modulation amount (-1.0 to 1.0, negative inverts).
    pub amount: f32,
}

impl ModRoute {
    /// Create a route with the amount clamped to [-1, 1].
    pub fn new(source: ModSource, destination: ModDest, amount: f32) -> Self {
        Self {
            source,
            destination,
            amount: amount.clamp(-1.0, 1.0),
        }
    }

    /// Fixed gain for a voice-wired connection: destination scale × amount.
    ///
    /// `None` for gesture routes, zero amounts, and unwireable destinations —
    /// no connection is created for those.
    pub fn connection_gain(&self) -> Option<f32> {
        if self.source.is_gesture() || self.amount == 0.0 {
            return None;
        }
        self.destination
            .connection_scale()
            .map(|scale| scale * self.amount)
    }
}
