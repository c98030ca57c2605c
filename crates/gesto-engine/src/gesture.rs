//! Two-hand gesture readings and the gesture→settings bridge.
//!
//! Gesture state is ephemeral: a snapshot replaces the previous one on each
//! analysis tick and no history is kept. Gesture-sourced modulation routes
//! are not wired into voice graphs; they are evaluated here against the
//! current reading and folded into the settings snapshot as absolute values.
//! An absent reading (inactive hand) leaves the affected setting at its last
//! value.

use serde::{Deserialize, Serialize};

use crate::routes::{ModDest, ModSource};
use crate::settings::SynthSettings;

/// Pose multiplier applied when either hand is closed into a fist.
const CLOSED_HAND_INTENSIFIER: f32 = 1.5;

/// One hand's normalized reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    /// Horizontal position, 0..1.
    pub x: f32,
    /// Vertical position, 0..1.
    pub y: f32,
    /// Whether the hand is currently tracked.
    pub active: bool,
    /// Thumb-index pincer pose.
    pub is_pincer: bool,
    /// Closed fist pose.
    pub is_closed: bool,
}

/// A full two-hand gesture reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    /// Left hand reading.
    pub left: HandPose,
    /// Right hand reading.
    pub right: HandPose,
    /// Normalized inter-hand distance, 0..1.
    pub distance: f32,
}

impl GestureState {
    /// Current value of a gesture source channel, or `None` when the
    /// backing hand is not tracked (the affected setting then holds its
    /// last value).
    pub fn source_value(&self, source: ModSource) -> Option<f32> {
        match source {
            ModSource::LeftHandX if self.left.active => Some(self.left.x),
            ModSource::LeftHandY if self.left.active => Some(self.left.y),
            ModSource::RightHandX if self.right.active => Some(self.right.x),
            ModSource::RightHandY if self.right.active => Some(self.right.y),
            ModSource::HandDistance if self.left.active && self.right.active => {
                Some(self.distance)
            }
            _ => None,
        }
    }

    /// Sustain is a discrete gesture outcome: either hand tracked and held
    /// in a pincer pose.
    pub fn sustain_engaged(&self) -> bool {
        (self.left.active && self.left.is_pincer) || (self.right.active && self.right.is_pincer)
    }

    fn intensifier(&self) -> f32 {
        if (self.left.active && self.left.is_closed) || (self.right.active && self.right.is_closed)
        {
            CLOSED_HAND_INTENSIFIER
        } else {
            1.0
        }
    }
}

/// Fold the gesture-sourced routes of `settings.mod_routes` into the
/// snapshot's parameter fields.
///
/// Each route maps absolutely: `contribution = source × amount ×
/// intensifier`, then clamps into the destination's valid range. Routes are
/// applied in list order, so the last route targeting a destination wins —
/// there is deliberately no summation across gesture routes.
pub fn apply_gesture_routes(settings: &mut SynthSettings, gesture: &GestureState) {
    let intensifier = gesture.intensifier();

    // Routes are copied out first: the loop writes into the same settings
    // struct that owns the list.
    // Amount 0 must behave exactly like route absence: skipping it here
    // keeps a zeroed route from recentering its destination.
    let routes: Vec<_> = settings
        .mod_routes
        .iter()
        .filter(|r| r.source.is_gesture() && r.amount != 0.0)
        .copied()
        .collect();

    for route in routes {
        let Some(source) = gesture.source_value(route.source) else {
            continue;
        };
        let contribution = source.clamp(0.0, 1.0) * route.amount * intensifier;

        match route.destination {
            ModDest::Cutoff => {
                settings.cutoff = (2000.0 + contribution * 8000.0).clamp(50.0, 10000.0);
            }
            ModDest::Resonance => {
                settings.resonance = (1.0 + contribution * 9.0).clamp(0.1, 10.0);
            }
            ModDest::Reverb => {
                settings.reverb_mix = contribution.clamp(0.0, 1.0);
            }
            ModDest::Delay => {
                settings.delay_feedback = contribution.clamp(0.0, 0.9);
            }
            // Pitch and gain are voice-level destinations; gesture routes
            // write settings fields only.
            ModDest::Pitch | ModDest::Gain => {}
        }
    }
}
