//! Gesto Core - audio substrate for the gesto synthesizer engine
//!
//! This crate provides the rendering substrate the voice engine configures
//! and connects: a frame-counter clock, scheduled parameter automation,
//! deferred-task scheduling, periodic signal generators, and a state
//! variable filter.
//!
//! # Core Abstractions
//!
//! ## Scheduled Automation
//!
//! All parameter motion is expressed as curves against the audio clock, not
//! imperative per-sample writes:
//!
//! - [`ParamTimeline`] - scheduled set/ramp/target automation with
//!   cancel-and-hold semantics
//! - [`SampleClock`] - frame-counter clock advanced by rendering
//! - [`TaskQueue`] - time-ordered, cancellable deferred tasks (voice
//!   teardown, arpeggiator ticks)
//!
//! ```rust
//! use gesto_core::ParamTimeline;
//!
//! let mut gain = ParamTimeline::new(0.0);
//! gain.set_value_at(0.0, 0.0);
//! gain.linear_ramp_to(0.4, 0.005);          // attack
//! gain.exponential_ramp_to(0.001, 0.505);   // release toward near-silence
//!
//! let mid_attack = gain.value_at(0.0025);
//! assert!(mid_attack > 0.0 && mid_attack < 0.4);
//! ```
//!
//! ## Signal Generation
//!
//! - [`Generator`] / [`Waveform`] - phase-accumulating periodic generator
//! - [`Svf`] - TPT state variable lowpass, stable under cutoff modulation
//!
//! ## Notes
//!
//! - [`notes`] - 12-TET name/frequency table (`"C#4"`, A4 = 440 Hz) with
//!   graceful `None` on unknown names

pub mod clock;
pub mod generator;
pub mod notes;
pub mod svf;
pub mod timeline;

// Re-export main types at crate root
pub use clock::{SampleClock, TaskId, TaskQueue};
pub use generator::{Generator, Waveform};
pub use notes::{cents_to_ratio, note_frequency, pitch_order_key, shift_octave};
pub use svf::Svf;
pub use timeline::{Curve, ParamTimeline};
