//! Periodic signal generators.
//!
//! A [`Generator`] is the opaque periodic-signal capability the engine wires
//! into voices and LFOs: a waveform shape plus a phase accumulator, advanced
//! one sample at a time at whatever frequency the caller's timeline dictates.
//! Shapes are naive (not band-limited); the engine's contract is parameter
//! automation, not alias-free oscillator synthesis.

use core::f32::consts::PI;
use libm::sinf;

/// Waveform shape of a [`Generator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Smooth sinusoid.
    #[default]
    Sine,
    /// Linear up/down ramp.
    Triangle,
    /// Rising ramp with abrupt reset.
    Saw,
    /// Binary high/low.
    Square,
}

/// Phase-accumulating periodic generator.
///
/// Frequency is supplied per sample rather than stored, because voice
/// frequencies are scheduled curves evaluated by the renderer.
#[derive(Debug, Clone)]
pub struct Generator {
    waveform: Waveform,
    /// Current phase position [0.0, 1.0)
    phase: f32,
}

impl Generator {
    /// Create a generator at phase zero.
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    /// Waveform shape.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Reset phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Output at the current phase, without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        match self.waveform {
            Waveform::Sine => sinf(self.phase * 2.0 * PI),
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            Waveform::Saw => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    /// Return the current output and advance one sample at `freq_hz`.
    #[inline]
    pub fn tick(&mut self, freq_hz: f32, sample_rate: f32) -> f32 {
        let out = self.value();
        self.phase += freq_hz.max(0.0) / sample_rate;
        while self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}
