//! State variable filter (lowpass).
//!
//! Topology-Preserving Transform SVF after Zavalishin, "The Art of VA Filter
//! Design" (2012). The trapezoidal-integrator discretization stays stable
//! under heavy cutoff modulation, which matters here: the engine sweeps
//! cutoff from LFO, envelope, and gesture sources every sample.

use core::f32::consts::PI;
use libm::tanf;

/// Flush denormal values to zero to avoid CPU penalties in the feedback path.
#[inline]
fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-30 { 0.0 } else { x }
}

/// Two-pole (12 dB/oct) lowpass state variable filter.
#[derive(Debug, Clone)]
pub struct Svf {
    // Integrator state
    ic1eq: f32,
    ic2eq: f32,

    // Coefficients
    g: f32,
    k: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
}

impl Svf {
    /// Create a filter with cutoff 1000 Hz and Butterworth Q.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz. Clamped to 20.0..=sample_rate × 0.49.
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = freq.clamp(20.0, self.sample_rate * 0.49);
        self.update_coefficients();
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q). Clamped to 0.1..=40.0.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.1, 40.0);
        self.update_coefficients();
    }

    /// Current resonance (Q).
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Clear integrator state.
    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    fn update_coefficients(&mut self) {
        self.g = tanf(PI * self.cutoff / self.sample_rate);
        self.k = 1.0 / self.resonance;
    }

    /// Process one sample, returning the lowpass output.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        v2
    }
}
