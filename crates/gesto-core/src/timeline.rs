//! Scheduled parameter automation curves.
//!
//! Every automated synthesis parameter (voice gain, oscillator frequency,
//! filter cutoff, key-slide position) is a [`ParamTimeline`]: an ordered list
//! of automation events against the sample clock. The renderer evaluates the
//! timeline per sample and interpolates between scheduled points; control
//! code never writes values imperatively.
//!
//! Four event shapes cover the engine's needs:
//!
//! - `SetValue` — jump to a value at a time
//! - `LinearRamp` — straight line from the previous event to `(time, value)`
//! - `ExponentialRamp` — geometric sweep to `(time, value)`; endpoints are
//!   floored at a small positive magnitude so a ramp scheduled from silence
//!   cannot hit the log singularity
//! - `SetTarget` — one-pole approach toward a target with a time constant,
//!   in effect until superseded by a later event
//!
//! Cancel-then-reschedule is the hard ordering invariant of the engine:
//! [`cancel_and_hold`](ParamTimeline::cancel_and_hold) removes every event at
//! or after the cancel time and pins the value the curve had at that instant,
//! so stale automation points can never reassert after a newer one.

use libm::{exp, pow};

/// Smallest magnitude an exponential-ramp endpoint is allowed to have.
const EXP_FLOOR: f32 = 1e-5;

/// Shape of a single automation event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// Jump to the value at the event time.
    SetValue,
    /// Linear ramp from the previous event to this one.
    LinearRamp,
    /// Exponential (geometric) ramp from the previous event to this one.
    ExponentialRamp,
    /// One-pole exponential approach toward the value, with the given time
    /// constant in seconds, starting at the event time.
    SetTarget {
        /// Time constant in seconds (63.2% of the distance per constant).
        time_constant: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct AutomationEvent {
    time: f64,
    value: f32,
    curve: Curve,
}

/// A parameter value automated by scheduled curves.
///
/// Times are absolute clock seconds. Events may be scheduled in any order;
/// the timeline keeps them sorted by time (stable for equal times, so a
/// `SetValue` scheduled after a cancel at the same instant wins).
#[derive(Debug, Clone)]
pub struct ParamTimeline {
    initial: f32,
    events: Vec<AutomationEvent>,
}

impl ParamTimeline {
    /// Create a timeline holding `initial` until the first event.
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Schedule an instantaneous jump to `value` at `time`.
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            curve: Curve::SetValue,
        });
    }

    /// Schedule a linear ramp ending at `(time, value)`.
    pub fn linear_ramp_to(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            curve: Curve::LinearRamp,
        });
    }

    /// Schedule an exponential ramp ending at `(time, value)`.
    ///
    /// Endpoint magnitudes below a small positive floor are clamped; callers
    /// ramp toward 0.001 rather than zero for silence.
    pub fn exponential_ramp_to(&mut self, value: f32, time: f64) {
        self.insert(AutomationEvent {
            time,
            value,
            curve: Curve::ExponentialRamp,
        });
    }

    /// Begin a one-pole approach toward `target` at `time`.
    pub fn set_target_at(&mut self, target: f32, time: f64, time_constant: f64) {
        self.insert(AutomationEvent {
            time,
            value: target,
            curve: Curve::SetTarget {
                time_constant: time_constant.max(1e-4),
            },
        });
    }

    /// Remove all events scheduled at or after `time` and pin the value the
    /// timeline had at that instant.
    pub fn cancel_and_hold(&mut self, time: f64) {
        let held = self.value_at(time);
        self.events.retain(|e| e.time < time);
        self.set_value_at(held, time);
    }

    /// Remove all events scheduled at or after `time` without anchoring.
    pub fn cancel_after(&mut self, time: f64) {
        self.events.retain(|e| e.time < time);
    }

    /// Evaluate the timeline at clock time `t`.
    pub fn value_at(&self, t: f64) -> f32 {
        // Fold events up to t into an anchor (value at a time) plus an
        // optional in-effect SetTarget approach.
        let mut anchor_v = self.initial;
        let mut anchor_t = 0.0_f64;
        let mut target: Option<(f32, f64)> = None;
        let mut next: Option<&AutomationEvent> = None;

        for ev in &self.events {
            if ev.time > t {
                next = Some(ev);
                break;
            }
            let at_event = Self::approach(anchor_v, anchor_t, target, ev.time);
            match ev.curve {
                Curve::SetValue | Curve::LinearRamp | Curve::ExponentialRamp => {
                    anchor_v = ev.value;
                    anchor_t = ev.time;
                    target = None;
                }
                Curve::SetTarget { time_constant } => {
                    anchor_v = at_event;
                    anchor_t = ev.time;
                    target = Some((ev.value, time_constant));
                }
            }
        }

        // A pending ramp interpolates from the last anchor toward its end.
        if let Some(ev) = next {
            match ev.curve {
                Curve::LinearRamp => {
                    let span = ev.time - anchor_t;
                    if span <= 0.0 {
                        return ev.value;
                    }
                    let frac = ((t - anchor_t) / span) as f32;
                    return anchor_v + (ev.value - anchor_v) * frac;
                }
                Curve::ExponentialRamp => {
                    let span = ev.time - anchor_t;
                    if span <= 0.0 {
                        return ev.value;
                    }
                    let v0 = anchor_v.max(EXP_FLOOR);
                    let v1 = ev.value.max(EXP_FLOOR);
                    let frac = (t - anchor_t) / span;
                    return (f64::from(v0) * pow(f64::from(v1 / v0), frac)) as f32;
                }
                Curve::SetValue | Curve::SetTarget { .. } => {}
            }
        }

        Self::approach(anchor_v, anchor_t, target, t)
    }

    /// The value the timeline settles at once every event has run its course.
    ///
    /// A trailing `SetTarget` contributes its asymptote.
    pub fn end_value(&self) -> f32 {
        self.events.last().map_or(self.initial, |e| e.value)
    }

    /// True when no events are scheduled at or after `time`.
    pub fn is_settled_after(&self, time: f64) -> bool {
        self.events.iter().all(|e| e.time < time)
    }

    fn approach(anchor_v: f32, anchor_t: f64, target: Option<(f32, f64)>, t: f64) -> f32 {
        match target {
            Some((tgt, tc)) => {
                let decay = exp(-(t - anchor_t).max(0.0) / tc) as f32;
                tgt + (anchor_v - tgt) * decay
            }
            None => anchor_v,
        }
    }

    fn insert(&mut self, ev: AutomationEvent) {
        self.events.push(ev);
        // Stable sort: events at the same instant keep scheduling order.
        self.events
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(core::cmp::Ordering::Equal));
    }
}
