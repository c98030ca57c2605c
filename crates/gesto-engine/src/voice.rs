//! A single sounding note.
//!
//! A voice owns one note's oscillator pair, filter, amplitude curve, LFO,
//! key-slide source, and the modulation connections wired once at creation.
//! Every automated parameter is a scheduled timeline; the renderer samples
//! them and never receives imperative writes, so cancel-and-reschedule
//! operations (glide retarget, release) can never leave stale automation
//! behind.

use gesto_core::{Generator, ParamTimeline, Svf, Waveform, cents_to_ratio};
use libm::powf;

use crate::routes::{ModDest, ModSource, SlideTarget};
use crate::settings::SynthSettings;

/// Shortest amplitude attack, seconds.
pub(crate) const MIN_ATTACK: f64 = 0.005;

/// Release ramps target this instead of zero — exponential ramps cannot
/// reach an exact zero.
pub(crate) const SILENCE_FLOOR: f32 = 0.001;

/// Key-slide retarget smoothing, seconds.
const SLIDE_TIME_CONSTANT: f64 = 0.010;

/// Pitch-bend retarget smoothing, seconds.
const BEND_TIME_CONSTANT: f64 = 0.030;

/// Global-parameter broadcast smoothing, seconds.
const BROADCAST_TIME_CONSTANT: f64 = 0.050;

/// Factor turning the control-surface resonance value into filter Q.
const RESONANCE_Q_SCALE: f32 = 8.0;

/// Sounding-frequency ratio for a bend scalar in [-1, 1] (±2 semitones).
#[inline]
pub fn bend_ratio(bend: f32) -> f32 {
    powf(2.0, bend * 2.0 / 12.0)
}

/// Internal modulation signal feeding a wired connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnSource {
    Lfo,
    Env,
    KeySlide,
}

/// Voice-level parameter a connection feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnDest {
    Cutoff,
    Resonance,
    Pitch,
    Gain,
    LfoRate,
}

/// One wired modulation connection: source signal through a fixed gain into
/// a destination parameter. Static for the voice's lifetime.
#[derive(Debug, Clone, Copy)]
struct Connection {
    source: ConnSource,
    dest: ConnDest,
    gain: f32,
}

/// One note's complete signal-generation and automation state.
#[derive(Debug, Clone)]
pub struct Voice {
    note: String,
    id: u64,
    base_freq: f32,
    created_at: f64,
    released: bool,
    velocity: f32,
    detune_cents: f32,

    osc1: Generator,
    osc2: Generator,
    lfo: Generator,
    filter: Svf,

    freq: ParamTimeline,
    gain: ParamTimeline,
    env: ParamTimeline,
    cutoff: ParamTimeline,
    q: ParamTimeline,
    lfo_rate: ParamTimeline,
    slide: ParamTimeline,

    connections: Vec<Connection>,
}

impl Voice {
    /// Start a voice and begin all periodic signal generation.
    ///
    /// `start_freq` is where the oscillators begin (the previous sounding
    /// frequency when glide is engaged); `target_freq` is the bent target
    /// they ramp or snap to. The amplitude ramps 0 → `velocity` over
    /// `max(5 ms, attack)`, and the modulation connections are wired from
    /// the snapshot's route list, fixed for the voice's lifetime.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn start(
        note: String,
        id: u64,
        base_freq: f32,
        start_freq: f32,
        target_freq: f32,
        velocity: f32,
        initial_slide: f32,
        settings: &SynthSettings,
        now: f64,
    ) -> Self {
        let voicing = settings.category.voicing();
        let attack_end = now + settings.attack.max(MIN_ATTACK as f32) as f64;

        let mut freq = ParamTimeline::new(start_freq);
        freq.set_value_at(start_freq, now);
        if settings.glide > 0.0 {
            freq.exponential_ramp_to(target_freq, now + f64::from(settings.glide));
        } else {
            freq.set_value_at(target_freq, now);
        }

        let mut gain = ParamTimeline::new(0.0);
        gain.set_value_at(0.0, now);
        gain.linear_ramp_to(velocity, attack_end);

        let mut env = ParamTimeline::new(0.0);
        env.set_value_at(0.0, now);
        env.linear_ramp_to(1.0, attack_end);

        let mut connections = Vec::new();
        for route in &settings.mod_routes {
            let Some(route_gain) = route.connection_gain() else {
                continue;
            };
            let source = match route.source {
                ModSource::Lfo => ConnSource::Lfo,
                ModSource::Env => ConnSource::Env,
                _ => continue,
            };
            let dest = match route.destination {
                ModDest::Cutoff => ConnDest::Cutoff,
                ModDest::Resonance => ConnDest::Resonance,
                ModDest::Pitch => ConnDest::Pitch,
                ModDest::Gain => ConnDest::Gain,
                ModDest::Reverb | ModDest::Delay => continue,
            };
            connections.push(Connection {
                source,
                dest,
                gain: route_gain,
            });
        }

        // Key-slide expression is always wired, independent of the route
        // list.
        let slide_dest = match settings.key_slide_target {
            SlideTarget::Cutoff => ConnDest::Cutoff,
            SlideTarget::Resonance => ConnDest::Resonance,
            SlideTarget::Pitch => ConnDest::Pitch,
            SlideTarget::Vibrato => ConnDest::LfoRate,
        };
        connections.push(Connection {
            source: ConnSource::KeySlide,
            dest: slide_dest,
            gain: settings.key_slide_target.scale(),
        });

        Self {
            note,
            id,
            base_freq,
            created_at: now,
            released: false,
            velocity,
            detune_cents: voicing.detune_cents + settings.detune,
            osc1: Generator::new(voicing.osc1),
            osc2: Generator::new(voicing.osc2),
            lfo: Generator::new(Waveform::Sine),
            filter: Svf::new(48000.0),
            freq,
            gain,
            env,
            cutoff: ParamTimeline::new(settings.cutoff),
            q: ParamTimeline::new(settings.resonance * RESONANCE_Q_SCALE),
            lfo_rate: ParamTimeline::new(settings.lfo_rate),
            slide: ParamTimeline::new(initial_slide.clamp(0.0, 1.0)),
            connections,
        }
    }

    pub(crate) fn set_sample_rate(&mut self, sample_rate: f32) {
        self.filter = Svf::new(sample_rate);
    }

    /// Glide or snap to a new pitch (mono retarget).
    ///
    /// Cancels only in-flight frequency automation — the voice keeps
    /// sounding continuously, so amplitude and envelope curves are left
    /// untouched.
    pub(crate) fn retarget(&mut self, new_base: f32, target_freq: f32, glide: f32, now: f64) {
        self.base_freq = new_base;
        self.freq.cancel_and_hold(now);
        if glide > 0.0 {
            self.freq
                .exponential_ramp_to(target_freq, now + f64::from(glide));
        } else {
            self.freq.set_value_at(target_freq, now);
        }
    }

    /// Smoothly retarget the sounding frequency for a pitch-bend change.
    pub(crate) fn set_bend_target(&mut self, target_freq: f32, now: f64) {
        self.freq
            .set_target_at(target_freq, now, BEND_TIME_CONSTANT);
    }

    /// Begin the release ramp: hold the current level, then decay
    /// exponentially toward near-silence over `release` seconds.
    pub(crate) fn begin_release(&mut self, release: f32, now: f64) {
        self.released = true;
        let end = now + f64::from(release.max(0.001));
        self.gain.cancel_and_hold(now);
        self.gain.exponential_ramp_to(SILENCE_FLOOR, end);
        self.env.cancel_and_hold(now);
        self.env.linear_ramp_to(0.0, end);
    }

    /// Retarget the key-slide source (continuous finger position).
    pub(crate) fn update_slide(&mut self, value: f32, now: f64) {
        self.slide
            .set_target_at(value.clamp(0.0, 1.0), now, SLIDE_TIME_CONSTANT);
    }

    /// Broadcast new global parameters onto this voice, smoothed.
    pub(crate) fn apply_globals(&mut self, settings: &SynthSettings, now: f64) {
        self.cutoff
            .set_target_at(settings.cutoff, now, BROADCAST_TIME_CONSTANT);
        self.q.set_target_at(
            settings.resonance * RESONANCE_Q_SCALE,
            now,
            BROADCAST_TIME_CONSTANT,
        );
        self.lfo_rate
            .set_target_at(settings.lfo_rate, now, BROADCAST_TIME_CONSTANT);
    }

    pub(crate) fn set_released(&mut self, released: bool) {
        self.released = released;
    }

    pub(crate) fn set_note(&mut self, note: String) {
        self.note = note;
    }

    /// Render this voice additively into `out`, starting at clock time
    /// `block_start`.
    pub(crate) fn render(&mut self, out: &mut [f32], block_start: f64, sample_rate: f32) {
        let dt = f64::from(1.0 / sample_rate);
        for (i, sample) in out.iter_mut().enumerate() {
            let t = block_start + i as f64 * dt;

            let slide_v = self.slide.value_at(t);
            let env_v = self.env.value_at(t);

            // LFO rate can itself be a destination (vibrato key-slide), so
            // resolve it before ticking the LFO.
            let mut rate = self.lfo_rate.value_at(t);
            for c in &self.connections {
                if c.dest == ConnDest::LfoRate {
                    rate += Self::source_value(c.source, 0.0, env_v, slide_v) * c.gain;
                }
            }
            let lfo_v = self.lfo.tick(rate.max(0.0), sample_rate);

            let mut cutoff_mod = 0.0_f32;
            let mut q_mod = 0.0_f32;
            let mut pitch_cents = 0.0_f32;
            let mut gain_mod = 0.0_f32;
            for c in &self.connections {
                let v = Self::source_value(c.source, lfo_v, env_v, slide_v) * c.gain;
                match c.dest {
                    ConnDest::Cutoff => cutoff_mod += v,
                    ConnDest::Resonance => q_mod += v,
                    ConnDest::Pitch => pitch_cents += v,
                    ConnDest::Gain => gain_mod += v,
                    ConnDest::LfoRate => {}
                }
            }

            let pitch_ratio = cents_to_ratio(pitch_cents);
            let f1 = self.freq.value_at(t) * pitch_ratio;
            let f2 = f1 * cents_to_ratio(self.detune_cents);
            let mix = 0.5 * (self.osc1.tick(f1, sample_rate) + self.osc2.tick(f2, sample_rate));

            self.filter.set_cutoff(self.cutoff.value_at(t) + cutoff_mod);
            self.filter.set_resonance(self.q.value_at(t) + q_mod);

            let amp = self.gain.value_at(t) * (1.0 + gain_mod).max(0.0);
            *sample += self.filter.process(mix) * amp;
        }
    }

    #[inline]
    fn source_value(source: ConnSource, lfo: f32, env: f32, slide: f32) -> f32 {
        match source {
            ConnSource::Lfo => lfo,
            ConnSource::Env => env,
            ConnSource::KeySlide => slide,
        }
    }

    /// The note key this voice currently answers to.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Unique voice identity, used to guard scheduled teardown against
    /// reallocation of the same note key.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unbent 12-TET frequency of the voice's note.
    pub fn base_frequency(&self) -> f32 {
        self.base_freq
    }

    /// Frequency the voice is currently heading toward (end of all
    /// scheduled frequency automation).
    pub fn target_frequency(&self) -> f32 {
        self.freq.end_value()
    }

    /// Whether note-off has been received (possibly deferred by sustain).
    pub fn released(&self) -> bool {
        self.released
    }

    /// Clock time the voice was created.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Note-on velocity.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Amplitude level at clock time `t`.
    pub fn gain_at(&self, t: f64) -> f32 {
        self.gain.value_at(t)
    }

    /// Key-slide position at clock time `t`.
    pub fn slide_at(&self, t: f64) -> f32 {
        self.slide.value_at(t)
    }

    /// Number of wired modulation connections (route connections plus the
    /// always-present key-slide connection).
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
