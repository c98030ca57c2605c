//! The voice-managing engine.
//!
//! [`Engine`] owns the note→voice map, the sample clock, and the scheduled
//! task queue, and implements the allocation, sustain, pitch-bend, and
//! global-parameter semantics on top of the `gesto-core` substrate. It is an
//! explicitly constructed, explicitly owned object — created at application
//! start, torn down at shutdown, no process-wide singleton.
//!
//! All control operations degrade gracefully: an unknown note name is a
//! logged no-op, never an error. An audio engine must never halt output.
//!
//! The engine itself is single-threaded (`&mut self` everywhere). When the
//! audio callback runs on another thread — as with the cpal path in
//! `gesto-cli` — the caller wraps the engine in a mutex, since automation
//! scheduling and rendering both touch the voice map.

use std::collections::HashMap;

use gesto_core::{SampleClock, TaskQueue, note_frequency, shift_octave};
use tracing::{debug, warn};

use crate::arp::{ARP_VELOCITY, Arpeggiator, GATE_FRACTION};
use crate::gesture::{GestureState, apply_gesture_routes};
use crate::settings::SynthSettings;
use crate::voice::{Voice, bend_ratio};

/// Default note-on velocity.
pub const DEFAULT_VELOCITY: f32 = 0.4;

/// Default initial key-slide position.
pub const DEFAULT_SLIDE: f32 = 0.5;

/// Release time used for `note_off` with `immediate` set.
const IMMEDIATE_RELEASE: f32 = 0.010;

/// Delay between the end of a release ramp and voice teardown: 100 ms grace
/// for the ramp tail plus a 100 ms buffer.
const TEARDOWN_SLACK: f64 = 0.2;

/// Number of samples the visualization tap exposes.
pub const WAVEFORM_LEN: usize = 2048;

/// Deferred engine bookkeeping, fired by the renderer at exact sample
/// boundaries.
#[derive(Debug, Clone)]
enum EngineTask {
    /// Remove a voice from the live set, guarded by voice identity.
    Teardown { note: String, voice_id: u64 },
    /// Arpeggiator step.
    ArpTick { generation: u64 },
    /// Scheduled gate-off for an arpeggiated note.
    ArpNoteOff { note: String },
}

/// Polyphonic voice manager and render root.
pub struct Engine {
    clock: SampleClock,
    tasks: TaskQueue<EngineTask>,
    voices: HashMap<String, Voice>,
    /// Voices displaced from the map (same-key re-trigger) that are still
    /// ramping to silence. Their scheduled teardown removes them.
    draining: Vec<Voice>,
    settings: SynthSettings,
    bend: f32,
    sustain: bool,
    /// Last sounding frequency, the starting point for glide.
    last_freq: Option<f32>,
    next_voice_id: u64,
    arp: Arpeggiator,
    scope: ScopeRing,
}

impl Engine {
    /// Create an engine with an initial settings snapshot.
    pub fn new(sample_rate: f32, settings: SynthSettings) -> Self {
        let bend = settings.pitch_bend.clamp(-1.0, 1.0);
        let sustain = settings.sustain;
        Self {
            clock: SampleClock::new(sample_rate),
            tasks: TaskQueue::new(),
            voices: HashMap::new(),
            draining: Vec::new(),
            settings,
            bend,
            sustain,
            last_freq: None,
            next_voice_id: 0,
            arp: Arpeggiator::default(),
            scope: ScopeRing::new(),
        }
    }

    /// Current clock time in seconds.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    /// Number of live voices (not counting draining ones).
    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    /// Look up a live voice by note key.
    pub fn voice(&self, note: &str) -> Option<&Voice> {
        self.voices.get(note)
    }

    /// Current pitch-bend scalar.
    pub fn pitch_bend(&self) -> f32 {
        self.bend
    }

    /// Whether sustain is currently engaged.
    pub fn sustain(&self) -> bool {
        self.sustain
    }

    /// Start (or retarget, in mono mode) a note.
    ///
    /// The note name is shifted by the snapshot's octave setting and looked
    /// up in the frequency table; unknown names are a silent no-op. In mono
    /// mode with a live voice, the existing voice glides to the new pitch
    /// and is renamed in place — no new voice is allocated.
    pub fn note_on(&mut self, note: &str, settings: &SynthSettings, velocity: f32, initial_slide: f32) {
        self.settings = settings.clone();

        let Some(base_freq) = shift_octave(note, settings.octave).and_then(|n| note_frequency(&n))
        else {
            warn!(note, octave = settings.octave, "ignoring unknown note");
            return;
        };
        let now = self.clock.now();
        let target = base_freq * bend_ratio(self.bend);

        if settings.mono {
            if let Some(existing_key) = self.voices.keys().next().cloned() {
                let mut voice = self.voices.remove(&existing_key).expect("key just seen");
                voice.retarget(base_freq, target, settings.glide, now);
                voice.set_released(false);
                voice.set_note(note.to_owned());
                debug!(from = %existing_key, to = note, "mono retarget");
                self.voices.insert(note.to_owned(), voice);
                self.last_freq = Some(target);
                return;
            }
        }

        let start_freq = match self.last_freq {
            Some(f) if settings.glide > 0.0 => f,
            _ => target,
        };

        let id = self.next_voice_id;
        self.next_voice_id += 1;
        let mut voice = Voice::start(
            note.to_owned(),
            id,
            base_freq,
            start_freq,
            target,
            velocity.clamp(0.0, 1.0),
            initial_slide,
            settings,
            now,
        );
        voice.set_sample_rate(self.clock.sample_rate());

        // A same-key re-trigger displaces the old voice; it keeps ramping in
        // the draining list until its scheduled teardown fires, so disposal
        // never precedes silence.
        if let Some(old) = self.voices.insert(note.to_owned(), voice) {
            debug!(note, old_id = old.id(), "displacing re-triggered voice");
            self.drain(old, now);
        }
        self.last_freq = Some(target);
        debug!(note, id, freq = base_freq, "voice started");
    }

    /// Release a note.
    ///
    /// With sustain engaged (and `immediate` unset) the voice is only
    /// flagged released and keeps sounding — still fully modulatable — until
    /// sustain lifts. Otherwise the release ramp starts and teardown is
    /// scheduled after the ramp plus slack.
    pub fn note_off(&mut self, note: &str, settings: &SynthSettings, immediate: bool) {
        self.settings = settings.clone();

        let Some(voice) = self.voices.get_mut(note) else {
            return;
        };

        if self.sustain && !immediate {
            voice.set_released(true);
            debug!(note, "release deferred by sustain");
            return;
        }

        let release = if immediate {
            IMMEDIATE_RELEASE
        } else {
            settings.release.max(IMMEDIATE_RELEASE)
        };
        self.start_release(note, release);
    }

    /// Smoothly retarget a live voice's key-slide source.
    pub fn update_slide(&mut self, note: &str, value: f32) {
        let now = self.clock.now();
        if let Some(voice) = self.voices.get_mut(note) {
            voice.update_slide(value, now);
        }
    }

    /// Set the pitch-bend scalar and rebroadcast the bent sounding frequency
    /// to every live voice. Idempotent.
    pub fn set_pitch_bend(&mut self, value: f32) {
        let value = value.clamp(-1.0, 1.0);
        if value == self.bend {
            return;
        }
        self.bend = value;
        let now = self.clock.now();
        let ratio = bend_ratio(value);
        for voice in self.voices.values_mut().chain(self.draining.iter_mut()) {
            voice.set_bend_target(voice.base_frequency() * ratio, now);
        }
    }

    /// Apply a new settings snapshot to every live voice.
    ///
    /// Resolves sustain-release transitions first (voices flagged released
    /// while sustain was held are force-released when it lifts), then
    /// broadcasts filter and LFO retargets, then reconciles pitch bend.
    pub fn apply_global_params(&mut self, settings: &SynthSettings) {
        let now = self.clock.now();

        if self.sustain && !settings.sustain {
            // Two-phase: collect, then release. Releasing schedules teardown
            // tasks, which must not happen mid-iteration over the map.
            let held: Vec<String> = self
                .voices
                .iter()
                .filter(|(_, v)| v.released())
                .map(|(k, _)| k.clone())
                .collect();
            for note in held {
                self.start_release(&note, settings.release.max(IMMEDIATE_RELEASE));
            }
        }
        self.sustain = settings.sustain;

        for voice in self.voices.values_mut().chain(self.draining.iter_mut()) {
            voice.apply_globals(settings, now);
        }

        if (settings.pitch_bend - self.bend).abs() > f32::EPSILON {
            self.set_pitch_bend(settings.pitch_bend);
        }

        self.settings = settings.clone();
    }

    /// Fold a gesture reading into the engine.
    ///
    /// Gesture-sourced routes rewrite the settings snapshot (absolute
    /// mapping), pincer pose drives sustain, and the result is applied as a
    /// global-parameter change.
    pub fn apply_gesture(&mut self, gesture: &GestureState) {
        let mut settings = self.settings.clone();
        apply_gesture_routes(&mut settings, gesture);
        settings.sustain = gesture.sustain_engaged();
        self.apply_global_params(&settings);
    }

    /// Begin arpeggiating the given held notes at the snapshot's rate, or
    /// swap the sequence if already running.
    pub fn arp_start<S: AsRef<str>>(&mut self, notes: &[S]) {
        if self.arp.set_notes(notes) {
            let generation = self.arp.generation();
            let now = self.clock.now();
            let id = self.tasks.schedule(now, EngineTask::ArpTick { generation });
            self.arp.set_pending_tick(id);
        }
    }

    /// Stop the arpeggiator, cancelling the pending tick. A note already
    /// mid-flight keeps its own scheduled gate-off.
    pub fn arp_stop(&mut self) {
        if let Some(id) = self.arp.stop() {
            self.tasks.cancel(id);
        }
    }

    /// Whether the arpeggiator loop is running.
    pub fn arp_running(&self) -> bool {
        self.arp.is_running()
    }

    /// Render a block of mono samples, advancing the clock.
    ///
    /// The block is split at scheduled task times so teardown and
    /// arpeggiator ticks fire at exact sample boundaries.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let sample_rate = self.clock.sample_rate();
        let mut start = 0;

        while start < out.len() {
            let now = self.clock.now();
            while let Some((_, task)) = self.tasks.pop_due(now) {
                self.run_task(task);
            }

            let remaining = out.len() - start;
            let frames = match self.tasks.next_fire_time() {
                Some(at) => {
                    let until = self.clock.frames_until(at) as usize;
                    if until == 0 {
                        // Task due exactly now was just drained; render at
                        // least one frame to make progress.
                        1.min(remaining)
                    } else {
                        until.min(remaining)
                    }
                }
                None => remaining,
            };

            let block_start = self.clock.now();
            let segment = &mut out[start..start + frames];
            for voice in self.voices.values_mut() {
                voice.render(segment, block_start, sample_rate);
            }
            for voice in &mut self.draining {
                voice.render(segment, block_start, sample_rate);
            }

            self.clock.advance(frames as u64);
            start += frames;
        }

        self.scope.write(out);
    }

    /// Advance the engine by `seconds`, rendering into a scratch buffer.
    ///
    /// Drives the clock and task queue deterministically; the audio goes
    /// only to the visualization ring. Used by tests and offline callers.
    pub fn run_for(&mut self, seconds: f64) {
        let total = (seconds * f64::from(self.clock.sample_rate())).round() as usize;
        let mut scratch = vec![0.0_f32; 512];
        let mut done = 0;
        while done < total {
            let n = (total - done).min(scratch.len());
            self.render(&mut scratch[..n]);
            done += n;
        }
    }

    /// Fill `buf` with the most recent time-domain output, one byte per
    /// sample centered at 128. Read-only and non-blocking.
    pub fn waveform_samples(&self, buf: &mut [u8]) {
        self.scope.snapshot(buf);
    }

    fn start_release(&mut self, note: &str, release: f32) {
        let now = self.clock.now();
        let Some(voice) = self.voices.get_mut(note) else {
            return;
        };
        voice.begin_release(release, now);
        let voice_id = voice.id();
        let fire_at = now + f64::from(release) + TEARDOWN_SLACK;
        self.tasks.schedule(
            fire_at,
            EngineTask::Teardown {
                note: note.to_owned(),
                voice_id,
            },
        );
        debug!(note, voice_id, fire_at, "release started, teardown scheduled");
    }

    fn run_task(&mut self, task: EngineTask) {
        match task {
            EngineTask::Teardown { note, voice_id } => {
                // Identity guard: a mono retarget or rapid re-trigger may
                // have replaced the map entry since this was scheduled.
                if self.voices.get(&note).is_some_and(|v| v.id() == voice_id) {
                    self.voices.remove(&note);
                    debug!(note = %note, voice_id, "voice torn down");
                } else {
                    let before = self.draining.len();
                    self.draining.retain(|v| v.id() != voice_id);
                    if self.draining.len() == before {
                        debug!(note = %note, voice_id, "stale teardown skipped");
                    }
                }
            }
            EngineTask::ArpTick { generation } => self.arp_tick(generation),
            EngineTask::ArpNoteOff { note } => {
                let settings = self.settings.clone();
                self.note_off(&note, &settings, false);
            }
        }
    }

    fn arp_tick(&mut self, generation: u64) {
        if !self.arp.is_current(generation) {
            return;
        }
        let Some(note) = self.arp.advance() else {
            return;
        };

        let now = self.clock.now();
        let step = 60.0 / f64::from(self.settings.arp_rate.max(1.0));
        let settings = self.settings.clone();

        self.note_on(&note, &settings, ARP_VELOCITY, DEFAULT_SLIDE);
        self.tasks
            .schedule(now + step * GATE_FRACTION, EngineTask::ArpNoteOff { note });
        let id = self
            .tasks
            .schedule(now + step, EngineTask::ArpTick { generation });
        self.arp.set_pending_tick(id);
    }

    fn drain(&mut self, mut voice: Voice, now: f64) {
        // Displaced voices still honor "no disposal before silence": ramp
        // down quickly and schedule their removal.
        if !voice.released() {
            voice.begin_release(IMMEDIATE_RELEASE, now);
        }
        let voice_id = voice.id();
        let note = voice.note().to_owned();
        self.draining.push(voice);
        self.tasks.schedule(
            now + f64::from(IMMEDIATE_RELEASE) + TEARDOWN_SLACK,
            EngineTask::Teardown { note, voice_id },
        );
    }
}

/// Fixed-size ring of the most recent rendered samples, for the
/// visualization tap.
#[derive(Debug)]
struct ScopeRing {
    samples: Vec<f32>,
    write_pos: usize,
}

impl ScopeRing {
    fn new() -> Self {
        Self {
            samples: vec![0.0; WAVEFORM_LEN],
            write_pos: 0,
        }
    }

    fn write(&mut self, block: &[f32]) {
        for &s in block {
            self.samples[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % self.samples.len();
        }
    }

    /// Copy the ring, oldest first, as bytes centered at 128.
    fn snapshot(&self, buf: &mut [u8]) {
        let n = buf.len().min(self.samples.len());
        for (i, slot) in buf.iter_mut().take(n).enumerate() {
            let idx = (self.write_pos + self.samples.len() - n + i) % self.samples.len();
            let s = self.samples[idx].clamp(-1.0, 1.0);
            *slot = (128.0 + s * 127.0) as u8;
        }
    }
}
