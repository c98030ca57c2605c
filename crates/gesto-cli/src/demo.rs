//! A small scripted performance used by the `render` and `play` commands.
//!
//! Chooses between a held chord with a pitch-bend dip and an arpeggiated
//! pattern depending on the preset, so every factory preset demonstrates
//! the engine paths it actually exercises.

use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gesto_engine::{DEFAULT_SLIDE, DEFAULT_VELOCITY, Engine, SynthSettings};

const CHORD: &[&str] = &["C3", "G3", "E4"];
const ARP_NOTES: &[&str] = &["C3", "E3", "G3", "B3"];

/// Script the demo onto a fresh engine. Returns the engine, ready to render.
fn scripted_engine(settings: &SynthSettings, sample_rate: f32) -> Engine {
    let mut engine = Engine::new(sample_rate, settings.clone());
    if settings.arp_enabled || settings.mono {
        engine.arp_start(ARP_NOTES);
    } else {
        for note in CHORD {
            engine.note_on(note, settings, DEFAULT_VELOCITY, DEFAULT_SLIDE);
        }
    }
    engine
}

/// Render `seconds` of the demo performance offline.
pub fn render_performance(settings: &SynthSettings, sample_rate: f32, seconds: f32) -> Vec<f32> {
    let mut engine = scripted_engine(settings, sample_rate);
    let total = (seconds.max(0.5) * sample_rate) as usize;
    let mut out = vec![0.0_f32; total];

    // Dip the pitch bend a third of the way in, recover at two thirds,
    // and release everything for the final second.
    let bend_down = total / 3;
    let bend_up = 2 * total / 3;
    let release_at = total.saturating_sub(sample_rate as usize);

    let mut pos = 0;
    while pos < total {
        let next_cue = [bend_down, bend_up, release_at, total]
            .into_iter()
            .filter(|&c| c > pos)
            .min()
            .unwrap_or(total);

        if pos == bend_down {
            engine.set_pitch_bend(-0.5);
        }
        if pos == bend_up {
            engine.set_pitch_bend(0.0);
        }
        if pos == release_at {
            if engine.arp_running() {
                engine.arp_stop();
            }
            for note in CHORD {
                engine.note_off(note, settings, false);
            }
        }

        engine.render(&mut out[pos..next_cue]);
        pos = next_cue;
    }
    out
}

/// Play the demo performance through the default output device.
pub fn play_performance(settings: &SynthSettings, seconds: f32) -> anyhow::Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no default output device"))?;
    let config = device
        .default_output_config()
        .context("querying default output config")?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "unsupported sample format {:?}",
            config.sample_format()
        ));
    }

    let stream_config: cpal::StreamConfig = config.config();
    let sample_rate = stream_config.sample_rate.0 as f32;
    let channels = stream_config.channels as usize;

    tracing::info!(
        device = device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels,
        "audio output opened"
    );

    // The audio callback runs on cpal's thread, so the engine sits behind a
    // mutex; the note->voice map must not race with control calls.
    let engine = Arc::new(Mutex::new(scripted_engine(settings, sample_rate)));
    let render_engine = Arc::clone(&engine);
    let mut mono = vec![0.0_f32; 4096];

    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            if mono.len() < frames {
                mono.resize(frames, 0.0);
            }
            match render_engine.lock() {
                Ok(mut engine) => engine.render(&mut mono[..frames]),
                Err(_) => mono[..frames].fill(0.0),
            }
            for (frame, &s) in data.chunks_mut(channels).zip(&mono) {
                frame.fill(s);
            }
        },
        |err| tracing::warn!(%err, "audio stream error"),
        None,
    )?;
    stream.play()?;

    let hold = seconds.max(1.0);
    std::thread::sleep(std::time::Duration::from_secs_f32(hold - 0.5));

    // Let releases ring out before the stream drops
    {
        let mut engine = engine.lock().map_err(|_| anyhow!("engine poisoned"))?;
        if engine.arp_running() {
            engine.arp_stop();
        }
        for note in CHORD {
            engine.note_off(note, settings, false);
        }
    }
    std::thread::sleep(std::time::Duration::from_millis(500));

    Ok(())
}
