//! Integration tests for the gesto engine.
//!
//! Tests cover voice lifecycle through release and teardown, mono
//! retargeting, sustain hold/release, pitch-bend round trips, arpeggiator
//! timing, and modulation-route idempotence.

use gesto_engine::{
    DEFAULT_SLIDE, DEFAULT_VELOCITY, Engine, GestureState, HandPose, ModDest, ModRoute, ModSource,
    SynthSettings, bend_ratio,
};

const SR: f32 = 48000.0;

fn test_settings() -> SynthSettings {
    SynthSettings {
        attack: 0.01,
        release: 0.1,
        ..SynthSettings::default()
    }
}

fn engine_with(settings: &SynthSettings) -> Engine {
    Engine::new(SR, settings.clone())
}

fn press(engine: &mut Engine, settings: &SynthSettings, note: &str) {
    engine.note_on(note, settings, DEFAULT_VELOCITY, DEFAULT_SLIDE);
}

// ---------------------------------------------------------------------------
// 1. Voice lifecycle: release reaches silence, then teardown
// ---------------------------------------------------------------------------

#[test]
fn released_voice_reaches_silence_within_release_plus_slack() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    engine.run_for(0.05);
    assert_eq!(engine.live_voices(), 1);

    engine.note_off("A4", &settings, false);

    // At the end of the release ramp the voice is nearly silent but still
    // present (teardown waits for the ramp tail)
    engine.run_for(f64::from(settings.release) + 0.05);
    let voice = engine.voice("A4").expect("voice persists through ramp tail");
    assert!(voice.released());
    assert!(
        voice.gain_at(engine.now()) < 0.005,
        "gain should be near the silence floor, got {}",
        voice.gain_at(engine.now())
    );

    // Within release + 0.2s (+ margin) it leaves the live set
    engine.run_for(0.2);
    assert_eq!(engine.live_voices(), 0, "voice should be torn down");
}

#[test]
fn immediate_note_off_ignores_release_setting() {
    let mut settings = test_settings();
    settings.release = 5.0;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C3");
    engine.run_for(0.05);
    engine.note_off("C3", &settings, true);

    // 10ms immediate release + 200ms slack, not 5 seconds
    engine.run_for(0.3);
    assert_eq!(engine.live_voices(), 0);
}

// ---------------------------------------------------------------------------
// 2. Mono allocation
// ---------------------------------------------------------------------------

#[test]
fn mono_mode_retargets_instead_of_allocating() {
    let mut settings = test_settings();
    settings.mono = true;
    settings.glide = 0.1;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    engine.run_for(0.02);
    press(&mut engine, &settings, "E4");

    assert_eq!(engine.live_voices(), 1, "mono never exceeds one voice");
    assert!(engine.voice("C4").is_none(), "voice renamed away from C4");

    let voice = engine.voice("E4").expect("voice renamed to E4");
    let e4 = gesto_core::note_frequency("E4").unwrap();
    assert!(
        (voice.target_frequency() - e4).abs() < 0.01,
        "target should be E4's table frequency, got {}",
        voice.target_frequency()
    );
}

#[test]
fn mono_retarget_applies_current_bend_to_new_target() {
    let mut settings = test_settings();
    settings.mono = true;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    engine.set_pitch_bend(0.5);
    engine.run_for(0.02);
    press(&mut engine, &settings, "E4");

    let e4 = gesto_core::note_frequency("E4").unwrap();
    let voice = engine.voice("E4").unwrap();
    assert!(
        (voice.target_frequency() - e4 * bend_ratio(0.5)).abs() < 0.01,
        "mono target must include the live bend"
    );
}

#[test]
fn mono_retarget_clears_released_flag() {
    let mut settings = test_settings();
    settings.mono = true;
    settings.sustain = true;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    engine.note_off("C4", &settings, false); // held by sustain
    assert!(engine.voice("C4").unwrap().released());

    press(&mut engine, &settings, "D4");
    assert!(
        !engine.voice("D4").unwrap().released(),
        "retarget must clear the released flag"
    );
}

#[test]
fn mono_retarget_survives_stale_teardown() {
    // A teardown scheduled for the old note key must not kill the voice
    // after a mono retarget renamed it.
    let mut settings = test_settings();
    settings.mono = true;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    engine.note_off("C4", &settings, false); // schedules teardown for C4
    engine.run_for(0.02);
    press(&mut engine, &settings, "E4"); // renames the voice mid-release

    // Past the stale teardown time the (renamed) voice still lives
    engine.run_for(0.5);
    assert_eq!(engine.live_voices(), 1);
    assert!(engine.voice("E4").is_some());
}

// ---------------------------------------------------------------------------
// 3. Sustain hold and release
// ---------------------------------------------------------------------------

#[test]
fn sustain_defers_release_until_lifted() {
    let mut settings = test_settings();
    settings.sustain = true;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    engine.run_for(0.05);
    engine.note_off("A4", &settings, false);

    // Held: voice stays live at full level
    engine.run_for(0.5);
    let voice = engine.voice("A4").expect("sustain holds the voice");
    assert!(voice.released());
    assert!(
        (voice.gain_at(engine.now()) - DEFAULT_VELOCITY).abs() < 0.01,
        "amplitude unchanged while held"
    );

    // Lift sustain: flagged voices release and tear down
    let mut lifted = settings.clone();
    lifted.sustain = false;
    engine.apply_global_params(&lifted);
    engine.run_for(f64::from(settings.release) + 0.25);
    assert_eq!(engine.live_voices(), 0);
}

#[test]
fn sustained_voice_remains_modulatable() {
    let mut settings = test_settings();
    settings.sustain = true;
    settings.cutoff = 1000.0;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    engine.note_off("A4", &settings, false);

    // Filter broadcast still lands on the held voice
    let mut brighter = settings.clone();
    brighter.cutoff = 6000.0;
    engine.apply_global_params(&brighter);
    engine.run_for(0.5);

    let voice = engine.voice("A4").unwrap();
    assert!(voice.released(), "still flagged released while held");
    assert_eq!(engine.live_voices(), 1);
}

#[test]
fn notes_pressed_but_not_released_survive_sustain_lift() {
    let mut settings = test_settings();
    settings.sustain = true;
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    press(&mut engine, &settings, "E4");
    engine.note_off("C4", &settings, false); // released under sustain

    let mut lifted = settings.clone();
    lifted.sustain = false;
    engine.apply_global_params(&lifted);
    engine.run_for(f64::from(settings.release) + 0.25);

    assert!(engine.voice("C4").is_none(), "flagged voice released");
    assert!(engine.voice("E4").is_some(), "held key keeps sounding");
}

// ---------------------------------------------------------------------------
// 4. Key-slide and pitch bend
// ---------------------------------------------------------------------------

#[test]
fn slide_retargets_smoothly_toward_finger_position() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    let initial = engine.voice("A4").unwrap().slide_at(engine.now());
    assert!((initial - DEFAULT_SLIDE).abs() < 1e-6);

    engine.update_slide("A4", 0.9);

    // Immediately after the retarget the old position still holds (10ms
    // smoothing), well afterwards the new one has settled
    let right_after = engine.voice("A4").unwrap().slide_at(engine.now());
    assert!((right_after - DEFAULT_SLIDE).abs() < 0.01);

    engine.run_for(0.1);
    let settled = engine.voice("A4").unwrap().slide_at(engine.now());
    assert!((settled - 0.9).abs() < 0.01, "slide settled at {settled}");

    // Sliding on a dead note is a no-op, not a panic
    engine.update_slide("G7", 0.1);
}

#[test]
fn pitch_bend_round_trip_restores_base_frequency() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    press(&mut engine, &settings, "C4");
    engine.run_for(0.02);

    engine.set_pitch_bend(0.73);
    engine.run_for(0.1);
    engine.set_pitch_bend(0.0);

    for note in ["A4", "C4"] {
        let voice = engine.voice(note).unwrap();
        assert!(
            (voice.target_frequency() - voice.base_frequency()).abs() < 1e-3,
            "{note}: bend 0 must restore base, got {} vs {}",
            voice.target_frequency(),
            voice.base_frequency()
        );
    }
}

#[test]
fn bend_scales_all_live_voices_by_two_semitones_at_full_scale() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    press(&mut engine, &settings, "E4");
    engine.set_pitch_bend(1.0);

    for note in ["A4", "E4"] {
        let voice = engine.voice(note).unwrap();
        let expected = voice.base_frequency() * bend_ratio(1.0);
        assert!(
            (voice.target_frequency() - expected).abs() < 0.01,
            "{note}: expected {expected}"
        );
    }
}

#[test]
fn bend_does_not_mutate_base_frequency() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    let base_before = engine.voice("A4").unwrap().base_frequency();

    engine.set_pitch_bend(-1.0);
    engine.run_for(0.1);
    assert_eq!(engine.voice("A4").unwrap().base_frequency(), base_before);
}

// ---------------------------------------------------------------------------
// 5. Arpeggiator timing
// ---------------------------------------------------------------------------

#[test]
fn arpeggiator_cycles_sorted_notes_at_the_configured_rate() {
    // 120 BPM: step 0.5s, gate 0.4s, release 0.1s, teardown slack 0.2s.
    let mut settings = test_settings();
    settings.arp_rate = 120.0;
    let mut engine = engine_with(&settings);

    engine.arp_start(&["G4", "C4", "E4"]); // unsorted on purpose

    // t=0: C4 (lowest) fires first
    engine.run_for(0.1);
    assert!(engine.voice("C4").is_some(), "C4 on at t=0");
    assert!(!engine.voice("C4").unwrap().released());
    assert!(engine.voice("E4").is_none());

    // t=0.45: C4 gate closed at 0.4
    engine.run_for(0.35);
    assert!(engine.voice("C4").unwrap().released(), "80% gate");

    // t=0.55: E4 on at 0.5
    engine.run_for(0.1);
    assert!(engine.voice("E4").is_some(), "E4 on at t=0.5");

    // t=0.75: C4 torn down (0.4 + 0.1 release + 0.2 slack)
    engine.run_for(0.2);
    assert!(engine.voice("C4").is_none(), "C4 gone after teardown");

    // t=1.05: G4 on at 1.0
    engine.run_for(0.3);
    assert!(engine.voice("G4").is_some(), "G4 on at t=1.0");

    // t=1.55: sequence wraps, C4 again
    engine.run_for(0.5);
    let c4 = engine.voice("C4").expect("C4 again at t=1.5");
    assert!(!c4.released(), "fresh C4 trigger");
}

#[test]
fn arp_stop_cancels_future_ticks_but_not_inflight_gate() {
    let mut settings = test_settings();
    settings.arp_rate = 120.0;
    let mut engine = engine_with(&settings);

    engine.arp_start(&["C4", "E4"]);
    engine.run_for(0.55); // C4 fired at 0, E4 at 0.5
    assert!(engine.voice("E4").is_some());

    engine.arp_stop();
    assert!(!engine.arp_running());

    // E4's own gate-off at t=0.9 still fires, and no new notes appear
    engine.run_for(0.4);
    assert!(engine.voice("E4").unwrap().released(), "in-flight gate fires");
    engine.run_for(1.0);
    assert_eq!(engine.live_voices(), 0, "no notes after stop");
}

#[test]
fn arp_start_while_running_swaps_notes_without_restarting() {
    let mut settings = test_settings();
    settings.arp_rate = 120.0;
    let mut engine = engine_with(&settings);

    engine.arp_start(&["C4"]);
    engine.run_for(0.1);

    // Swap the sequence mid-step: no extra tick fires before t=0.5
    engine.arp_start(&["D4", "F4"]);
    engine.run_for(0.2); // t=0.3
    assert!(engine.voice("D4").is_none(), "timing must not reset");
    assert!(engine.voice("F4").is_none());

    engine.run_for(0.25); // t=0.55, next scheduled tick was at 0.5
    assert!(
        engine.voice("D4").is_some() || engine.voice("F4").is_some(),
        "swapped sequence plays on the original grid"
    );
}

#[test]
fn arpeggiated_notes_use_fixed_low_velocity() {
    let mut settings = test_settings();
    settings.arp_rate = 60.0;
    let mut engine = engine_with(&settings);

    engine.arp_start(&["A4"]);
    engine.run_for(0.05);
    let voice = engine.voice("A4").unwrap();
    assert!((voice.velocity() - 0.3).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// 6. Modulation-route idempotence
// ---------------------------------------------------------------------------

#[test]
fn zero_amount_route_renders_identically_to_no_route() {
    let mut with_route = test_settings();
    with_route
        .mod_routes
        .push(ModRoute::new(ModSource::Lfo, ModDest::Cutoff, 0.0));
    let without = test_settings();

    let mut a = engine_with(&with_route);
    let mut b = engine_with(&without);
    a.note_on("A4", &with_route, DEFAULT_VELOCITY, DEFAULT_SLIDE);
    b.note_on("A4", &without, DEFAULT_VELOCITY, DEFAULT_SLIDE);

    let mut block_a = vec![0.0_f32; 4096];
    let mut block_b = vec![0.0_f32; 4096];
    a.render(&mut block_a);
    b.render(&mut block_b);

    for (i, (x, y)) in block_a.iter().zip(block_b.iter()).enumerate() {
        assert!(
            (x - y).abs() < 1e-7,
            "sample {i}: {x} vs {y} — zero-amount route left a residue"
        );
    }
}

#[test]
fn nonzero_route_changes_the_output() {
    let mut with_route = test_settings();
    with_route.lfo_rate = 8.0;
    with_route
        .mod_routes
        .push(ModRoute::new(ModSource::Lfo, ModDest::Cutoff, 0.9));
    let without = test_settings();

    let mut a = engine_with(&with_route);
    let mut b = engine_with(&without);
    a.note_on("A2", &with_route, DEFAULT_VELOCITY, DEFAULT_SLIDE);
    b.note_on("A2", &without, DEFAULT_VELOCITY, DEFAULT_SLIDE);

    let mut block_a = vec![0.0_f32; 9600];
    let mut block_b = vec![0.0_f32; 9600];
    a.render(&mut block_a);
    b.render(&mut block_b);

    let diff: f64 = block_a
        .iter()
        .zip(block_b.iter())
        .map(|(x, y)| f64::from((x - y).abs()))
        .sum();
    assert!(diff > 0.0, "an LFO→cutoff route must audibly modulate");
}

// ---------------------------------------------------------------------------
// 7. Gesture bridge through the engine
// ---------------------------------------------------------------------------

fn tracked_hand(x: f32, y: f32) -> HandPose {
    HandPose {
        x,
        y,
        active: true,
        is_pincer: false,
        is_closed: false,
    }
}

#[test]
fn gesture_pincer_drives_engine_sustain() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");

    let mut gesture = GestureState::default();
    gesture.right = HandPose {
        active: true,
        is_pincer: true,
        ..HandPose::default()
    };
    engine.apply_gesture(&gesture);
    assert!(engine.sustain());

    // Note-off during the pincer hold is deferred
    let held_settings = test_settings();
    engine.note_off("A4", &held_settings, false);
    assert!(engine.voice("A4").is_some());

    // Opening the hand lifts sustain and releases the flagged voice
    engine.apply_gesture(&GestureState::default());
    assert!(!engine.sustain());
    engine.run_for(f64::from(settings.release) + 0.25);
    assert_eq!(engine.live_voices(), 0);
}

#[test]
fn gesture_routes_rebroadcast_onto_live_voices() {
    let mut settings = test_settings();
    settings
        .mod_routes
        .push(ModRoute::new(ModSource::RightHandY, ModDest::Cutoff, 1.0));
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "A4");
    engine.run_for(0.02);

    let mut gesture = GestureState::default();
    gesture.right = tracked_hand(0.0, 1.0);
    engine.apply_gesture(&gesture);

    // The snapshot the engine now carries reflects the mapped cutoff;
    // rendering continues glitch-free
    engine.run_for(0.1);
    assert_eq!(engine.live_voices(), 1);
}

// ---------------------------------------------------------------------------
// 8. Renderer bookkeeping
// ---------------------------------------------------------------------------

#[test]
fn chord_renders_nonzero_energy() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    press(&mut engine, &settings, "C4");
    press(&mut engine, &settings, "E4");
    press(&mut engine, &settings, "G4");

    let mut block = vec![0.0_f32; 4096];
    engine.render(&mut block);

    let energy: f64 = block.iter().map(|s| f64::from(*s) * f64::from(*s)).sum();
    assert!(energy > 0.0, "chord should produce nonzero energy");
    assert!(block.iter().all(|s| s.is_finite()));
}

#[test]
fn rapid_retriggering_never_leaks_voices() {
    let settings = test_settings();
    let mut engine = engine_with(&settings);

    for _ in 0..20 {
        press(&mut engine, &settings, "C4");
        engine.run_for(0.01);
        engine.note_off("C4", &settings, false);
        engine.run_for(0.01);
    }

    // After every ramp and drain window has elapsed, nothing is left
    engine.run_for(1.0);
    assert_eq!(engine.live_voices(), 0);
}
