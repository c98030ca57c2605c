//! Note names and the 12-tone equal temperament table.
//!
//! Note keys arrive as `<PitchClass><Octave>` strings (`"C4"`, `"C#4"`,
//! `"Db4"`); frequencies come from 12-TET relative to A4 = 440 Hz. Lookup of
//! an unknown name returns `None` — a missing frequency mapping must never
//! crash a live performance, so callers treat it as a silent no-op.

use libm::powf;

/// Lowest note the table knows (C0).
const MIN_SEMITONE: i32 = 12;
/// Highest note the table knows (B8).
const MAX_SEMITONE: i32 = 119;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Frequency in Hz for a note name, or `None` if the name is not in the
/// table.
///
/// ```
/// use gesto_core::notes::note_frequency;
///
/// let a4 = note_frequency("A4").unwrap();
/// assert!((a4 - 440.0).abs() < 0.01);
/// assert!(note_frequency("H4").is_none());
/// ```
pub fn note_frequency(name: &str) -> Option<f32> {
    let semitone = parse_semitone(name)?;
    Some(semitone_to_freq(semitone))
}

/// Shift a note name by whole octaves, staying within the table.
///
/// Flat spellings normalize to sharps (`"Db4"` shifted by 0 is `"C#4"`).
pub fn shift_octave(name: &str, octaves: i32) -> Option<String> {
    let semitone = parse_semitone(name)? + octaves * 12;
    if !(MIN_SEMITONE..=MAX_SEMITONE).contains(&semitone) {
        return None;
    }
    let pitch_class = (semitone % 12) as usize;
    let octave = semitone / 12 - 1;
    Some(format!("{}{}", SHARP_NAMES[pitch_class], octave))
}

/// Order notes by pitch; unknown names sort last.
pub fn pitch_order_key(name: &str) -> i32 {
    parse_semitone(name).unwrap_or(i32::MAX)
}

/// Convert cents to a frequency ratio (100 cents = 1 semitone).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    powf(2.0, cents / 1200.0)
}

/// Parse a note name to its MIDI-style semitone index (A4 = 69).
fn parse_semitone(name: &str) -> Option<i32> {
    let mut chars = name.chars();
    let letter = chars.next()?;
    let mut pitch_class = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest: String = chars.collect();
    let octave_str = if let Some(stripped) = rest.strip_prefix('#') {
        pitch_class += 1;
        stripped
    } else if let Some(stripped) = rest.strip_prefix('b') {
        pitch_class -= 1;
        stripped
    } else {
        rest.as_str()
    };

    let octave: i32 = octave_str.parse().ok()?;
    let semitone = pitch_class + (octave + 1) * 12;
    if (MIN_SEMITONE..=MAX_SEMITONE).contains(&semitone) {
        Some(semitone)
    } else {
        None
    }
}

fn semitone_to_freq(semitone: i32) -> f32 {
    440.0 * powf(2.0, (semitone - 69) as f32 / 12.0)
}
