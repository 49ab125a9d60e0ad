//! Algorithmic composition tools (Euclidean rhythms, scales, chord detection)

use serde::{Deserialize, Serialize};

// ============================================================================
// Euclidean Rhythm Generator
// ============================================================================

/// Generate a Euclidean rhythm pattern
///
/// Distributes `hits` as evenly as possible across `steps` using a running
/// accumulator: each position adds `hits` to a bucket and marks a hit when
/// the bucket reaches `steps`. Deterministic; always yields exactly
/// `hits.min(steps)` true values.
///
/// # Example
/// ```
/// use pulsegrid_core::euclidean_rhythm;
/// let pattern = euclidean_rhythm(8, 3, 0);
/// assert_eq!(pattern.iter().filter(|&&h| h).count(), 3);
/// ```
pub fn euclidean_rhythm(steps: u8, hits: u8, rotation: u8) -> Vec<bool> {
    if steps == 0 {
        return vec![];
    }

    let hits = hits.min(steps) as u32;
    let steps_total = steps as u32;

    let mut pattern = vec![false; steps as usize];
    let mut bucket = 0u32;

    for slot in pattern.iter_mut() {
        bucket += hits;
        if bucket >= steps_total {
            bucket -= steps_total;
            *slot = true;
        }
    }

    if rotation > 0 {
        let rot = (rotation as usize) % pattern.len();
        pattern.rotate_left(rot);
    }

    pattern
}

// ============================================================================
// Scales
// ============================================================================

/// Scale/mode types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Chromatic,
    Major,
    NaturalMinor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
    WholeTone,
    Diminished,
    Augmented,
    Spanish,
    Gypsy,
    Arabic,
    Persian,
}

impl Scale {
    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            Self::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Self::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            Self::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Self::MajorPentatonic => &[0, 2, 4, 7, 9],
            Self::MinorPentatonic => &[0, 3, 5, 7, 10],
            Self::Blues => &[0, 3, 5, 6, 7, 10],
            Self::WholeTone => &[0, 2, 4, 6, 8, 10],
            Self::Diminished => &[0, 2, 3, 5, 6, 8, 9, 11],
            Self::Augmented => &[0, 3, 4, 7, 8, 11],
            Self::Spanish => &[0, 1, 4, 5, 7, 8, 10],
            Self::Gypsy => &[0, 2, 3, 6, 7, 8, 11],
            Self::Arabic => &[0, 1, 4, 5, 7, 8, 11],
            Self::Persian => &[0, 1, 4, 5, 6, 8, 11],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chromatic => "Chromatic",
            Self::Major => "Major",
            Self::NaturalMinor => "Natural Minor",
            Self::HarmonicMinor => "Harmonic Minor",
            Self::MelodicMinor => "Melodic Minor",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::Aeolian => "Aeolian",
            Self::Locrian => "Locrian",
            Self::MajorPentatonic => "Major Pentatonic",
            Self::MinorPentatonic => "Minor Pentatonic",
            Self::Blues => "Blues",
            Self::WholeTone => "Whole Tone",
            Self::Diminished => "Diminished",
            Self::Augmented => "Augmented",
            Self::Spanish => "Spanish",
            Self::Gypsy => "Gypsy",
            Self::Arabic => "Arabic",
            Self::Persian => "Persian",
        }
    }
}

/// Get scale notes in an octave starting at `root`
pub fn scale_notes(root: u8, scale: Scale) -> Vec<u8> {
    scale
        .intervals()
        .iter()
        .map(|&interval| (root + interval).min(127))
        .collect()
}

/// Quantize a note to the nearest note of the scale at the same octave
///
/// Ties resolve toward the lowest scale interval index. A note already in
/// the scale comes back unchanged; Chromatic is the identity.
pub fn quantize_to_scale(note: u8, root: u8, scale: Scale) -> u8 {
    if scale == Scale::Chromatic {
        return note;
    }

    let octave = note / 12;
    let note_pc = (note % 12) as i16;
    let root_pc = root % 12;

    let mut min_dist = 12i16;
    let mut closest = 0u8;

    for &interval in scale.intervals() {
        let scale_pc = ((root_pc + interval) % 12) as i16;
        let dist = (note_pc - scale_pc).abs();
        if dist < min_dist {
            min_dist = dist;
            closest = interval;
        }
    }

    (octave * 12 + (root_pc + closest) % 12).min(127)
}

// ============================================================================
// Chord Detection
// ============================================================================

/// Triad quality detectable from a pitch-class set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }
}

/// Result of chord detection over held notes
///
/// `root` values are pitch classes (0-11). Display strings are a
/// presentation concern; `name()` is the only place they are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedChord {
    None,
    Single(u8),
    Interval,
    Triad { root: u8, quality: Option<ChordQuality> },
}

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl DetectedChord {
    pub fn name(&self) -> String {
        match self {
            Self::None => "None".to_string(),
            Self::Single(pc) => {
                format!("{} (single)", PITCH_CLASS_NAMES[(*pc % 12) as usize])
            }
            Self::Interval => "Interval".to_string(),
            Self::Triad { root, quality } => {
                let root_name = PITCH_CLASS_NAMES[(*root % 12) as usize];
                match quality {
                    Some(q) => format!("{} {}", root_name, q.name()),
                    None => format!("{} (unknown)", root_name),
                }
            }
        }
    }
}

/// Detect a chord from a set of MIDI notes
///
/// Notes collapse to pitch classes; the lowest class is taken as root.
/// Major = root + major third + fifth, Minor = root + minor third + fifth.
pub fn detect_chord(notes: &[u8]) -> DetectedChord {
    if notes.is_empty() {
        return DetectedChord::None;
    }
    if notes.len() == 1 {
        return DetectedChord::Single(notes[0] % 12);
    }

    let mut classes: Vec<u8> = Vec::with_capacity(notes.len());
    for &note in notes {
        let pc = note % 12;
        if !classes.contains(&pc) {
            classes.push(pc);
        }
    }
    classes.sort_unstable();

    if classes.len() < 3 {
        return DetectedChord::Interval;
    }

    let root = classes[0];
    let has_major_third = classes.contains(&((root + 4) % 12));
    let has_minor_third = classes.contains(&((root + 3) % 12));
    let has_fifth = classes.contains(&((root + 7) % 12));

    let quality = if has_major_third && has_fifth {
        Some(ChordQuality::Major)
    } else if has_minor_third && has_fifth {
        Some(ChordQuality::Minor)
    } else {
        None
    };

    DetectedChord::Triad { root, quality }
}

/// Scale degrees for progression suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Degree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

/// Suggest common follow-up degrees for the detected chord
pub fn suggest_progression(chord: DetectedChord) -> &'static [Degree] {
    match chord {
        DetectedChord::Triad {
            quality: Some(ChordQuality::Major),
            ..
        } => &[Degree::IV, Degree::V, Degree::VI, Degree::II],
        DetectedChord::Triad {
            quality: Some(ChordQuality::Minor),
            ..
        } => &[Degree::VI, Degree::III, Degree::VII, Degree::IV],
        _ => &[Degree::I, Degree::IV, Degree::V, Degree::VI],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_classic_patterns() {
        let tresillo = euclidean_rhythm(8, 3, 0);
        assert_eq!(tresillo.iter().filter(|&&h| h).count(), 3);

        let four_on_floor = euclidean_rhythm(16, 4, 0);
        assert_eq!(four_on_floor.iter().filter(|&&h| h).count(), 4);
        // Evenly spaced: every 4th step
        let hits: Vec<usize> = four_on_floor
            .iter()
            .enumerate()
            .filter_map(|(i, &h)| h.then_some(i))
            .collect();
        assert_eq!(hits[1] - hits[0], 4);
        assert_eq!(hits[2] - hits[1], 4);
        assert_eq!(hits[3] - hits[2], 4);
    }

    #[test]
    fn euclidean_counts_and_gap_spread() {
        for steps in 1u8..=64 {
            for hits in 0..=steps {
                let pattern = euclidean_rhythm(steps, hits, 0);
                let count = pattern.iter().filter(|&&h| h).count();
                assert_eq!(count, hits as usize, "steps={steps} hits={hits}");

                if hits >= 2 {
                    let positions: Vec<usize> = pattern
                        .iter()
                        .enumerate()
                        .filter_map(|(i, &h)| h.then_some(i))
                        .collect();
                    let mut gaps: Vec<usize> = positions
                        .windows(2)
                        .map(|w| w[1] - w[0])
                        .collect();
                    // Cyclic wrap gap
                    gaps.push(steps as usize - positions.last().unwrap() + positions[0]);
                    let min = gaps.iter().min().unwrap();
                    let max = gaps.iter().max().unwrap();
                    assert!(max - min <= 1, "steps={steps} hits={hits} gaps={gaps:?}");
                }
            }
        }
    }

    #[test]
    fn euclidean_edges() {
        assert!(euclidean_rhythm(0, 3, 0).is_empty());
        assert_eq!(euclidean_rhythm(4, 0, 0), vec![false; 4]);
        assert_eq!(euclidean_rhythm(4, 4, 0), vec![true; 4]);
        // hits beyond steps clamp to all-on
        assert_eq!(euclidean_rhythm(4, 9, 0), vec![true; 4]);
    }

    #[test]
    fn euclidean_rotation() {
        let base = euclidean_rhythm(8, 3, 0);
        let mut rotated = base.clone();
        rotated.rotate_left(2);
        assert_eq!(euclidean_rhythm(8, 3, 2), rotated);
    }

    #[test]
    fn quantize_scale_members_round_trip() {
        for &interval in Scale::Major.intervals() {
            let note = 60 + interval;
            assert_eq!(quantize_to_scale(note, 0, Scale::Major), note);
        }
    }

    #[test]
    fn quantize_snaps_with_low_index_tie_break() {
        // C# is equidistant from C and D; C (interval 0) wins
        assert_eq!(quantize_to_scale(61, 0, Scale::Major), 60);
        // F# equidistant from F and G; F wins
        assert_eq!(quantize_to_scale(66, 0, Scale::Major), 65);
    }

    #[test]
    fn quantize_chromatic_is_identity() {
        for note in 0u8..=127 {
            assert_eq!(quantize_to_scale(note, 5, Scale::Chromatic), note);
        }
    }

    #[test]
    fn scale_table_interval_sanity() {
        // Every scale starts on the root and stays within one octave
        for scale in [
            Scale::Major,
            Scale::NaturalMinor,
            Scale::Blues,
            Scale::Persian,
            Scale::Diminished,
        ] {
            let intervals = scale.intervals();
            assert_eq!(intervals[0], 0);
            assert!(intervals.iter().all(|&i| i < 12));
            assert!(intervals.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn detect_major_and_minor_triads() {
        assert_eq!(
            detect_chord(&[60, 64, 67]),
            DetectedChord::Triad { root: 0, quality: Some(ChordQuality::Major) }
        );
        assert_eq!(
            detect_chord(&[60, 63, 67]),
            DetectedChord::Triad { root: 0, quality: Some(ChordQuality::Minor) }
        );
        assert_eq!(detect_chord(&[]), DetectedChord::None);
        assert_eq!(detect_chord(&[72]), DetectedChord::Single(0));
        assert_eq!(detect_chord(&[60, 67]), DetectedChord::Interval);
        // Cluster with no recognizable third/fifth
        assert_eq!(
            detect_chord(&[60, 61, 62]),
            DetectedChord::Triad { root: 0, quality: None }
        );
    }

    #[test]
    fn chord_names_at_presentation_boundary() {
        let chord = detect_chord(&[62, 65, 69]);
        assert_eq!(chord.name(), "D Minor");
    }
}
