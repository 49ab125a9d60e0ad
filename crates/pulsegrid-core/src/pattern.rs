//! Step/track/pattern data model for grid sequencing

use serde::{Deserialize, Serialize};

/// Maximum steps per track
pub const MAX_STEPS: usize = 64;
/// Maximum tracks per pattern
pub const MAX_TRACKS: usize = 16;
/// Maximum pattern slots in a bank
pub const MAX_PATTERNS: usize = 64;
/// Maximum ratchet subdivisions per step
pub const MAX_RATCHET: u8 = 4;

/// A single schedulable step in a track's grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub active: bool,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    /// Chance of playing (0.0-1.0)
    pub probability: f32,
    /// Number of hits within the step (1-4)
    pub ratchet: u8,
    /// Timing offset in milliseconds (-50 to +50)
    pub nudge_ms: f32,
    /// Pitch offset from the track's base note, in semitones
    pub pitch_offset: i8,
    /// Note duration multiplier
    pub decay: f32,
    pub accent: bool,
    /// 303-style slide into the next step
    pub slide: bool,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            velocity: 100,
            probability: 1.0,
            ratchet: 1,
            nudge_ms: 0.0,
            pitch_offset: 0,
            decay: 1.0,
            accent: false,
            slide: false,
        }
    }
}

impl Step {
    pub fn set_velocity(&mut self, velocity: u8) {
        self.velocity = velocity.min(127);
    }

    pub fn set_probability(&mut self, probability: f32) {
        self.probability = probability.clamp(0.0, 1.0);
    }

    pub fn set_ratchet(&mut self, ratchet: u8) {
        self.ratchet = ratchet.clamp(1, MAX_RATCHET);
    }

    pub fn set_nudge_ms(&mut self, nudge_ms: f32) {
        self.nudge_ms = nudge_ms.clamp(-50.0, 50.0);
    }
}

/// A row of steps plus identity and mix attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// Base MIDI note triggered by this track
    pub base_note: u8,
    /// Output MIDI channel
    pub channel: u8,
    /// Volume (0.0 to 1.0+)
    pub volume: f32,
    /// Pan (-1.0 left, 0.0 center, 1.0 right)
    pub pan: f32,
    pub muted: bool,
    pub solo: bool,
    /// Display color (ARGB), presentation only
    pub color: u32,
    /// Always exactly `MAX_STEPS` long
    pub steps: Vec<Step>,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            name: "Track".to_string(),
            base_note: 36,
            channel: 10,
            volume: 1.0,
            pan: 0.0,
            muted: false,
            solo: false,
            color: 0xFF4A9EFF,
            steps: vec![Step::default(); MAX_STEPS],
        }
    }
}

impl Track {
    pub fn clear(&mut self) {
        self.steps.fill(Step::default());
    }

    /// Write a boolean rhythm into the step grid, activating hits at
    /// velocity 100 and clearing the rest
    pub fn apply_rhythm(&mut self, rhythm: &[bool]) {
        self.clear();
        for (step, &hit) in self.steps.iter_mut().zip(rhythm) {
            step.active = hit;
            if hit {
                step.velocity = 100;
            }
        }
    }
}

/// A grid of up to 16 tracks by 64 steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    /// Active steps (1-64)
    num_steps: usize,
    /// Active tracks (1-16)
    num_tracks: usize,
    /// Swing amount (0-100%)
    swing: f32,
    /// Steps per bar (16 = 16th notes)
    division: u32,
    pub tracks: [Track; MAX_TRACKS],
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            name: "Pattern".to_string(),
            num_steps: 16,
            num_tracks: 8,
            swing: 0.0,
            division: 16,
            tracks: std::array::from_fn(|_| Track::default()),
        }
    }
}

impl Pattern {
    /// Standard GM drum kit layout across all 16 tracks
    pub fn default_kit() -> Self {
        const KIT: [(&str, u8, u32); MAX_TRACKS] = [
            ("Kick", 36, 0xFFFF6B6B),
            ("Snare", 38, 0xFF4ECDC4),
            ("Closed HH", 42, 0xFFFFE66D),
            ("Open HH", 46, 0xFFFFA07A),
            ("Low Tom", 45, 0xFF98D8C8),
            ("Mid Tom", 47, 0xFFF7DC6F),
            ("High Tom", 50, 0xFFBB8FCE),
            ("Crash", 49, 0xFF85C1E9),
            ("Ride", 51, 0xFFABEBC6),
            ("Clap", 39, 0xFFF5B7B1),
            ("Rimshot", 37, 0xFFD7BDE2),
            ("Cowbell", 56, 0xFFFAD7A0),
            ("Tambourine", 54, 0xFFA9CCE3),
            ("Shaker", 70, 0xFFD5F5E3),
            ("Perc 1", 60, 0xFFE8DAEF),
            ("Perc 2", 61, 0xFFFDEBD0),
        ];

        let mut pattern = Self::default();
        for (track, &(name, note, color)) in pattern.tracks.iter_mut().zip(&KIT) {
            track.name = name.to_string();
            track.base_note = note;
            track.color = color;
            track.channel = 10;
        }
        pattern
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    pub fn division(&self) -> u32 {
        self.division
    }

    /// Set active step count (clamped to 1-64)
    pub fn set_num_steps(&mut self, num_steps: usize) {
        self.num_steps = num_steps.clamp(1, MAX_STEPS);
    }

    /// Set active track count (clamped to 1-16)
    pub fn set_num_tracks(&mut self, num_tracks: usize) {
        self.num_tracks = num_tracks.clamp(1, MAX_TRACKS);
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.swing = swing.clamp(0.0, 100.0);
    }

    pub fn set_division(&mut self, division: u32) {
        self.division = division.max(1);
    }

    /// Track access, index clamped to the last track
    pub fn track(&self, index: usize) -> &Track {
        &self.tracks[index.min(MAX_TRACKS - 1)]
    }

    pub fn track_mut(&mut self, index: usize) -> &mut Track {
        &mut self.tracks[index.min(MAX_TRACKS - 1)]
    }

    /// Step access, both indices clamped
    pub fn step(&self, track: usize, step: usize) -> &Step {
        &self.track(track).steps[step.min(MAX_STEPS - 1)]
    }

    pub fn step_mut(&mut self, track: usize, step: usize) -> &mut Step {
        &mut self.track_mut(track).steps[step.min(MAX_STEPS - 1)]
    }

    pub fn clear(&mut self) {
        for track in &mut self.tracks {
            track.clear();
        }
    }

    /// Rotate every track's active region by `offset` steps (wrapping)
    pub fn shift(&mut self, offset: i32) {
        let len = self.num_steps as i32;
        for track in &mut self.tracks {
            let original = track.steps.clone();
            for i in 0..self.num_steps {
                let new_pos = ((i as i32 + offset) % len + len) % len;
                track.steps[new_pos as usize] = original[i];
            }
        }
    }

    /// Reverse every track's active region in place
    pub fn reverse(&mut self) {
        for track in &mut self.tracks {
            track.steps[..self.num_steps].reverse();
        }
    }

    /// True if any track is soloed, which gates playback to soloed tracks
    pub fn any_solo(&self) -> bool {
        self.tracks[..self.num_tracks].iter().any(|t| t.solo)
    }
}

/// Fixed-capacity bank of 64 named patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternBank {
    patterns: Vec<Pattern>,
}

impl Default for PatternBank {
    fn default() -> Self {
        let patterns = (0..MAX_PATTERNS)
            .map(|i| {
                let mut p = Pattern::default();
                p.name = format!("Pattern {}", i + 1);
                p
            })
            .collect();
        Self { patterns }
    }
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_pattern(&mut self, slot: usize, pattern: &Pattern) {
        if slot < MAX_PATTERNS {
            self.patterns[slot] = pattern.clone();
        }
    }

    /// Fallible slot access for host-facing code that wants errors
    /// instead of clamping
    pub fn try_pattern(&self, slot: usize) -> crate::error::Result<&Pattern> {
        self.patterns
            .get(slot)
            .ok_or(crate::error::PulsegridError::PatternSlotOutOfRange(slot))
    }

    /// Slot access, index clamped to the last slot
    pub fn pattern(&self, slot: usize) -> &Pattern {
        &self.patterns[slot.min(MAX_PATTERNS - 1)]
    }

    pub fn pattern_mut(&mut self, slot: usize) -> &mut Pattern {
        &mut self.patterns[slot.min(MAX_PATTERNS - 1)]
    }

    pub fn copy_pattern(&mut self, from: usize, to: usize) {
        if from < MAX_PATTERNS && to < MAX_PATTERNS && from != to {
            self.patterns[to] = self.patterns[from].clone();
        }
    }

    pub fn clear_pattern(&mut self, slot: usize) {
        if slot < MAX_PATTERNS {
            self.patterns[slot].clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_setters_clamp() {
        let mut step = Step::default();
        step.set_velocity(200);
        assert_eq!(step.velocity, 127);
        step.set_probability(1.5);
        assert_eq!(step.probability, 1.0);
        step.set_probability(-0.5);
        assert_eq!(step.probability, 0.0);
        step.set_ratchet(9);
        assert_eq!(step.ratchet, 4);
        step.set_ratchet(0);
        assert_eq!(step.ratchet, 1);
        step.set_nudge_ms(99.0);
        assert_eq!(step.nudge_ms, 50.0);
    }

    #[test]
    fn pattern_dimensions_clamp() {
        let mut pattern = Pattern::default();
        pattern.set_num_steps(0);
        assert_eq!(pattern.num_steps(), 1);
        pattern.set_num_steps(100);
        assert_eq!(pattern.num_steps(), 64);
        pattern.set_num_tracks(0);
        assert_eq!(pattern.num_tracks(), 1);
        pattern.set_num_tracks(32);
        assert_eq!(pattern.num_tracks(), 16);
        pattern.set_swing(150.0);
        assert_eq!(pattern.swing(), 100.0);
    }

    #[test]
    fn step_access_never_panics() {
        let mut pattern = Pattern::default();
        pattern.step_mut(99, 999).active = true;
        assert!(pattern.step(15, 63).active);
    }

    #[test]
    fn shift_wraps_steps() {
        let mut pattern = Pattern::default();
        pattern.set_num_steps(4);
        pattern.step_mut(0, 0).active = true;
        pattern.shift(-1);
        assert!(pattern.step(0, 3).active);
        assert!(!pattern.step(0, 0).active);
        pattern.shift(1);
        assert!(pattern.step(0, 0).active);
    }

    #[test]
    fn reverse_flips_active_region() {
        let mut pattern = Pattern::default();
        pattern.set_num_steps(8);
        pattern.step_mut(0, 1).active = true;
        pattern.reverse();
        assert!(pattern.step(0, 6).active);
        assert!(!pattern.step(0, 1).active);
    }

    #[test]
    fn bank_save_copy_clear() {
        let mut bank = PatternBank::new();
        let mut pattern = Pattern::default();
        pattern.step_mut(0, 0).active = true;
        bank.save_pattern(3, &pattern);
        assert!(bank.pattern(3).step(0, 0).active);

        bank.copy_pattern(3, 10);
        assert!(bank.pattern(10).step(0, 0).active);

        bank.clear_pattern(3);
        assert!(!bank.pattern(3).step(0, 0).active);
        // Names survive clearing
        assert_eq!(bank.pattern(3).name, "Pattern 4");
    }
}
