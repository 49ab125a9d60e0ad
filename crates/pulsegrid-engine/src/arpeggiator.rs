//! Scale-aware arpeggiator with latch, rhythm gating, and style presets

use pulsegrid_core::{detect_chord, quantize_to_scale, suggest_progression, Degree, DetectedChord, Scale};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::TriggerEvent;

/// Ordering strategy applied to held notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpMode {
    Up,
    Down,
    UpDown,
    DownUp,
    AsPlayed,
    Random,
    Chord,
    Intelligent,
    TensionRelease,
}

/// Rhythmic feel presets for the 16-step gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StylePreset {
    Straight,
    House,
    Trance,
    HipHop,
    DnB,
    Techno,
    Ambient,
    Jazz,
    Classical,
}

/// 16-step boolean gate with per-step velocity and gate-length shaping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmGate {
    pub steps: [bool; 16],
    /// Per-step velocity scaling (0.0-1.0)
    pub velocities: [f32; 16],
    /// Per-step gate-length scaling (0.0-1.0)
    pub gate_lengths: [f32; 16],
}

impl Default for RhythmGate {
    fn default() -> Self {
        Self {
            steps: [true; 16],
            velocities: [0.8; 16],
            gate_lengths: [0.8; 16],
        }
    }
}

impl RhythmGate {
    pub fn from_preset(preset: StylePreset) -> Self {
        let mut gate = Self {
            steps: [false; 16],
            ..Self::default()
        };

        match preset {
            StylePreset::House => {
                // Four-on-floor with offbeat 8ths
                for i in (0..16).step_by(2) {
                    gate.steps[i] = true;
                }
            }
            StylePreset::Trance => {
                // Driving 16ths, accented on the 8ths
                gate.steps = [true; 16];
                for i in (0..16).step_by(2) {
                    gate.velocities[i] = 1.0;
                }
            }
            StylePreset::HipHop => {
                for i in [0, 3, 6, 9, 12, 14] {
                    gate.steps[i] = true;
                }
            }
            StylePreset::DnB => {
                for i in 0..16 {
                    if i % 3 == 0 || i % 5 == 0 {
                        gate.steps[i] = true;
                    }
                }
            }
            StylePreset::Techno => {
                for i in (0..16).step_by(2) {
                    gate.steps[i] = true;
                }
            }
            StylePreset::Ambient => {
                for i in [0, 5, 10, 14] {
                    gate.steps[i] = true;
                }
                gate.gate_lengths = [1.0; 16];
            }
            StylePreset::Jazz => {
                for i in [0, 2, 6, 10, 12] {
                    gate.steps[i] = true;
                }
            }
            StylePreset::Classical | StylePreset::Straight => {
                gate.steps = [true; 16];
            }
        }

        gate
    }
}

/// Arpeggiator driven one audio block at a time by a tempo phase accumulator
///
/// Note intake and configuration regenerate the pitch sequence eagerly;
/// `process` only walks cursors and never reorders.
pub struct Arpeggiator {
    mode: ArpMode,
    scale: Scale,
    /// Root pitch class (0-11)
    root: u8,
    /// Octave spread (1-4)
    octave_range: u8,
    /// Note length as a fraction of a whole note (1/16 to 4/1)
    rate: f32,
    swing: f32,
    gate_length: f32,
    gate: RhythmGate,
    style: StylePreset,
    channel: u8,

    latch_enabled: bool,
    held_notes: Vec<u8>,
    latched_notes: Vec<u8>,

    sequence: Vec<u8>,
    sequence_cursor: usize,
    gate_step: usize,
    phase: f64,

    modulation_enabled: bool,
    /// External modulation scaling velocity (0-1)
    mod_intensity: f32,
    /// External modulation gating passing-tone density (0-1)
    mod_influence: f32,

    rng: fastrand::Rng,
}

impl Arpeggiator {
    pub fn new() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    /// Construct with a fixed RNG seed so Random mode is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self {
            mode: ArpMode::Up,
            scale: Scale::Major,
            root: 0,
            octave_range: 1,
            rate: 0.25,
            swing: 0.0,
            gate_length: 0.8,
            gate: RhythmGate::default(),
            style: StylePreset::Straight,
            channel: 1,
            latch_enabled: false,
            held_notes: Vec::new(),
            latched_notes: Vec::new(),
            sequence: Vec::new(),
            sequence_cursor: 0,
            gate_step: 0,
            phase: 0.0,
            modulation_enabled: false,
            mod_intensity: 0.5,
            mod_influence: 0.0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: ArpMode) {
        if self.mode != mode {
            self.mode = mode;
            self.regenerate();
        }
    }

    pub fn mode(&self) -> ArpMode {
        self.mode
    }

    pub fn set_scale(&mut self, scale: Scale) {
        if self.scale != scale {
            self.scale = scale;
            self.regenerate();
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn set_root(&mut self, root: u8) {
        self.root = root % 12;
        self.regenerate();
    }

    pub fn set_octave_range(&mut self, octaves: u8) {
        self.octave_range = octaves.clamp(1, 4);
        self.regenerate();
    }

    /// Note length as a fraction of a whole note, clamped to 1/16..4
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(0.0625, 4.0);
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.swing = swing.clamp(0.0, 1.0);
    }

    pub fn set_gate_length(&mut self, gate: f32) {
        self.gate_length = gate.clamp(0.0, 1.0);
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel.min(15);
    }

    pub fn set_rhythm_gate(&mut self, gate: RhythmGate) {
        self.gate = gate;
    }

    pub fn rhythm_gate(&self) -> &RhythmGate {
        &self.gate
    }

    /// Apply a style preset: reshapes the rhythm gate and the sequence
    /// modifiers
    pub fn set_style(&mut self, style: StylePreset) {
        if self.style != style {
            self.style = style;
            self.gate = RhythmGate::from_preset(style);
            self.regenerate();
        }
    }

    /// External modulation input, e.g. a performance-derived signal.
    /// Intensity scales velocity; influence gates passing-tone density.
    pub fn set_modulation(&mut self, intensity: f32, influence: f32) {
        self.mod_intensity = intensity.clamp(0.0, 1.0);
        self.mod_influence = influence.clamp(0.0, 1.0);
        if self.modulation_enabled {
            self.regenerate();
        }
    }

    pub fn set_modulation_enabled(&mut self, enabled: bool) {
        self.modulation_enabled = enabled;
        self.regenerate();
    }

    // ------------------------------------------------------------------
    // Note intake and latch
    // ------------------------------------------------------------------

    pub fn note_on(&mut self, note: u8, _velocity: u8) {
        if !self.held_notes.contains(&note) {
            self.held_notes.push(note);
        }
        if self.latch_enabled && !self.latched_notes.contains(&note) {
            self.latched_notes.push(note);
        }
        self.regenerate();
    }

    pub fn note_off(&mut self, note: u8) {
        self.held_notes.retain(|&n| n != note);
        if !self.latch_enabled {
            self.regenerate();
        }
    }

    pub fn set_latch_enabled(&mut self, enabled: bool) {
        self.latch_enabled = enabled;
        if !enabled {
            self.latched_notes.clear();
            self.regenerate();
        }
    }

    pub fn is_latch_enabled(&self) -> bool {
        self.latch_enabled
    }

    pub fn clear_latch(&mut self) {
        self.latched_notes.clear();
        self.regenerate();
    }

    pub fn reset(&mut self) {
        self.held_notes.clear();
        self.latched_notes.clear();
        self.sequence.clear();
        self.sequence_cursor = 0;
        self.gate_step = 0;
        self.phase = 0.0;
        debug!("Arpeggiator reset");
    }

    // ------------------------------------------------------------------
    // State queries
    // ------------------------------------------------------------------

    pub fn generated_sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn held_notes(&self) -> &[u8] {
        &self.held_notes
    }

    pub fn latched_notes(&self) -> &[u8] {
        &self.latched_notes
    }

    /// Chord detected from the active note source (display/suggestion only)
    pub fn detected_chord(&self) -> DetectedChord {
        detect_chord(self.active_notes())
    }

    pub fn suggested_progression(&self) -> &'static [Degree] {
        suggest_progression(self.detected_chord())
    }

    fn active_notes(&self) -> &[u8] {
        if self.latch_enabled && !self.latched_notes.is_empty() {
            &self.latched_notes
        } else {
            &self.held_notes
        }
    }

    // ------------------------------------------------------------------
    // Sequence generation
    // ------------------------------------------------------------------

    fn regenerate(&mut self) {
        let source = self.active_notes();
        if source.is_empty() {
            self.sequence.clear();
            self.sequence_cursor = 0;
            return;
        }

        // Quantize to the scale, de-duplicating while preserving
        // arrival order
        let mut quantized: Vec<u8> = Vec::with_capacity(source.len());
        for &note in source {
            let q = quantize_to_scale(note, self.root, self.scale);
            if !quantized.contains(&q) {
                quantized.push(q);
            }
        }

        let expanded_sorted = self.expand_octaves(&sorted(&quantized));
        let expanded_played = self.expand_octaves(&quantized);

        self.sequence = match self.mode {
            ArpMode::Up | ArpMode::Chord => expanded_sorted,
            ArpMode::Down => reversed(expanded_sorted),
            ArpMode::UpDown => up_down(expanded_sorted),
            ArpMode::DownUp => reversed(up_down(expanded_sorted)),
            ArpMode::AsPlayed => expanded_played,
            ArpMode::Random => self.with_random_repeats(expanded_sorted),
            ArpMode::Intelligent => self.with_passing_tones(&expanded_sorted),
            ArpMode::TensionRelease => tension_release(&expanded_sorted),
        };

        self.apply_style_modifiers();

        if self.sequence_cursor >= self.sequence.len() {
            self.sequence_cursor = 0;
        }
    }

    fn expand_octaves(&self, notes: &[u8]) -> Vec<u8> {
        let mut expanded = Vec::with_capacity(notes.len() * self.octave_range as usize);
        for oct in 0..self.octave_range as u16 {
            for &note in notes {
                expanded.push((note as u16 + oct * 12).min(127) as u8);
            }
        }
        expanded
    }

    /// Ascending base plus extra randomly repeated hits (not a shuffle)
    fn with_random_repeats(&mut self, mut notes: Vec<u8>) -> Vec<u8> {
        if notes.is_empty() {
            return notes;
        }
        let base_len = notes.len();
        for _ in 0..8 {
            let pick = notes[self.rng.usize(..base_len)];
            notes.push(pick);
        }
        notes
    }

    /// Ascending walk, inserting arithmetic-mean passing tones between
    /// consecutive notes while the external influence input exceeds 0.5
    fn with_passing_tones(&self, notes: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(notes.len() * 2);
        let insert = self.modulation_enabled && self.mod_influence > 0.5;

        for (i, &note) in notes.iter().enumerate() {
            if insert && i > 0 {
                result.push(((notes[i - 1] as u16 + note as u16) / 2) as u8);
            }
            result.push(note);
        }
        result
    }

    fn apply_style_modifiers(&mut self) {
        if self.sequence.is_empty() {
            return;
        }

        match self.style {
            StylePreset::Trance => {
                // Octave jump at the midpoint
                if self.sequence.len() > 2 {
                    let jump = (self.sequence[0] as u16 + 12).min(127) as u8;
                    let mid = self.sequence.len() / 2;
                    self.sequence.insert(mid, jump);
                }
            }
            StylePreset::Jazz => {
                // Chromatic approach tones into wide ascending intervals
                if let Some(&last) = self.sequence.last() {
                    if self.sequence.len() > 1 {
                        let mut decorated = Vec::with_capacity(self.sequence.len() * 2);
                        for window in self.sequence.windows(2) {
                            decorated.push(window[0]);
                            if window[1] > window[0] && window[1] - window[0] > 2 {
                                decorated.push(window[0] + 1);
                            }
                        }
                        decorated.push(last);
                        self.sequence = decorated;
                    }
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Block processing
    // ------------------------------------------------------------------

    /// Advance the tempo phase across one block, emitting a trigger when
    /// the phase crosses an integer boundary and the current gate slot
    /// is active
    pub fn process(&mut self, num_samples: u32, sample_rate: f64, bpm: f64) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        if self.sequence.is_empty() || num_samples == 0 || sample_rate <= 0.0 || bpm <= 0.0 {
            return events;
        }

        let beats_per_second = bpm / 60.0;
        let note_length_beats = self.rate as f64 * 4.0;
        let samples_per_note = note_length_beats / beats_per_second * sample_rate;
        let phase_increment = num_samples as f64 / samples_per_note;

        let previous = self.phase;
        self.phase += phase_increment;

        if (self.phase as u64) > (previous as u64) {
            // Offset of the integer crossing within this block
            let crossing = (previous as u64 + 1) as f64;
            let frac = ((crossing - previous) / phase_increment).clamp(0.0, 1.0);
            let mut offset = (frac * num_samples as f64).round() as u32;

            // Swing delays every other gate slot
            if self.swing > 0.0 && self.gate_step % 2 == 1 {
                offset += (self.swing as f64 * 0.5 * samples_per_note) as u32;
            }
            let offset = offset.min(num_samples - 1);

            if self.gate.steps[self.gate_step] {
                let slot_velocity = self.gate.velocities[self.gate_step];
                let slot_gate = self.gate.gate_lengths[self.gate_step];

                let mut velocity = slot_velocity;
                if self.modulation_enabled {
                    velocity *= 0.5 + self.mod_intensity * 0.5;
                }
                let velocity = (velocity * 127.0).clamp(1.0, 127.0) as u8;
                let duration = (slot_gate * self.gate_length) as f64 * samples_per_note;

                if self.mode == ArpMode::Chord {
                    for &note in &self.sequence {
                        events.push(TriggerEvent {
                            note,
                            velocity,
                            channel: self.channel,
                            sample_offset: offset,
                            note_on: true,
                            duration_samples: duration as f32,
                        });
                    }
                } else {
                    events.push(TriggerEvent {
                        note: self.sequence[self.sequence_cursor],
                        velocity,
                        channel: self.channel,
                        sample_offset: offset,
                        note_on: true,
                        duration_samples: duration as f32,
                    });
                }
            }

            // Cursors advance on every crossing, gated or not
            if self.mode != ArpMode::Chord {
                self.sequence_cursor = (self.sequence_cursor + 1) % self.sequence.len();
            }
            self.gate_step = (self.gate_step + 1) % 16;
        }

        events
    }
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted(notes: &[u8]) -> Vec<u8> {
    let mut out = notes.to_vec();
    out.sort_unstable();
    out
}

fn reversed(mut notes: Vec<u8>) -> Vec<u8> {
    notes.reverse();
    notes
}

/// Ascending then descending, de-duplicating the shared top/bottom notes
/// at the seam
fn up_down(up: Vec<u8>) -> Vec<u8> {
    let mut down: Vec<u8> = up.iter().rev().copied().collect();
    if !down.is_empty() && down.first() == up.last() {
        down.remove(0);
    }
    if !down.is_empty() && down.last() == up.first() {
        down.pop();
    }
    let mut out = up;
    out.extend(down);
    out
}

/// Full ascending pass then full descending pass (build then resolve)
fn tension_release(notes: &[u8]) -> Vec<u8> {
    let mut out = notes.to_vec();
    out.extend(notes.iter().rev());
    out
}
