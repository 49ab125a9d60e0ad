//! Block-driven step sequencer engine

use pulsegrid_core::{euclidean_rhythm, Pattern, PatternBank, Step};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::event::TriggerEvent;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),
}

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Tempo and sample-rate context for block processing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    pub bpm: f64,
    pub sample_rate: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            sample_rate: 44100,
        }
    }
}

impl SequencerConfig {
    pub fn new(bpm: f64, sample_rate: u32) -> Result<Self, EngineError> {
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(EngineError::InvalidTempo(bpm));
        }
        if sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        Ok(Self { bpm, sample_rate })
    }
}

/// Step sequencer driven one audio block at a time
///
/// Owns its run-time cursors (current step, intra-step sample counter) and
/// only reads the authored pattern during `process`. All edit operations
/// sanitize their inputs; the block path never validates.
pub struct StepSequencer {
    config: SequencerConfig,
    pattern: Pattern,
    state: TransportState,
    current_step: usize,
    sample_counter: u32,
    samples_per_step: u32,
    rng: fastrand::Rng,
    on_step_changed: Option<Box<dyn FnMut(usize) + Send>>,
}

impl StepSequencer {
    pub fn new(config: SequencerConfig) -> Self {
        Self::with_seed(config, fastrand::u64(..))
    }

    /// Construct with a fixed RNG seed so probability draws are reproducible
    pub fn with_seed(config: SequencerConfig, seed: u64) -> Self {
        let mut engine = Self {
            config,
            pattern: Pattern::default_kit(),
            state: TransportState::Stopped,
            current_step: 0,
            sample_counter: 0,
            samples_per_step: 1,
            rng: fastrand::Rng::with_seed(seed),
            on_step_changed: None,
        };
        engine.calculate_timing();
        engine
    }

    pub fn config(&self) -> SequencerConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SequencerConfig) {
        self.config = config;
        self.calculate_timing();
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm.is_finite() {
            self.config.bpm = bpm.clamp(1.0, 999.0);
            self.calculate_timing();
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn set_pattern(&mut self, pattern: Pattern) {
        self.pattern = pattern;
        self.current_step %= self.pattern.num_steps();
        self.calculate_timing();
    }

    pub fn set_division(&mut self, division: u32) {
        self.pattern.set_division(division);
        self.calculate_timing();
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.pattern.set_swing(swing);
    }

    /// Notification fired whenever the step cursor advances
    pub fn set_on_step_changed(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.on_step_changed = Some(Box::new(callback));
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    pub fn start(&mut self) {
        self.state = TransportState::Playing;
        self.current_step = 0;
        self.sample_counter = 0;
        info!(bpm = self.config.bpm, "Sequencer started");
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.current_step = 0;
        self.sample_counter = 0;
        info!("Sequencer stopped");
    }

    /// Pause, preserving the step cursor
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TransportState::Paused {
            self.state = TransportState::Playing;
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn set_current_step(&mut self, step: usize) {
        self.current_step = step % self.pattern.num_steps();
    }

    pub fn samples_per_step(&self) -> u32 {
        self.samples_per_step
    }

    // ------------------------------------------------------------------
    // Block processing
    // ------------------------------------------------------------------

    /// Process one audio block, emitting trigger events for every step
    /// boundary that falls inside it
    ///
    /// Each step triggers at its first sample, so splitting a span into
    /// smaller blocks yields the same events at the same absolute offsets.
    /// Swing, nudge and ratchet displacements are clamped to the block.
    pub fn process(&mut self, num_samples: u32) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        if self.state != TransportState::Playing || num_samples == 0 {
            return events;
        }

        let any_solo = self.pattern.any_solo();
        let mut processed = 0u32;

        while processed < num_samples {
            if self.sample_counter == 0 {
                self.trigger_step(processed, num_samples, any_solo, &mut events);
            }

            let remaining_in_step = self.samples_per_step - self.sample_counter;
            let span = remaining_in_step.min(num_samples - processed);
            self.sample_counter += span;
            processed += span;

            if self.sample_counter >= self.samples_per_step {
                self.sample_counter = 0;
                self.current_step = (self.current_step + 1) % self.pattern.num_steps();
                if let Some(callback) = self.on_step_changed.as_mut() {
                    callback(self.current_step);
                }
            }
        }

        events
    }

    fn trigger_step(
        &mut self,
        boundary_offset: u32,
        num_samples: u32,
        any_solo: bool,
        events: &mut Vec<TriggerEvent>,
    ) {
        let step_index = self.current_step;
        let swing_offset = if step_index % 2 == 1 {
            (self.pattern.swing() as f64 / 100.0 * self.samples_per_step as f64 * 0.5) as i64
        } else {
            0
        };

        for t in 0..self.pattern.num_tracks() {
            let track = &self.pattern.tracks[t];
            if track.muted || (any_solo && !track.solo) {
                continue;
            }

            let step = track.steps[step_index];
            let base_note = track.base_note;
            let channel = track.channel;
            if !self.should_trigger(&step) {
                continue;
            }

            let note = (base_note as i16 + step.pitch_offset as i16).clamp(0, 127) as u8;
            let velocity = if step.accent { 127 } else { step.velocity };
            let nudge_offset =
                (step.nudge_ms as f64 * self.config.sample_rate as f64 / 1000.0) as i64;
            let duration =
                (self.samples_per_step / step.ratchet as u32) as f32 * step.decay;

            for r in 0..step.ratchet as u32 {
                let ratchet_offset = (r * self.samples_per_step) / step.ratchet as u32;
                let offset = (boundary_offset as i64
                    + ratchet_offset as i64
                    + swing_offset
                    + nudge_offset)
                    .clamp(0, num_samples as i64 - 1) as u32;

                events.push(TriggerEvent {
                    note,
                    velocity,
                    channel,
                    sample_offset: offset,
                    note_on: true,
                    duration_samples: duration,
                });
            }
        }
    }

    fn should_trigger(&mut self, step: &Step) -> bool {
        if !step.active {
            return false;
        }
        if step.probability >= 1.0 {
            return true;
        }
        self.rng.f32() < step.probability
    }

    fn calculate_timing(&mut self) {
        let steps_per_beat = self.pattern.division() as f64 / 4.0;
        let samples = (60.0 / self.config.bpm) * self.config.sample_rate as f64 / steps_per_beat;
        self.samples_per_step = (samples as u32).max(1);
    }

    // ------------------------------------------------------------------
    // Edit operations (sanitized at the boundary)
    // ------------------------------------------------------------------

    pub fn toggle_step(&mut self, track: usize, step: usize) {
        let s = self.pattern.step_mut(track, step);
        s.active = !s.active;
    }

    pub fn set_step_velocity(&mut self, track: usize, step: usize, velocity: u8) {
        self.pattern.step_mut(track, step).set_velocity(velocity);
    }

    pub fn set_step_probability(&mut self, track: usize, step: usize, probability: f32) {
        self.pattern.step_mut(track, step).set_probability(probability);
    }

    pub fn set_step_ratchet(&mut self, track: usize, step: usize, ratchet: u8) {
        self.pattern.step_mut(track, step).set_ratchet(ratchet);
    }

    pub fn set_step_nudge(&mut self, track: usize, step: usize, nudge_ms: f32) {
        self.pattern.step_mut(track, step).set_nudge_ms(nudge_ms);
    }

    pub fn mute_track(&mut self, track: usize, muted: bool) {
        self.pattern.track_mut(track).muted = muted;
    }

    pub fn solo_track(&mut self, track: usize, solo: bool) {
        self.pattern.track_mut(track).solo = solo;
    }

    pub fn clear_track(&mut self, track: usize) {
        self.pattern.track_mut(track).clear();
    }

    pub fn shift_pattern(&mut self, offset: i32) {
        self.pattern.shift(offset);
    }

    pub fn reverse_pattern(&mut self) {
        self.pattern.reverse();
    }

    /// Randomize step activation at the given density, with varied velocities
    pub fn randomize_pattern(&mut self, density: f32) {
        let density = density.clamp(0.0, 1.0);
        for t in 0..self.pattern.num_tracks() {
            for i in 0..self.pattern.num_steps() {
                let active = self.rng.f32() < density;
                let step = self.pattern.step_mut(t, i);
                step.active = active;
                if active {
                    step.velocity = 80 + self.rng.u8(..48);
                }
            }
        }
    }

    /// Replace a track's rhythm with a Euclidean distribution of `hits`
    /// over `steps`, where `steps` is clamped to the pattern's active
    /// step count so every hit lands inside the playing region
    pub fn generate_euclidean(&mut self, track: usize, hits: u8, steps: u8) {
        let steps = steps.min(self.pattern.num_steps() as u8);
        let rhythm = euclidean_rhythm(steps, hits, 0);
        self.pattern.track_mut(track).apply_rhythm(&rhythm);
    }

    pub fn load_pattern(&mut self, bank: &PatternBank, slot: usize) {
        let pattern = bank.pattern(slot).clone();
        debug!(slot, name = %pattern.name, "Pattern loaded");
        self.set_pattern(pattern);
    }

    pub fn save_pattern(&self, bank: &mut PatternBank, slot: usize) {
        bank.save_pattern(slot, &self.pattern);
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}
