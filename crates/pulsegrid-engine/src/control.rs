//! Command handoff between editing threads and the audio callback
//!
//! UI and MIDI-input threads never touch engine state directly; they send
//! commands through a bounded channel that the audio thread drains at the
//! top of each block, before `process` runs. The engines therefore always
//! see a consistent snapshot of authored data within a block.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use pulsegrid_core::{Pattern, Scale};
use thiserror::Error;
use tracing::warn;

use crate::arpeggiator::{ArpMode, Arpeggiator, RhythmGate, StylePreset};
use crate::transport::StepSequencer;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Command queue full")]
    QueueFull,
    #[error("Engine disconnected")]
    Disconnected,
}

/// Mutations accepted from outside the audio callback
#[derive(Debug, Clone)]
pub enum EngineCommand {
    // Transport
    Start,
    Stop,
    Pause,
    Resume,
    SetTempo(f64),
    LoadPattern(Box<Pattern>),

    // Step edits
    ToggleStep { track: usize, step: usize },
    SetStepVelocity { track: usize, step: usize, velocity: u8 },
    SetStepProbability { track: usize, step: usize, probability: f32 },
    SetStepRatchet { track: usize, step: usize, ratchet: u8 },
    SetStepNudge { track: usize, step: usize, nudge_ms: f32 },

    // Track and pattern operations
    MuteTrack { track: usize, muted: bool },
    SoloTrack { track: usize, solo: bool },
    ClearTrack(usize),
    ShiftPattern(i32),
    ReversePattern,
    RandomizePattern(f32),
    GenerateEuclidean { track: usize, hits: u8, steps: u8 },
    SetSwing(f32),
    SetDivision(u32),

    // Arpeggiator
    ArpNoteOn { note: u8, velocity: u8 },
    ArpNoteOff(u8),
    SetArpMode(ArpMode),
    SetArpScale(Scale),
    SetArpRoot(u8),
    SetArpOctaveRange(u8),
    SetArpRate(f32),
    SetArpSwing(f32),
    SetArpGateLength(f32),
    SetArpChannel(u8),
    SetArpRhythmGate(RhythmGate),
    SetArpLatch(bool),
    ClearArpLatch,
    SetArpStyle(StylePreset),
    SetArpModulationEnabled(bool),
    SetArpModulation { intensity: f32, influence: f32 },
}

/// Sender handle held by editing threads
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<EngineCommand>,
}

impl CommandSender {
    /// Non-blocking send; the editing side backs off when the audio
    /// thread falls behind
    pub fn send(&self, command: EngineCommand) -> Result<(), ControlError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ControlError::QueueFull,
            TrySendError::Disconnected(_) => ControlError::Disconnected,
        })
    }
}

/// Create a bounded command channel
pub fn command_channel(capacity: usize) -> (CommandSender, Receiver<EngineCommand>) {
    let (tx, rx) = bounded(capacity);
    (CommandSender { tx }, rx)
}

/// Drain all pending commands into the engines. Call at the start of each
/// audio block, before `process`.
pub fn apply_pending(
    rx: &Receiver<EngineCommand>,
    sequencer: &mut StepSequencer,
    arpeggiator: &mut Arpeggiator,
) {
    let mut applied = 0usize;
    for command in rx.try_iter() {
        apply_command(command, sequencer, arpeggiator);
        applied += 1;
    }
    // A deep backlog means the editing side is outrunning the audio thread
    if applied > 256 {
        warn!(applied, "Large command backlog drained in one block");
    }
}

fn apply_command(
    command: EngineCommand,
    sequencer: &mut StepSequencer,
    arpeggiator: &mut Arpeggiator,
) {
    match command {
        EngineCommand::Start => sequencer.start(),
        EngineCommand::Stop => sequencer.stop(),
        EngineCommand::Pause => sequencer.pause(),
        EngineCommand::Resume => sequencer.resume(),
        EngineCommand::SetTempo(bpm) => sequencer.set_tempo(bpm),
        EngineCommand::LoadPattern(pattern) => sequencer.set_pattern(*pattern),

        EngineCommand::ToggleStep { track, step } => sequencer.toggle_step(track, step),
        EngineCommand::SetStepVelocity { track, step, velocity } => {
            sequencer.set_step_velocity(track, step, velocity)
        }
        EngineCommand::SetStepProbability { track, step, probability } => {
            sequencer.set_step_probability(track, step, probability)
        }
        EngineCommand::SetStepRatchet { track, step, ratchet } => {
            sequencer.set_step_ratchet(track, step, ratchet)
        }
        EngineCommand::SetStepNudge { track, step, nudge_ms } => {
            sequencer.set_step_nudge(track, step, nudge_ms)
        }

        EngineCommand::MuteTrack { track, muted } => sequencer.mute_track(track, muted),
        EngineCommand::SoloTrack { track, solo } => sequencer.solo_track(track, solo),
        EngineCommand::ClearTrack(track) => sequencer.clear_track(track),
        EngineCommand::ShiftPattern(offset) => sequencer.shift_pattern(offset),
        EngineCommand::ReversePattern => sequencer.reverse_pattern(),
        EngineCommand::RandomizePattern(density) => sequencer.randomize_pattern(density),
        EngineCommand::GenerateEuclidean { track, hits, steps } => {
            sequencer.generate_euclidean(track, hits, steps)
        }
        EngineCommand::SetSwing(swing) => sequencer.set_swing(swing),
        EngineCommand::SetDivision(division) => sequencer.set_division(division),

        EngineCommand::ArpNoteOn { note, velocity } => arpeggiator.note_on(note, velocity),
        EngineCommand::ArpNoteOff(note) => arpeggiator.note_off(note),
        EngineCommand::SetArpMode(mode) => arpeggiator.set_mode(mode),
        EngineCommand::SetArpScale(scale) => arpeggiator.set_scale(scale),
        EngineCommand::SetArpRoot(root) => arpeggiator.set_root(root),
        EngineCommand::SetArpOctaveRange(octaves) => arpeggiator.set_octave_range(octaves),
        EngineCommand::SetArpRate(rate) => arpeggiator.set_rate(rate),
        EngineCommand::SetArpSwing(swing) => arpeggiator.set_swing(swing),
        EngineCommand::SetArpGateLength(gate) => arpeggiator.set_gate_length(gate),
        EngineCommand::SetArpChannel(channel) => arpeggiator.set_channel(channel),
        EngineCommand::SetArpRhythmGate(gate) => arpeggiator.set_rhythm_gate(gate),
        EngineCommand::SetArpLatch(enabled) => arpeggiator.set_latch_enabled(enabled),
        EngineCommand::ClearArpLatch => arpeggiator.clear_latch(),
        EngineCommand::SetArpStyle(style) => arpeggiator.set_style(style),
        EngineCommand::SetArpModulationEnabled(enabled) => {
            arpeggiator.set_modulation_enabled(enabled)
        }
        EngineCommand::SetArpModulation { intensity, influence } => {
            arpeggiator.set_modulation(intensity, influence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::SequencerConfig;

    fn engines() -> (StepSequencer, Arpeggiator) {
        let config = SequencerConfig::new(120.0, 48000).unwrap();
        (StepSequencer::with_seed(config, 1), Arpeggiator::with_seed(1))
    }

    #[test]
    fn commands_apply_before_processing() {
        let (seq_tx, rx) = command_channel(64);
        let (mut sequencer, mut arp) = engines();

        seq_tx.send(EngineCommand::ToggleStep { track: 0, step: 2 }).unwrap();
        seq_tx.send(EngineCommand::SetStepVelocity { track: 0, step: 2, velocity: 90 }).unwrap();
        seq_tx.send(EngineCommand::ArpNoteOn { note: 60, velocity: 100 }).unwrap();
        seq_tx.send(EngineCommand::Start).unwrap();

        apply_pending(&rx, &mut sequencer, &mut arp);

        assert!(sequencer.is_playing());
        assert!(sequencer.pattern().step(0, 2).active);
        assert_eq!(sequencer.pattern().step(0, 2).velocity, 90);
        assert_eq!(arp.generated_sequence(), &[60]);
    }

    #[test]
    fn commands_cross_threads() {
        let (tx, rx) = command_channel(64);
        let (mut sequencer, mut arp) = engines();

        let handle = std::thread::spawn(move || {
            tx.send(EngineCommand::SetTempo(90.0)).unwrap();
            tx.send(EngineCommand::MuteTrack { track: 1, muted: true }).unwrap();
        });
        handle.join().unwrap();

        apply_pending(&rx, &mut sequencer, &mut arp);
        assert_eq!(sequencer.config().bpm, 90.0);
        assert!(sequencer.pattern().track(1).muted);
    }

    #[test]
    fn bounded_queue_reports_backpressure() {
        let (tx, _rx) = command_channel(1);
        tx.send(EngineCommand::Stop).unwrap();
        assert!(matches!(
            tx.send(EngineCommand::Stop),
            Err(ControlError::QueueFull)
        ));
    }

    #[test]
    fn disconnected_receiver_is_reported() {
        let (tx, rx) = command_channel(4);
        drop(rx);
        assert!(matches!(
            tx.send(EngineCommand::Stop),
            Err(ControlError::Disconnected)
        ));
    }
}
