//! pulsegrid-engine: Block-driven sequencing and arpeggiation engines
//!
//! Both engines are pull-based: the audio callback drains pending edit
//! commands, then asks each engine to process one block and schedules the
//! returned trigger events. Neither engine allocates on the hot path
//! beyond the event vector.

pub mod arpeggiator;
pub mod control;
pub mod event;
pub mod transport;

pub use arpeggiator::{ArpMode, Arpeggiator, RhythmGate, StylePreset};
pub use control::{apply_pending, command_channel, CommandSender, ControlError, EngineCommand};
pub use event::TriggerEvent;
pub use transport::{EngineError, SequencerConfig, StepSequencer, TransportState};
