//! Trigger events emitted to the synthesis/MIDI-out layer

/// A note trigger with an intra-block sample offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    /// MIDI note number
    pub note: u8,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    /// Output MIDI channel
    pub channel: u8,
    /// Offset within the current block (0..block size)
    pub sample_offset: u32,
    pub note_on: bool,
    /// Note length in samples
    pub duration_samples: f32,
}
