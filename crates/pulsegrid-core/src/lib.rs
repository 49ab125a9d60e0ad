//! pulsegrid-core: Domain types for the pulsegrid sequencing engine

pub mod algorithms;
mod error;
pub mod pattern;
pub mod song;

pub use algorithms::{
    detect_chord, euclidean_rhythm, quantize_to_scale, scale_notes, suggest_progression,
    ChordQuality, Degree, DetectedChord, Scale,
};
pub use error::{PulsegridError, Result};
pub use pattern::{Pattern, PatternBank, Step, Track, MAX_PATTERNS, MAX_RATCHET, MAX_STEPS, MAX_TRACKS};
pub use song::{ChainEntry, SongChain};
