//! Error types for pulsegrid

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PulsegridError {
    #[error("Pattern slot out of range: {0}")]
    PatternSlotOutOfRange(usize),
    #[error("Chain entry out of range: {0}")]
    ChainEntryOutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, PulsegridError>;
