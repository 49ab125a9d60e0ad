//! Pattern chaining (song mode)

use serde::{Deserialize, Serialize};

use crate::error::{PulsegridError, Result};

/// One chain slot: a pattern plus how many times it plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub pattern_index: usize,
    pub repeats: u32,
}

/// Ordered chain of patterns with per-entry repeat counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongChain {
    entries: Vec<ChainEntry>,
    current_entry: usize,
    current_repeat: u32,
    looping: bool,
}

impl Default for SongChain {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            current_entry: 0,
            current_repeat: 0,
            looping: true,
        }
    }
}

impl SongChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, pattern_index: usize, repeats: u32) {
        self.entries.push(ChainEntry {
            pattern_index,
            repeats: repeats.max(1),
        });
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<ChainEntry> {
        if index >= self.entries.len() {
            return Err(PulsegridError::ChainEntryOutOfRange(index));
        }
        let removed = self.entries.remove(index);
        if index < self.current_entry {
            // Playback position keeps pointing at the same entry
            self.current_entry -= 1;
        } else if index == self.current_entry {
            self.current_repeat = 0;
        }
        if self.current_entry >= self.entries.len() {
            self.current_entry = 0;
            self.current_repeat = 0;
        }
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_entry = 0;
        self.current_repeat = 0;
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Pattern index of the entry under the cursor (0 when the chain is empty)
    pub fn current_pattern(&self) -> usize {
        self.entries
            .get(self.current_entry)
            .map(|e| e.pattern_index)
            .unwrap_or(0)
    }

    pub fn current_entry(&self) -> usize {
        self.current_entry
    }

    pub fn current_repeat(&self) -> u32 {
        self.current_repeat
    }

    /// Advance past one pattern playthrough
    ///
    /// Counts off the current entry's repeats before moving on. Returns
    /// false once the final entry finishes with looping disabled, and
    /// keeps returning false until `reset()`.
    pub fn advance(&mut self) -> bool {
        if self.current_entry >= self.entries.len() {
            return false;
        }

        self.current_repeat += 1;
        if self.current_repeat >= self.entries[self.current_entry].repeats {
            self.current_repeat = 0;
            self.current_entry += 1;

            if self.current_entry >= self.entries.len() {
                if self.looping {
                    self.current_entry = 0;
                } else {
                    return false;
                }
            }
        }

        true
    }

    pub fn reset(&mut self) {
        self.current_entry = 0;
        self.current_repeat = 0;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_count_before_moving_on() {
        let mut chain = SongChain::new();
        chain.add_entry(0, 2);
        chain.add_entry(1, 1);

        assert_eq!(chain.current_pattern(), 0);
        assert!(chain.advance());
        assert_eq!(chain.current_pattern(), 0); // still on first entry
        assert!(chain.advance());
        assert_eq!(chain.current_pattern(), 1); // second repeat done, moved
    }

    #[test]
    fn end_of_song_without_loop() {
        let mut chain = SongChain::new();
        chain.set_loop(false);
        chain.add_entry(5, 1);
        chain.add_entry(7, 1);

        assert!(chain.advance());
        assert_eq!(chain.current_pattern(), 7);
        assert!(!chain.advance()); // past last entry
    }

    #[test]
    fn loops_back_to_first_entry() {
        let mut chain = SongChain::new();
        chain.add_entry(3, 1);
        chain.add_entry(4, 1);

        assert!(chain.advance());
        assert!(chain.advance());
        assert_eq!(chain.current_pattern(), 3);
    }

    #[test]
    fn reset_rewinds_cursor() {
        let mut chain = SongChain::new();
        chain.add_entry(0, 3);
        chain.advance();
        chain.advance();
        chain.reset();
        assert_eq!(chain.current_entry(), 0);
        assert_eq!(chain.current_repeat(), 0);
    }

    #[test]
    fn empty_chain_never_advances() {
        let mut chain = SongChain::new();
        assert!(!chain.advance());
        assert_eq!(chain.current_pattern(), 0);
    }

    #[test]
    fn advancing_past_end_of_song_stays_finished() {
        let mut chain = SongChain::new();
        chain.set_loop(false);
        chain.add_entry(2, 1);

        assert!(!chain.advance());
        // A host that keeps clocking pattern boundaries gets false again
        assert!(!chain.advance());
        assert!(!chain.advance());
        assert_eq!(chain.current_pattern(), 0);

        chain.reset();
        assert_eq!(chain.current_pattern(), 2);
        assert!(!chain.advance());
    }

    #[test]
    fn remove_before_cursor_preserves_position() {
        let mut chain = SongChain::new();
        chain.add_entry(10, 1);
        chain.add_entry(11, 1);
        chain.add_entry(12, 1);
        chain.advance(); // now on entry 1 (pattern 11)
        assert_eq!(chain.current_pattern(), 11);

        chain.remove_entry(0).unwrap();
        assert_eq!(chain.current_pattern(), 11);
        assert_eq!(chain.current_entry(), 0);

        // Removing the playing entry moves to its successor
        chain.remove_entry(0).unwrap();
        assert_eq!(chain.current_pattern(), 12);
        assert_eq!(chain.current_repeat(), 0);
    }

    #[test]
    fn remove_entry_bounds() {
        let mut chain = SongChain::new();
        chain.add_entry(1, 1);
        assert!(chain.remove_entry(3).is_err());
        assert!(chain.remove_entry(0).is_ok());
        assert!(chain.entries().is_empty());
    }

    #[test]
    fn zero_repeats_clamps_to_one() {
        let mut chain = SongChain::new();
        chain.add_entry(0, 0);
        assert_eq!(chain.entries()[0].repeats, 1);
    }
}
