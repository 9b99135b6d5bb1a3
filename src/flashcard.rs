//! Flashcard screen state machine.

use crate::models::{StudySet, VocabEntry};
use std::time::{Duration, Instant};

/// Delay between resetting the flip and moving to the neighbor card,
/// so the card is seen front-side-up before its text changes.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(150);

/// Which side of the card is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    target: usize,
    due: Instant,
}

/// Flashcard deck state. The index always stays within the deck; moves
/// past either end are ignored rather than wrapping.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    set: StudySet,
    index: usize,
    face: Face,
    pending: Option<PendingMove>,
}

impl FlashcardDeck {
    pub fn new(set: StudySet) -> Self {
        Self {
            set,
            index: 0,
            face: Face::Front,
            pending: None,
        }
    }

    pub fn level(&self) -> u8 {
        self.set.level
    }

    pub fn len(&self) -> usize {
        self.set.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.entries.is_empty()
    }

    pub fn face(&self) -> Face {
        self.face
    }

    /// Card currently showing, if the deck has any.
    pub fn current(&self) -> Option<&VocabEntry> {
        self.set.entries.get(self.index)
    }

    /// One-based position and total, for the progress line.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.len();
        ((self.index + 1).min(total), total)
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.len()
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    /// Toggle the visible face. Ignored while a move is pending.
    pub fn flip(&mut self) {
        if self.pending.is_none() {
            self.face = match self.face {
                Face::Front => Face::Back,
                Face::Back => Face::Front,
            };
        }
    }

    /// Reset to the front face and schedule the move to the next card.
    /// Ignored at the last card or while a move is already pending.
    pub fn next(&mut self, now: Instant) {
        if self.pending.is_some() || !self.can_next() {
            return;
        }
        self.face = Face::Front;
        self.pending = Some(PendingMove {
            target: self.index + 1,
            due: now + ADVANCE_DELAY,
        });
    }

    /// Reset to the front face and schedule the move to the previous
    /// card. Ignored at the first card or while a move is pending.
    pub fn prev(&mut self, now: Instant) {
        if self.pending.is_some() || !self.can_prev() {
            return;
        }
        self.face = Face::Front;
        self.pending = Some(PendingMove {
            target: self.index - 1,
            due: now + ADVANCE_DELAY,
        });
    }

    /// Apply a pending move once its delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(pending) = self.pending {
            if now >= pending.due {
                self.index = pending.target;
                self.pending = None;
            }
        }
    }
}
