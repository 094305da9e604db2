//! Bounded undo/redo stack.
//!
//! The stack keeps a pointer to the current entry. Pushing after an undo
//! drops the redo branch, consecutive duplicates are ignored, and once the
//! stack exceeds its capacity the oldest entry is evicted.

use crate::constants::HISTORY_MAX_SIZE;
use std::collections::VecDeque;

/// Undo/redo history over snapshots of type `T`
#[derive(Debug, Clone)]
pub struct History<T> {
    stack: VecDeque<T>,
    pointer: Option<usize>,
    max_size: usize,
}

impl<T: Clone + PartialEq> History<T> {
    /// Create a history holding at most [`HISTORY_MAX_SIZE`] entries
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_MAX_SIZE)
    }

    /// Create a history holding at most `max_size` entries (minimum 1)
    #[must_use]
    pub fn with_capacity(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            stack: VecDeque::with_capacity(max_size + 1),
            pointer: None,
            max_size,
        }
    }

    /// Record a new current state
    pub fn push(&mut self, snapshot: T) {
        if let Some(p) = self.pointer {
            self.stack.truncate(p + 1);
            if self.stack.get(p) == Some(&snapshot) {
                return;
            }
        } else {
            self.stack.clear();
        }

        self.stack.push_back(snapshot);
        if self.stack.len() > self.max_size {
            self.stack.pop_front();
        }
        self.pointer = Some(self.stack.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.pointer, Some(p) if p > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.pointer, Some(p) if p + 1 < self.stack.len())
    }

    /// Step back; `None` at the oldest entry
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        let p = self.pointer? - 1;
        self.pointer = Some(p);
        self.stack.get(p).cloned()
    }

    /// Step forward; `None` at the newest entry
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        let p = self.pointer? + 1;
        self.pointer = Some(p);
        self.stack.get(p).cloned()
    }

    /// Entry at the pointer
    pub fn current(&self) -> Option<&T> {
        self.pointer.and_then(|p| self.stack.get(p))
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.pointer = None;
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Index of the current entry
    pub fn position(&self) -> Option<usize> {
        self.pointer
    }
}

impl<T: Clone + PartialEq> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}
