//! Repeat schedule for continuous controls

use std::collections::BTreeMap;

/// Remaining repeats for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatEntry {
    pub remaining: u32,
    pub value: u8,
}

/// Per-controller repeat entries, keyed by CC number
///
/// Each controller is tracked on its own so the two jog directions never
/// cancel each other. Iteration order is ascending CC number.
#[derive(Debug, Clone)]
pub struct RepeatTable {
    entries: BTreeMap<u8, RepeatEntry>,
    max_repeat: u32,
}

impl RepeatTable {
    pub fn new(max_repeat: u32) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_repeat: max_repeat.max(1),
        }
    }

    pub fn max_repeat(&self) -> u32 {
        self.max_repeat
    }

    /// Insert or refresh the entry for `controller` with a full budget
    pub fn arm(&mut self, controller: u8, value: u8) {
        self.entries.insert(
            controller,
            RepeatEntry {
                remaining: self.max_repeat,
                value,
            },
        );
    }

    /// Remove the entry for `controller`, if any
    pub fn cancel(&mut self, controller: u8) -> Option<RepeatEntry> {
        self.entries.remove(&controller)
    }

    /// Advance one timer period.
    ///
    /// Returns the (controller, value) pairs to re-send. An entry with one
    /// repeat left is removed instead of re-sent, so a freshly armed entry
    /// produces `max_repeat - 1` repeats after its initial send.
    pub fn tick(&mut self) -> Vec<(u8, u8)> {
        let mut due = Vec::with_capacity(self.entries.len());
        self.entries.retain(|&controller, entry| {
            if entry.remaining > 1 {
                due.push((controller, entry.value));
                entry.remaining -= 1;
                true
            } else {
                false
            }
        });
        due
    }

    pub fn get(&self, controller: u8) -> Option<&RepeatEntry> {
        self.entries.get(&controller)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
