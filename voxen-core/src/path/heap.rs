//! Custom decrease-key binary min-heap (spec §4.6 "Open set"), grounded on
//! `BinaryHeap.hpp` in the original source: a binary heap over `(key,
//! priority)` pairs with direct index tracking so an existing entry's
//! priority can be lowered in place instead of re-inserted.

use std::collections::HashMap;

/// A binary min-heap keyed by `f32` priority, with decrease-key support for
/// items identified by a `u32` key. Mirrors the original's array-backed
/// heap plus a parallel `key -> slot` index.
pub struct BinaryHeap {
    entries: Vec<(f32, u32)>,
    slot_of: HashMap<u32, usize>,
}

impl BinaryHeap {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slot_of: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.slot_of.contains_key(&key)
    }

    /// Inserts a new key. Panics if `key` is already present — the original
    /// implementation treats a double-insert as a programming error, since
    /// a node should only ever be (re-)prioritized via [`Self::decrease_key`].
    pub fn push(&mut self, key: u32, priority: f32) {
        assert!(!self.slot_of.contains_key(&key), "key {key} already present in heap");
        let slot = self.entries.len();
        self.entries.push((priority, key));
        self.slot_of.insert(key, slot);
        self.sift_up(slot);
    }

    /// Lowers `key`'s priority and moves it toward the root. No-op if
    /// `new_priority` is not actually lower (mirrors `changeCost`, which
    /// only ever moves a node up).
    pub fn decrease_key(&mut self, key: u32, new_priority: f32) {
        let slot = match self.slot_of.get(&key) {
            Some(&slot) => slot,
            None => return,
        };
        if new_priority >= self.entries[slot].0 {
            return;
        }
        self.entries[slot].0 = new_priority;
        self.sift_up(slot);
    }

    pub fn pop_min(&mut self) -> Option<(u32, f32)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let (priority, key) = self.entries.pop().unwrap();
        self.slot_of.remove(&key);
        if !self.entries.is_empty() {
            self.slot_of.insert(self.entries[0].1, 0);
            self.sift_down(0);
        }
        Some((key, priority))
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].0 >= self.entries[parent].0 {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = slot * 2 + 1;
            let right = slot * 2 + 2;
            let mut smallest = slot;
            if left < self.entries.len() && self.entries[left].0 < self.entries[smallest].0 {
                smallest = left;
            }
            if right < self.entries.len() && self.entries[right].0 < self.entries[smallest].0 {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.slot_of.insert(self.entries[a].1, a);
        self.slot_of.insert(self.entries[b].1, b);
    }
}

impl Default for BinaryHeap {
    fn default() -> Self {
        Self::new()
    }
}
