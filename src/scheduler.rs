//! Keyed delayed tasks driven by an injected clock

use std::time::Instant;

/// Deadlines keyed by `K`; each key is armed at most once at a time.
///
/// Nothing fires on its own: the owner calls [`DelayedTasks::drain_due`]
/// with the current instant, which lets tests advance time by hand.
pub struct DelayedTasks<K> {
    entries: Vec<(Instant, K)>,
}

impl<K> Default for DelayedTasks<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: PartialEq + Clone> DelayedTasks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key`. Returns false (and keeps the existing deadline) if already armed.
    pub fn schedule(&mut self, key: K, deadline: Instant) -> bool {
        if self.is_scheduled(&key) {
            return false;
        }
        let pos = self.entries.partition_point(|(d, _)| *d <= deadline);
        self.entries.insert(pos, (deadline, key));
        true
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(_, k)| k != key);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.entries.iter().any(|(_, k)| k == key)
    }

    /// Remove and return every key whose deadline is at or before `now`, earliest first
    pub fn drain_due(&mut self, now: Instant) -> Vec<K> {
        let due = self.entries.partition_point(|(d, _)| *d <= now);
        self.entries.drain(..due).map(|(_, k)| k).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.first().map(|(d, _)| *d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
