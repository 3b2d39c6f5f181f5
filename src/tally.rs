//! In-memory running counts per word.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A shared key-to-count map.
///
/// Clones share the same underlying map, so a tally handle can be given to a
/// pipeline stage while another handle queries it on demand. Increments are
/// serialized through a mutex; counts never shrink and keys are never
/// evicted, which is accepted at this sample's scope.
#[derive(Debug, Clone, Default)]
pub struct WordTally {
  counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl WordTally {
  /// Creates an empty tally.
  pub fn new() -> Self {
    Self::default()
  }

  /// Increments the count for `key`, creating it at zero first, and returns
  /// the new count.
  pub fn update(&self, key: &str) -> u64 {
    let mut counts = self.counts.lock().expect("tally mutex poisoned");
    let count = counts.entry(key.to_string()).or_insert(0);
    *count += 1;
    *count
  }

  /// Returns the current count for `key`, or `None` if it was never seen.
  pub fn query(&self, key: &str) -> Option<u64> {
    self.counts.lock().expect("tally mutex poisoned").get(key).copied()
  }

  /// Returns a point-in-time copy of all counts.
  pub fn snapshot(&self) -> HashMap<String, u64> {
    self.counts.lock().expect("tally mutex poisoned").clone()
  }

  /// Total number of observations across all keys.
  pub fn total(&self) -> u64 {
    self
      .counts
      .lock()
      .expect("tally mutex poisoned")
      .values()
      .sum()
  }
}
