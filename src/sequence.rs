//! Strictly increasing sequence numbers for blob naming.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A process-local counter handing out strictly increasing integers.
///
/// Safe to share across concurrent writers; clones share the same counter.
/// Values are not persisted, so a restart resets numbering. Failed writes may
/// leave gaps in the sequence, which is acceptable: names must be unique, not
/// dense.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
  current: Arc<AtomicU64>,
}

impl SequenceCounter {
  /// Creates a counter starting at 1.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the next sequence number.
  pub fn next(&self) -> u64 {
    self.current.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// Returns the most recently handed out number, 0 if none yet.
  pub fn last(&self) -> u64 {
    self.current.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn numbers_increase_strictly() {
    let counter = SequenceCounter::new();
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.next(), 2);
    assert_eq!(counter.last(), 2);
  }

  #[tokio::test]
  async fn concurrent_callers_get_distinct_numbers() {
    let counter = SequenceCounter::new();
    let mut handles = Vec::new();
    for _ in 0..64 {
      let counter = counter.clone();
      handles.push(tokio::spawn(async move { counter.next() }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
      assert!(seen.insert(handle.await.unwrap()));
    }
    assert_eq!(seen.len(), 64);
  }
}
