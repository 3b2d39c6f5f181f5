//! The record type that flows through the sample topologies.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A word observation, optionally annotated with its running count.
///
/// Records are immutable once produced and flow by value through pipeline
/// stages; transformers emit new records rather than mutating their input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  /// The observed token.
  pub word: String,
  /// Running occurrence count, set by the tallying stage.
  pub count: Option<u64>,
}

/// Error for wire text that does not describe a valid record.
#[derive(Debug, Error)]
pub enum RecordError {
  /// The text was not valid record JSON.
  #[error("malformed record text: {0}")]
  Malformed(#[from] serde_json::Error),
  /// The record had an empty word field.
  #[error("record has an empty word")]
  EmptyWord,
}

impl Record {
  /// Creates a record for a bare token.
  pub fn new(word: impl Into<String>) -> Self {
    Self {
      word: word.into(),
      count: None,
    }
  }

  /// Returns a copy annotated with a running count.
  pub fn with_count(&self, count: u64) -> Self {
    Self {
      word: self.word.clone(),
      count: Some(count),
    }
  }

  /// Serializes the record to its wire text.
  pub fn to_wire(&self) -> String {
    // Serialization of a two-field struct with string/int fields cannot fail.
    serde_json::to_string(self).expect("record serialization is infallible")
  }

  /// Parses wire text back into a record.
  ///
  /// Malformed input is a contract violation and is reported as an error,
  /// never silently dropped.
  pub fn parse(text: &str) -> Result<Self, RecordError> {
    let record: Record = serde_json::from_str(text)?;
    if record.word.is_empty() {
      return Err(RecordError::EmptyWord);
    }
    Ok(record)
  }
}

// Display mirrors the wire text so logs and stored blobs read the same.
impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_wire())
  }
}
