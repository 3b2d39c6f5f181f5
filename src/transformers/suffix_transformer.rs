//! Transformer that appends a marker suffix to each word.

use crate::error::ErrorStrategy;
use crate::input::Input;
use crate::output::Output;
use crate::record::Record;
use crate::transformer::{Transformer, TransformerConfig};
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Default marker appended to each word.
pub const DEFAULT_SUFFIX: &str = "!!!";

/// A pure, stateless transformer deriving a new record from each input by
/// appending a configured suffix to the word. Deterministic given its
/// configuration; the input record is consumed, never mutated in place.
pub struct SuffixTransformer {
  /// The marker appended to each word.
  pub suffix: String,
  /// Configuration for the transformer, including error handling strategy.
  pub config: TransformerConfig<Record>,
}

impl SuffixTransformer {
  /// Creates a transformer with the default marker.
  pub fn new() -> Self {
    Self::with_suffix(DEFAULT_SUFFIX.to_string())
  }

  /// Creates a transformer with a caller-supplied marker.
  pub fn with_suffix(suffix: String) -> Self {
    Self {
      suffix,
      config: TransformerConfig::default(),
    }
  }

  /// Sets the error handling strategy for this transformer.
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<Record>) -> Self {
    self.config.error_strategy = strategy;
    self
  }

  /// Sets the name for this transformer.
  pub fn with_name(mut self, name: String) -> Self {
    self.config.name = Some(name);
    self
  }
}

impl Default for SuffixTransformer {
  fn default() -> Self {
    Self::new()
  }
}

impl Input for SuffixTransformer {
  type Input = Record;
  type InputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

impl Output for SuffixTransformer {
  type Output = Record;
  type OutputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

impl Transformer for SuffixTransformer {
  fn transform(&mut self, input: Self::InputStream) -> Self::OutputStream {
    let suffix = self.suffix.clone();
    Box::pin(input.map(move |record| Record {
      word: format!("{}{}", record.word, suffix),
      count: record.count,
    }))
  }

  fn set_config_impl(&mut self, config: TransformerConfig<Record>) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &TransformerConfig<Record> {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut TransformerConfig<Record> {
    &mut self.config
  }
}
