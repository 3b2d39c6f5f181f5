//! Transformer that feeds each word through a shared tally.

use crate::error::ErrorStrategy;
use crate::input::Input;
use crate::output::Output;
use crate::record::Record;
use crate::tally::WordTally;
use crate::transformer::{Transformer, TransformerConfig};
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// A transformer that increments the running count for each word in a shared
/// [`WordTally`] and emits the record annotated with its new count.
///
/// The tally handle is shared: callers keep a clone and can query counts on
/// demand while the pipeline runs.
pub struct CountingTransformer {
  /// The shared tally updated per record.
  pub tally: WordTally,
  /// Configuration for the transformer, including error handling strategy.
  pub config: TransformerConfig<Record>,
}

impl CountingTransformer {
  /// Creates a transformer updating the given tally.
  pub fn new(tally: WordTally) -> Self {
    Self {
      tally,
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

impl Input for CountingTransformer {
  type Input = Record;
  type InputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

impl Output for CountingTransformer {
  type Output = Record;
  type OutputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

impl Transformer for CountingTransformer {
  fn transform(&mut self, input: Self::InputStream) -> Self::OutputStream {
    let tally = self.tally.clone();
    Box::pin(input.map(move |record| {
      let count = tally.update(&record.word);
      record.with_count(count)
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

#[cfg(test)]
mod tests {
  use super::*;
  use futures::stream;

  #[tokio::test]
  async fn annotates_records_with_running_counts() {
    let tally = WordTally::new();
    let mut transformer = CountingTransformer::new(tally.clone());

    let words = ["a", "b", "a", "a", "b"];
    let input: Pin<Box<dyn Stream<Item = Record> + Send>> =
      Box::pin(stream::iter(words.iter().copied().map(Record::new).collect::<Vec<_>>()));

    let output: Vec<Record> = transformer.transform(input).collect().await;
    let counts: Vec<u64> = output.iter().map(|r| r.count.unwrap()).collect();
    assert_eq!(counts, vec![1, 1, 2, 3, 2]);

    // The shared handle sees the same totals.
    assert_eq!(tally.query("a"), Some(3));
    assert_eq!(tally.query("b"), Some(2));
  }

  #[tokio::test]
  async fn two_transformers_share_one_tally() {
    let tally = WordTally::new();
    let mut first = CountingTransformer::new(tally.clone());
    let mut second = CountingTransformer::new(tally.clone());

    let make_input = || -> Pin<Box<dyn Stream<Item = Record> + Send>> {
      Box::pin(stream::iter(vec![Record::new("shared")]))
    };
    let _: Vec<Record> = first.transform(make_input()).collect().await;
    let _: Vec<Record> = second.transform(make_input()).collect().await;

    assert_eq!(tally.query("shared"), Some(2));
  }
}
