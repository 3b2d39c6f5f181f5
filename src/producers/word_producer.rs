//! Rate-limited random word source.

use crate::error::{ComponentInfo, ErrorStrategy};
use crate::output::Output;
use crate::producer::{Producer, ProducerConfig};
use crate::record::Record;
use futures::{Stream, StreamExt, stream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::pin::Pin;
use std::time::Duration;
use tokio::time;

/// Default delay between produced words, modeling a live rate-limited source.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

const DEFAULT_VOCABULARY: &[&str] = &["my", "test", "words", "are", "so", "original"];

/// A producer emitting one randomly chosen word per tick from a fixed, finite
/// vocabulary. Infinite unless bounded with [`WordProducer::with_count`];
/// restartable only by calling [`Producer::produce`] again.
pub struct WordProducer {
  /// The vocabulary words are drawn from. Always at least two entries.
  pub vocabulary: Vec<String>,
  /// Delay between productions.
  pub interval: Duration,
  /// Optional bound on the number of words produced, used by tests.
  pub count: Option<usize>,
  /// Configuration for the producer, including error handling strategy.
  pub config: ProducerConfig<Record>,
}

impl WordProducer {
  /// Creates a producer over the default sample vocabulary.
  pub fn new() -> Self {
    Self::with_vocabulary(DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect())
  }

  /// Creates a producer over a caller-supplied vocabulary.
  ///
  /// # Panics
  ///
  /// Panics if the vocabulary has fewer than two words; a single-word source
  /// produces a constant stream and is a configuration mistake.
  pub fn with_vocabulary(vocabulary: Vec<String>) -> Self {
    assert!(
      vocabulary.len() >= 2,
      "word source vocabulary needs at least two words"
    );
    Self {
      vocabulary,
      interval: DEFAULT_INTERVAL,
      count: None,
      config: ProducerConfig::default(),
    }
  }

  /// Bounds the stream to `count` words.
  pub fn with_count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  /// Overrides the delay between productions.
  pub fn with_interval(mut self, interval: Duration) -> Self {
    self.interval = interval;
    self
  }

  /// Sets the error handling strategy for this producer.
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<Record>) -> Self {
    self.config.error_strategy = strategy;
    self
  }

  /// Sets the name for this producer.
  pub fn with_name(mut self, name: String) -> Self {
    self.config.name = Some(name);
    self
  }
}

impl Default for WordProducer {
  fn default() -> Self {
    Self::new()
  }
}

impl Output for WordProducer {
  type Output = Record;
  type OutputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

impl Producer for WordProducer {
  fn produce(&mut self) -> Self::OutputStream {
    let words = self.vocabulary.clone();
    let count = self.count;
    let rng = StdRng::from_entropy();

    let initial_state = (rng, words, time::interval(self.interval));

    let stream = stream::unfold(
      initial_state,
      move |(mut rng, words, mut interval)| async move {
        interval.tick().await;
        let word = words[rng.gen_range(0..words.len())].clone();
        Some((Record::new(word), (rng, words, interval)))
      },
    );

    match count {
      Some(n) => Box::pin(stream.take(n)),
      None => Box::pin(stream),
    }
  }

  fn set_config_impl(&mut self, config: ProducerConfig<Record>) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ProducerConfig<Record> {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<Record> {
    &mut self.config
  }

  fn component_info(&self) -> ComponentInfo {
    ComponentInfo {
      name: self
        .config
        .name()
        .unwrap_or_else(|| "word_producer".to_string()),
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }
}
