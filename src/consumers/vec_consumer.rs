//! Consumer that collects items into a vector.

use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::ErrorStrategy;
use crate::input::Input;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Collects every consumed item into a `Vec`, mainly for tests and for
/// pipelines whose interesting output lives elsewhere (e.g. a shared tally).
pub struct VecConsumer<T: std::fmt::Debug + Clone + Send + Sync + 'static> {
  /// The collected items.
  pub items: Vec<T>,
  /// Configuration for the consumer, including error handling strategy.
  pub config: ConsumerConfig<T>,
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> VecConsumer<T> {
  /// Creates an empty collector.
  pub fn new() -> Self {
    Self {
      items: Vec::new(),
      config: ConsumerConfig::default(),
    }
  }

  /// Sets the error handling strategy for this consumer.
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<T>) -> Self {
    self.config.error_strategy = strategy;
    self
  }

  /// Sets the name for this consumer.
  pub fn with_name(mut self, name: String) -> Self {
    self.config.name = name;
    self
  }

  /// Consumes the collector, returning what it gathered.
  pub fn into_items(self) -> Vec<T> {
    self.items
  }
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> Default for VecConsumer<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> Input for VecConsumer<T> {
  type Input = T;
  type InputStream = Pin<Box<dyn Stream<Item = T> + Send>>;
}

#[async_trait]
impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> Consumer for VecConsumer<T> {
  async fn consume(&mut self, mut stream: Self::InputStream) {
    while let Some(item) = stream.next().await {
      self.items.push(item);
    }
  }

  fn set_config_impl(&mut self, config: ConsumerConfig<T>) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ConsumerConfig<T> {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig<T> {
    &mut self.config
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures::stream;

  #[tokio::test]
  async fn collects_all_items() {
    let mut consumer = VecConsumer::new();
    consumer
      .consume(Box::pin(stream::iter(vec![1, 2, 3])))
      .await;
    assert_eq!(consumer.into_items(), vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn empty_stream_collects_nothing() {
    let mut consumer = VecConsumer::<i32>::new();
    consumer.consume(Box::pin(stream::empty())).await;
    assert!(consumer.items.is_empty());
  }
}
