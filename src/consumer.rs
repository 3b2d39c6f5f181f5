//! Consumer trait for components that terminate a pipeline.
//!
//! Consumers get explicit lifecycle hooks: `open` runs before the first item
//! (setup that can fail, e.g. a sink preparing its destination), `consume`
//! drains the stream, and `close` runs after it ends. The default hooks are
//! no-ops so stateless consumers only implement `consume`.

use crate::error::{ComponentInfo, ErrorAction, ErrorContext, ErrorStrategy, StreamError};
use crate::input::Input;
use async_trait::async_trait;
use std::error::Error;

/// Configuration shared by all consumers.
#[derive(Debug, Clone)]
pub struct ConsumerConfig<T: std::fmt::Debug + Clone + Send + Sync + 'static> {
  /// How the consumer reacts to failed items.
  pub error_strategy: ErrorStrategy<T>,
  /// Component name used in logs and error reports.
  pub name: String,
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> Default for ConsumerConfig<T> {
  fn default() -> Self {
    Self {
      error_strategy: ErrorStrategy::Stop,
      name: String::new(),
    }
  }
}

impl<T: std::fmt::Debug + Clone + Send + Sync + 'static> ConsumerConfig<T> {
  /// Returns the configured error strategy.
  pub fn error_strategy(&self) -> ErrorStrategy<T> {
    self.error_strategy.clone()
  }

  /// Returns the configured name.
  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Trait for components that consume a stream and perform a final action.
#[async_trait]
pub trait Consumer: Input
where
  Self::Input: std::fmt::Debug + Clone + Send + Sync,
{
  /// Runs once before consumption starts. A failure here aborts the run
  /// before any item is taken from the stream.
  async fn open(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
    Ok(())
  }

  /// Drains the stream. Item-level failures are handled per the configured
  /// error strategy and must not panic the stage.
  async fn consume(&mut self, stream: Self::InputStream);

  /// Runs once after the stream is drained.
  async fn close(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
    Ok(())
  }

  /// Stores a new configuration.
  fn set_config_impl(&mut self, config: ConsumerConfig<Self::Input>);

  /// Returns the stored configuration.
  fn get_config_impl(&self) -> &ConsumerConfig<Self::Input>;

  /// Returns the stored configuration mutably.
  fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig<Self::Input>;

  /// Returns the consumer's configuration.
  fn config(&self) -> &ConsumerConfig<Self::Input> {
    self.get_config_impl()
  }

  /// Names this consumer for logs and error reports.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().name = name;
    self
  }

  /// Maps a failure onto an action according to the configured strategy.
  fn handle_error(&self, error: &StreamError<Self::Input>) -> ErrorAction {
    match self.config().error_strategy() {
      ErrorStrategy::Stop => ErrorAction::Stop,
      ErrorStrategy::Skip => ErrorAction::Skip,
      ErrorStrategy::Retry(n) if error.retries < n => ErrorAction::Retry,
      ErrorStrategy::Custom(ref handler) => handler(error),
      _ => ErrorAction::Stop,
    }
  }

  /// Builds an error context stamped with this consumer's identity.
  fn create_error_context(&self, item: Option<Self::Input>) -> ErrorContext<Self::Input> {
    ErrorContext {
      timestamp: chrono::Utc::now(),
      item,
      component_name: self.component_info().name,
      component_type: self.component_info().type_name,
    }
  }

  /// Returns this consumer's name and type.
  fn component_info(&self) -> ComponentInfo {
    let name = self.config().name();
    ComponentInfo {
      name: if name.is_empty() {
        "consumer".to_string()
      } else {
        name.to_string()
      },
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::StringError;
  use futures::{Stream, StreamExt, stream};
  use std::pin::Pin;

  struct Collector {
    items: Vec<i32>,
    opened: bool,
    closed: bool,
    fail_open: bool,
    config: ConsumerConfig<i32>,
  }

  impl Collector {
    fn new(fail_open: bool) -> Self {
      Self {
        items: Vec::new(),
        opened: false,
        closed: false,
        fail_open,
        config: ConsumerConfig::default(),
      }
    }
  }

  impl Input for Collector {
    type Input = i32;
    type InputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  #[async_trait]
  impl Consumer for Collector {
    async fn open(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
      if self.fail_open {
        return Err(Box::new(StringError("open refused".to_string())));
      }
      self.opened = true;
      Ok(())
    }

    async fn consume(&mut self, mut stream: Self::InputStream) {
      while let Some(item) = stream.next().await {
        self.items.push(item);
      }
    }

    async fn close(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
      self.closed = true;
      Ok(())
    }

    fn set_config_impl(&mut self, config: ConsumerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &ConsumerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig<i32> {
      &mut self.config
    }
  }

  #[tokio::test]
  async fn lifecycle_hooks_run_in_order() {
    let mut consumer = Collector::new(false);
    consumer.open().await.unwrap();
    consumer
      .consume(Box::pin(stream::iter(vec![1, 2, 3])))
      .await;
    consumer.close().await.unwrap();
    assert!(consumer.opened);
    assert!(consumer.closed);
    assert_eq!(consumer.items, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn failed_open_is_reported() {
    let mut consumer = Collector::new(true);
    assert!(consumer.open().await.is_err());
    assert!(!consumer.opened);
  }

  #[test]
  fn unnamed_consumer_falls_back_to_generic_name() {
    let consumer = Collector::new(false);
    assert_eq!(consumer.component_info().name, "consumer");
  }
}
