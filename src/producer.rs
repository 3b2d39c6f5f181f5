//! Producer trait for components that originate records.
//!
//! Producers are the start of a pipeline. They own no input; `produce()`
//! returns the stream the rest of the pipeline is driven from.

use crate::error::{ComponentInfo, ErrorAction, ErrorContext, ErrorStrategy, StreamError};
use crate::output::Output;

/// Configuration shared by all producers: an error strategy and an optional
/// name used in logs and error reports.
#[derive(Debug, Clone)]
pub struct ProducerConfig<T: std::fmt::Debug + Clone + Send + Sync> {
  /// How the producer reacts to failed items.
  pub error_strategy: ErrorStrategy<T>,
  /// Optional component name.
  pub name: Option<String>,
}

impl<T: std::fmt::Debug + Clone + Send + Sync> Default for ProducerConfig<T> {
  fn default() -> Self {
    Self {
      error_strategy: ErrorStrategy::Stop,
      name: None,
    }
  }
}

impl<T: std::fmt::Debug + Clone + Send + Sync> ProducerConfig<T> {
  /// Returns the configured error strategy.
  pub fn error_strategy(&self) -> ErrorStrategy<T> {
    self.error_strategy.clone()
  }

  /// Returns the configured name, if any.
  pub fn name(&self) -> Option<String> {
    self.name.clone()
  }
}

/// Trait for components that produce a stream of items.
pub trait Producer: Output
where
  Self::Output: std::fmt::Debug + Clone + Send + Sync,
{
  /// Builds the output stream. Called once per pipeline run.
  fn produce(&mut self) -> Self::OutputStream;

  /// Stores a new configuration.
  fn set_config_impl(&mut self, config: ProducerConfig<Self::Output>);

  /// Returns the stored configuration.
  fn get_config_impl(&self) -> &ProducerConfig<Self::Output>;

  /// Returns the stored configuration mutably.
  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<Self::Output>;

  /// Returns the producer's configuration.
  fn config(&self) -> &ProducerConfig<Self::Output> {
    self.get_config_impl()
  }

  /// Names this producer for logs and error reports.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().name = Some(name);
    self
  }

  /// Maps a failure onto an action according to the configured strategy.
  fn handle_error(&self, error: &StreamError<Self::Output>) -> ErrorAction {
    match self.config().error_strategy() {
      ErrorStrategy::Stop => ErrorAction::Stop,
      ErrorStrategy::Skip => ErrorAction::Skip,
      ErrorStrategy::Retry(n) if error.retries < n => ErrorAction::Retry,
      ErrorStrategy::Custom(ref handler) => handler(error),
      _ => ErrorAction::Stop,
    }
  }

  /// Builds an error context stamped with this producer's identity.
  fn create_error_context(&self, item: Option<Self::Output>) -> ErrorContext<Self::Output> {
    ErrorContext {
      timestamp: chrono::Utc::now(),
      item,
      component_name: self.component_info().name,
      component_type: self.component_info().type_name,
    }
  }

  /// Returns this producer's name and type.
  fn component_info(&self) -> ComponentInfo {
    ComponentInfo {
      name: self
        .config()
        .name()
        .unwrap_or_else(|| "producer".to_string()),
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

  #[derive(Clone)]
  struct NumberProducer {
    numbers: Vec<i32>,
    config: ProducerConfig<i32>,
  }

  impl Output for NumberProducer {
    type Output = i32;
    type OutputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Producer for NumberProducer {
    fn produce(&mut self) -> Self::OutputStream {
      Box::pin(stream::iter(self.numbers.clone()))
    }

    fn set_config_impl(&mut self, config: ProducerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &ProducerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<i32> {
      &mut self.config
    }
  }

  fn sample_error(retries: usize) -> StreamError<i32> {
    StreamError {
      source: Box::new(StringError("failed".to_string())),
      context: ErrorContext {
        timestamp: chrono::Utc::now(),
        item: None,
        component_name: "numbers".to_string(),
        component_type: "NumberProducer".to_string(),
      },
      component: ComponentInfo {
        name: "numbers".to_string(),
        type_name: "NumberProducer".to_string(),
      },
      retries,
    }
  }

  #[tokio::test]
  async fn produces_all_items() {
    let mut producer = NumberProducer {
      numbers: vec![1, 2, 3],
      config: ProducerConfig::default(),
    };
    let collected: Vec<i32> = producer.produce().collect().await;
    assert_eq!(collected, vec![1, 2, 3]);
  }

  #[test]
  fn default_strategy_stops() {
    let producer = NumberProducer {
      numbers: vec![],
      config: ProducerConfig::default(),
    };
    assert_eq!(producer.handle_error(&sample_error(0)), ErrorAction::Stop);
  }

  #[test]
  fn retry_strategy_exhausts_into_stop() {
    let mut producer = NumberProducer {
      numbers: vec![],
      config: ProducerConfig::default(),
    };
    producer.get_config_mut_impl().error_strategy = ErrorStrategy::Retry(2);
    assert_eq!(producer.handle_error(&sample_error(1)), ErrorAction::Retry);
    assert_eq!(producer.handle_error(&sample_error(2)), ErrorAction::Stop);
  }

  #[test]
  fn named_producer_reports_its_name() {
    let producer = NumberProducer {
      numbers: vec![],
      config: ProducerConfig::default(),
    }
    .with_name("numbers".to_string());
    assert_eq!(producer.component_info().name, "numbers");
  }
}
