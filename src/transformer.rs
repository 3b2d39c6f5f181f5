//! Transformer trait for components that map one stream onto another.

use crate::error::{ComponentInfo, ErrorAction, ErrorContext, ErrorStrategy, StreamError};
use crate::input::Input;
use crate::output::Output;

/// Configuration shared by all transformers.
#[derive(Debug, Clone)]
pub struct TransformerConfig<T: std::fmt::Debug + Clone + Send + Sync> {
  /// How the transformer reacts to failed items.
  pub error_strategy: ErrorStrategy<T>,
  /// Optional component name.
  pub name: Option<String>,
}

impl<T: std::fmt::Debug + Clone + Send + Sync> Default for TransformerConfig<T> {
  fn default() -> Self {
    Self {
      error_strategy: ErrorStrategy::Stop,
      name: None,
    }
  }
}

impl<T: std::fmt::Debug + Clone + Send + Sync> TransformerConfig<T> {
  /// Returns the configured error strategy.
  pub fn error_strategy(&self) -> ErrorStrategy<T> {
    self.error_strategy.clone()
  }

  /// Returns the configured name, if any.
  pub fn name(&self) -> Option<String> {
    self.name.clone()
  }
}

/// Trait for components that consume one stream and emit another.
///
/// Transformers are pure with respect to their input: they take items by
/// value and emit derived items, never mutating what flowed in.
pub trait Transformer: Input + Output
where
  Self::Input: std::fmt::Debug + Clone + Send + Sync,
  Self::Output: std::fmt::Debug + Clone + Send + Sync,
{
  /// Maps the input stream onto the output stream.
  fn transform(&mut self, input: Self::InputStream) -> Self::OutputStream;

  /// Stores a new configuration.
  fn set_config_impl(&mut self, config: TransformerConfig<Self::Input>);

  /// Returns the stored configuration.
  fn get_config_impl(&self) -> &TransformerConfig<Self::Input>;

  /// Returns the stored configuration mutably.
  fn get_config_mut_impl(&mut self) -> &mut TransformerConfig<Self::Input>;

  /// Returns the transformer's configuration.
  fn config(&self) -> &TransformerConfig<Self::Input> {
    self.get_config_impl()
  }

  /// Names this transformer for logs and error reports.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    self.get_config_mut_impl().name = Some(name);
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

  /// Builds an error context stamped with this transformer's identity.
  fn create_error_context(&self, item: Option<Self::Input>) -> ErrorContext<Self::Input> {
    ErrorContext {
      timestamp: chrono::Utc::now(),
      item,
      component_name: self.component_info().name,
      component_type: self.component_info().type_name,
    }
  }

  /// Returns this transformer's name and type.
  fn component_info(&self) -> ComponentInfo {
    ComponentInfo {
      name: self
        .config()
        .name()
        .unwrap_or_else(|| "transformer".to_string()),
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures::{Stream, StreamExt, stream};
  use std::pin::Pin;

  struct Doubler {
    config: TransformerConfig<i32>,
  }

  impl Input for Doubler {
    type Input = i32;
    type InputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Output for Doubler {
    type Output = i32;
    type OutputStream = Pin<Box<dyn Stream<Item = i32> + Send>>;
  }

  impl Transformer for Doubler {
    fn transform(&mut self, input: Self::InputStream) -> Self::OutputStream {
      Box::pin(input.map(|x| x * 2))
    }

    fn set_config_impl(&mut self, config: TransformerConfig<i32>) {
      self.config = config;
    }

    fn get_config_impl(&self) -> &TransformerConfig<i32> {
      &self.config
    }

    fn get_config_mut_impl(&mut self) -> &mut TransformerConfig<i32> {
      &mut self.config
    }
  }

  #[tokio::test]
  async fn transforms_each_item() {
    let mut doubler = Doubler {
      config: TransformerConfig::default(),
    };
    let input: Pin<Box<dyn Stream<Item = i32> + Send>> = Box::pin(stream::iter(vec![1, 2, 3]));
    let output: Vec<i32> = doubler.transform(input).collect().await;
    assert_eq!(output, vec![2, 4, 6]);
  }

  #[tokio::test]
  async fn transforms_empty_stream() {
    let mut doubler = Doubler {
      config: TransformerConfig::default(),
    };
    let input: Pin<Box<dyn Stream<Item = i32> + Send>> = Box::pin(stream::empty());
    let output: Vec<i32> = doubler.transform(input).collect().await;
    assert!(output.is_empty());
  }
}
