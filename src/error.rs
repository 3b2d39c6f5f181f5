//! Error handling for pipeline components.
//!
//! Components carry an [`ErrorStrategy`] in their config that decides what a
//! stage does when an item fails: stop, skip the item, retry a bounded number
//! of times, or delegate to a custom handler. A failure is reported as a
//! [`StreamError`] carrying the source error, a timestamped [`ErrorContext`]
//! and the [`ComponentInfo`] of the stage that hit it.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Action a component takes in response to a failed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
  /// Stop processing immediately.
  Stop,
  /// Drop the failed item and continue with the next one.
  Skip,
  /// Retry the operation that failed.
  Retry,
}

type CustomErrorHandler<T> = Arc<dyn Fn(&StreamError<T>) -> ErrorAction + Send + Sync>;

/// Policy deciding which [`ErrorAction`] a component takes on failure.
pub enum ErrorStrategy<T> {
  /// Stop on the first error. The default.
  Stop,
  /// Skip failed items and keep going.
  Skip,
  /// Retry up to the given number of times, then stop.
  Retry(usize),
  /// Defer the decision to a handler function.
  Custom(CustomErrorHandler<T>),
}

impl<T: fmt::Debug + Clone + Send + Sync> ErrorStrategy<T> {
  /// Builds a `Custom` strategy from a handler function.
  pub fn new_custom<F>(f: F) -> Self
  where
    F: Fn(&StreamError<T>) -> ErrorAction + Send + Sync + 'static,
  {
    Self::Custom(Arc::new(f))
  }
}

impl<T: fmt::Debug + Clone + Send + Sync> Clone for ErrorStrategy<T> {
  fn clone(&self) -> Self {
    match self {
      ErrorStrategy::Stop => ErrorStrategy::Stop,
      ErrorStrategy::Skip => ErrorStrategy::Skip,
      ErrorStrategy::Retry(n) => ErrorStrategy::Retry(*n),
      ErrorStrategy::Custom(handler) => ErrorStrategy::Custom(handler.clone()),
    }
  }
}

impl<T: fmt::Debug + Clone + Send + Sync> fmt::Debug for ErrorStrategy<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorStrategy::Stop => write!(f, "ErrorStrategy::Stop"),
      ErrorStrategy::Skip => write!(f, "ErrorStrategy::Skip"),
      ErrorStrategy::Retry(n) => write!(f, "ErrorStrategy::Retry({})", n),
      ErrorStrategy::Custom(_) => write!(f, "ErrorStrategy::Custom"),
    }
  }
}

impl<T: fmt::Debug + Clone + Send + Sync> PartialEq for ErrorStrategy<T> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (ErrorStrategy::Stop, ErrorStrategy::Stop) => true,
      (ErrorStrategy::Skip, ErrorStrategy::Skip) => true,
      (ErrorStrategy::Retry(a), ErrorStrategy::Retry(b)) => a == b,
      (ErrorStrategy::Custom(_), ErrorStrategy::Custom(_)) => true,
      _ => false,
    }
  }
}

/// Error raised while an item was flowing through a component.
#[derive(Debug)]
pub struct StreamError<T> {
  /// The underlying error.
  pub source: Box<dyn Error + Send + Sync>,
  /// When and where the error occurred, and the item involved if known.
  pub context: ErrorContext<T>,
  /// The component that reported the error.
  pub component: ComponentInfo,
  /// How many times this operation has already been retried.
  pub retries: usize,
}

impl<T: fmt::Debug + Clone + Send + Sync> StreamError<T> {
  /// Wraps a source error with context; `retries` starts at 0.
  pub fn new(
    source: Box<dyn Error + Send + Sync>,
    context: ErrorContext<T>,
    component: ComponentInfo,
  ) -> Self {
    Self {
      source,
      context,
      component,
      retries: 0,
    }
  }
}

impl<T: fmt::Debug + Clone + Send + Sync> fmt::Display for StreamError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "error in {} ({}): {}",
      self.component.name, self.component.type_name, self.source
    )
  }
}

impl<T: fmt::Debug + Clone + Send + Sync> Error for StreamError<T> {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    Some(self.source.as_ref())
  }
}

/// Where and when a [`StreamError`] happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext<T> {
  /// Timestamp of the failure.
  pub timestamp: chrono::DateTime<chrono::Utc>,
  /// The item being processed, if it is known.
  pub item: Option<T>,
  /// Name of the reporting component.
  pub component_name: String,
  /// Type name of the reporting component.
  pub component_type: String,
}

/// Name and type of a pipeline component, for logs and error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
  /// Configured component name.
  pub name: String,
  /// Rust type name of the component.
  pub type_name: String,
}

/// Minimal error wrapping a plain message.
#[derive(Debug)]
pub struct StringError(pub String);

impl fmt::Display for StringError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Error for StringError {}

/// Error surfaced by [`crate::pipeline::Pipeline::run`].
#[derive(Debug, ThisError)]
pub enum PipelineError {
  /// The consumer's `open` hook failed; nothing was consumed.
  #[error("failed to open consumer: {0}")]
  Open(#[source] Box<dyn Error + Send + Sync>),
  /// The consumer's `close` hook failed after the stream drained.
  #[error("failed to close consumer: {0}")]
  Close(#[source] Box<dyn Error + Send + Sync>),
  /// The pipeline was cancelled before the stream drained.
  #[error("pipeline cancelled")]
  Cancelled,
}
