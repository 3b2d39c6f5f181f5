//! Topology submission against a remote execution cluster.
//!
//! Submission is a control-plane call that typically fails while the cluster
//! is still bootstrapping, so it is wrapped in [`retry_until_success`]: an
//! unbounded retry that favors availability over fast failure. Attempts are
//! spaced by bounded exponential backoff rather than a hot loop, and a
//! [`CancellationToken`] gives callers (and tests) an escape hatch.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Configuration handed to the cluster alongside a topology.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
  /// Whether the cluster should run the topology with debug output.
  pub debug: bool,
  /// Number of workers requested for the topology.
  pub worker_count: u32,
}

impl Default for SubmitConfig {
  fn default() -> Self {
    Self {
      debug: true,
      worker_count: 2,
    }
  }
}

/// Error raised by the submission layer.
#[derive(Debug, Error)]
pub enum SubmitError {
  /// The cluster rejected or failed the submission. Transient from the retry
  /// loop's point of view; it never reaches callers of
  /// [`retry_until_success`].
  #[error("submission rejected: {0}")]
  Rejected(String),
  /// The caller cancelled before the cluster accepted.
  #[error("submission cancelled before acceptance")]
  Cancelled,
}

/// Submission endpoint of a remote execution cluster. The cluster itself is
/// an external collaborator; implementations adapt its client library.
#[async_trait]
pub trait ClusterClient: Send + Sync {
  /// Registers a named topology with the cluster.
  async fn submit(&self, name: &str, config: &SubmitConfig) -> Result<(), SubmitError>;
}

/// Delay schedule between retry attempts: starts at `initial`, multiplies by
/// `multiplier` after each failure, and never exceeds `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
  /// Delay after the first failure.
  pub initial: Duration,
  /// Upper bound on the delay.
  pub max: Duration,
  /// Factor applied to the delay after each failure.
  pub multiplier: u32,
}

impl Default for Backoff {
  fn default() -> Self {
    Self {
      initial: Duration::from_millis(100),
      max: Duration::from_secs(5),
      multiplier: 2,
    }
  }
}

/// Retries `operation` until it succeeds or `cancel` fires.
///
/// Every failed attempt is logged and then retried after the next backoff
/// delay; there is no attempt cap. Cancellation is honored promptly: before
/// each attempt and at any point during the backoff sleep.
pub async fn retry_until_success<T, E, F, Fut>(
  mut operation: F,
  backoff: Backoff,
  cancel: &CancellationToken,
) -> Result<T, SubmitError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: Display,
{
  let mut delay = backoff.initial;
  let mut attempt: u64 = 0;
  loop {
    if cancel.is_cancelled() {
      return Err(SubmitError::Cancelled);
    }
    attempt += 1;
    match operation().await {
      Ok(value) => {
        info!(attempt, "operation succeeded");
        return Ok(value);
      }
      Err(e) => {
        error!(attempt, error = %e, "operation failed, retrying");
      }
    }
    tokio::select! {
      _ = cancel.cancelled() => return Err(SubmitError::Cancelled),
      _ = tokio::time::sleep(delay) => {}
    }
    delay = (delay * backoff.multiplier).min(backoff.max);
  }
}

/// Submits a named topology through the retry loop.
pub async fn submit_until_accepted<C: ClusterClient>(
  cluster: &C,
  name: &str,
  config: &SubmitConfig,
  backoff: Backoff,
  cancel: &CancellationToken,
) -> Result<(), SubmitError> {
  retry_until_success(|| cluster.submit(name, config), backoff, cancel).await?;
  info!(topology = %name, "submission accepted");
  Ok(())
}
