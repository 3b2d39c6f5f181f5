//! Wiring of the two sample topologies and the argument surface that selects
//! how they run.
//!
//! Pipeline A writes each transformed word as a uniquely named blob; pipeline
//! B keeps running word counts in a shared tally. Both read the same word
//! source. A local run drives the pipeline on this process for a fixed
//! duration and then stops it; a remote run hands the topology to an
//! execution cluster through the submission retry loop.

use crate::blob::{BlobStore, StorageConfig};
use crate::consumer::Consumer;
use crate::consumers::{BlobSink, VecConsumer};
use crate::error::{ErrorStrategy, PipelineError};
use crate::pipeline::{Pipeline, PipelineBuilder};
use crate::producers::WordProducer;
use crate::record::Record;
use crate::submit::{Backoff, ClusterClient, SubmitConfig, SubmitError, submit_until_accepted};
use crate::tally::WordTally;
use crate::transformer::Transformer;
use crate::transformers::{CountingTransformer, SuffixTransformer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How long a local run lasts before the pipeline is stopped.
pub const DEFAULT_LOCAL_RUN: Duration = Duration::from_secs(50);

/// Error raised while parsing arguments or driving a topology run.
#[derive(Debug, Error)]
pub enum TopologyError {
  /// Too few positional arguments.
  #[error("usage: <brokers> <connection-string> <container> <prefix> [-local] [-toBlob]")]
  Usage,
  /// A trailing argument that is not a recognized flag.
  #[error("unknown flag: {0}")]
  UnknownFlag(String),
  /// The underlying pipeline failed.
  #[error(transparent)]
  Pipeline(#[from] PipelineError),
  /// The pipeline task ended abnormally.
  #[error("pipeline task ended abnormally")]
  Panicked,
}

/// Where a topology executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
  /// Run in this process for a fixed duration, then stop.
  Local {
    /// How long the pipeline runs before cancellation.
    duration: Duration,
  },
  /// Submit to a remote execution cluster.
  Remote,
}

/// Which sample topology a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
  /// Pipeline B: running word counts in the shared tally.
  Tally,
  /// Pipeline A: each transformed word written to blob storage.
  Blob,
}

/// Connection info for the word broker feeding a deployed topology. The
/// broker client itself is an external collaborator; this only carries what a
/// submission needs to pass along.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
  /// Broker addresses, one `host:port` per entry.
  pub brokers: Vec<String>,
  /// Topic the word source reads from.
  pub topic: String,
  /// Delivery-acknowledgment level requested from the broker.
  pub required_acks: i16,
}

impl BrokerConfig {
  /// Parses a comma-separated broker list. Acknowledgment level defaults to
  /// 1 (leader ack).
  pub fn new(broker_list: &str, topic: impl Into<String>) -> Self {
    Self {
      brokers: broker_list
        .split(',')
        .filter(|b| !b.is_empty())
        .map(|b| b.trim().to_string())
        .collect(),
      topic: topic.into(),
      required_acks: 1,
    }
  }
}

/// Parsed command-line surface of the sample programs.
#[derive(Debug, Clone)]
pub struct TopologyArgs {
  /// Broker connection info.
  pub broker: BrokerConfig,
  /// Blob sink destination.
  pub storage: StorageConfig,
  /// Local or remote execution.
  pub mode: RunMode,
  /// Which topology to run.
  pub kind: TopologyKind,
}

impl TopologyArgs {
  /// Parses positional arguments: broker list, connection string, container,
  /// prefix, and optional trailing `-local` / `-toBlob` flags in any order.
  /// The program name must already be stripped.
  pub fn parse(args: &[String]) -> Result<Self, TopologyError> {
    let [broker_list, connection_string, container, prefix, rest @ ..] = args else {
      return Err(TopologyError::Usage);
    };
    let mut mode = RunMode::Remote;
    let mut kind = TopologyKind::Tally;
    for flag in rest {
      match flag.as_str() {
        "-local" => {
          mode = RunMode::Local {
            duration: DEFAULT_LOCAL_RUN,
          }
        }
        "-toBlob" => kind = TopologyKind::Blob,
        other => return Err(TopologyError::UnknownFlag(other.to_string())),
      }
    }
    Ok(Self {
      broker: BrokerConfig::new(broker_list, "words"),
      storage: StorageConfig::new(
        connection_string.clone(),
        container.clone(),
        prefix.clone(),
      ),
      mode,
      kind,
    })
  }
}

/// Pipeline A: words -> suffix transform -> blob sink. The sink skips failed
/// writes so one lost record does not end a long-running pipeline.
pub fn blob_pipeline(
  source: WordProducer,
  store: Arc<dyn BlobStore>,
  storage: StorageConfig,
) -> Pipeline<SuffixTransformer, BlobSink> {
  PipelineBuilder::new()
    .producer(source)
    .transformer(SuffixTransformer::new().with_name("exclaim".to_string()))
    .consumer(
      BlobSink::new(store, storage)
        .with_error_strategy(ErrorStrategy::Skip)
        .with_name("blob_sink".to_string()),
    )
}

/// Pipeline B: words -> counting transform; callers keep a [`WordTally`]
/// clone and query the running counts on demand.
pub fn tally_pipeline(
  source: WordProducer,
  tally: WordTally,
) -> Pipeline<CountingTransformer, VecConsumer<Record>> {
  PipelineBuilder::new()
    .producer(source)
    .transformer(CountingTransformer::new(tally).with_name("counter".to_string()))
    .consumer(VecConsumer::new().with_name("drain".to_string()))
}

/// Runs a pipeline in this process for `duration`, then stops it.
///
/// Cancellation at the end of the window is the expected outcome and is
/// reported as success; a pipeline that drains earlier (a bounded source)
/// also succeeds.
pub async fn run_local<T, C>(
  pipeline: Pipeline<T, C>,
  duration: Duration,
) -> Result<(), TopologyError>
where
  T: Transformer + Send + 'static,
  C: Consumer + Send + 'static,
  T::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::Output: std::fmt::Debug + Clone + Send + Sync + 'static,
  T::OutputStream: Send + 'static,
  C::Input: std::fmt::Debug + Clone + Send + Sync + 'static,
  C::InputStream: From<T::OutputStream>,
{
  let cancel = CancellationToken::new();
  let handle = pipeline.spawn(cancel.clone());
  tokio::time::sleep(duration).await;
  cancel.cancel();

  match handle.await {
    Ok(Ok(_)) => Ok(()),
    Ok(Err(PipelineError::Cancelled)) => {
      info!(?duration, "local run window elapsed, pipeline stopped");
      Ok(())
    }
    Ok(Err(e)) => Err(TopologyError::Pipeline(e)),
    Err(_) => Err(TopologyError::Panicked),
  }
}

/// Submits a named topology to a cluster, retrying with the default backoff
/// until it is accepted or `cancel` fires.
pub async fn submit_remote<C: ClusterClient>(
  cluster: &C,
  name: &str,
  config: &SubmitConfig,
  cancel: &CancellationToken,
) -> Result<(), SubmitError> {
  submit_until_accepted(cluster, name, config, Backoff::default(), cancel).await
}

/// Installs a process-wide tracing subscriber at debug or info level.
/// Embedding programs call this once at startup; calling it again is a no-op.
pub fn init_tracing(debug: bool) {
  let level = if debug {
    tracing::Level::DEBUG
  } else {
    tracing::Level::INFO
  };
  let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}
