//! Consumer that writes each record as a uniquely named blob.

use crate::blob::{BlobStore, StorageConfig, StoreError};
use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::{ErrorAction, ErrorStrategy, StreamError};
use crate::input::Input;
use crate::record::Record;
use crate::sequence::SequenceCounter;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::error::Error;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error};

/// Error raised by the blob sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
  /// The storage configuration is malformed. Fatal; retrying cannot help.
  #[error("invalid storage configuration: {0}")]
  Configuration(String),
  /// The backing store could not be reached during prepare. Transient; the
  /// caller may retry `prepare`.
  #[error("storage unavailable: {0}")]
  Unavailable(#[source] StoreError),
  /// `write` was called before a successful `prepare`.
  #[error("sink is not prepared; call prepare() first")]
  NotReady,
  /// A write failed. The sink does not retry; retry policy belongs to the
  /// caller. The allocated sequence number is lost, leaving a gap.
  #[error("failed to write blob {name}: {source}")]
  Write {
    /// Name of the blob the write was addressed to.
    name: String,
    /// The underlying store error.
    #[source]
    source: StoreError,
  },
}

/// A consumer that serializes each record and persists it under
/// `prefix + sequence` as a new, write-once object.
///
/// The sink must be prepared before use: [`BlobSink::prepare`] validates the
/// configuration, ensures the destination container exists and arms the sink.
/// An unprepared sink short-circuits every write with [`SinkError::NotReady`]
/// instead of attempting the write. The store handle and sequence counter are
/// shared, so clones of this sink write into one namespace concurrently.
pub struct BlobSink {
  store: Arc<dyn BlobStore>,
  storage: StorageConfig,
  sequence: SequenceCounter,
  ready: Arc<AtomicBool>,
  config: ConsumerConfig<Record>,
}

impl BlobSink {
  /// Creates an unprepared sink over the given store and destination.
  pub fn new(store: Arc<dyn BlobStore>, storage: StorageConfig) -> Self {
    Self {
      store,
      storage,
      sequence: SequenceCounter::new(),
      ready: Arc::new(AtomicBool::new(false)),
      config: ConsumerConfig::default(),
    }
  }

  /// Sets the error handling strategy for this sink.
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<Record>) -> Self {
    self.config.error_strategy = strategy;
    self
  }

  /// Sets the name for this sink.
  pub fn with_name(mut self, name: String) -> Self {
    self.config.name = name;
    self
  }

  /// Validates configuration and ensures the destination container exists.
  ///
  /// Idempotent: preparing an already prepared sink is a no-op. On failure
  /// the sink stays unarmed and subsequent writes short-circuit.
  pub async fn prepare(&self) -> Result<(), SinkError> {
    if self.ready.load(Ordering::SeqCst) {
      return Ok(());
    }
    self.storage.validate().map_err(SinkError::Configuration)?;
    self
      .store
      .ensure_container(&self.storage.container)
      .await
      .map_err(SinkError::Unavailable)?;
    self.ready.store(true, Ordering::SeqCst);
    Ok(())
  }

  /// Whether `prepare` has succeeded.
  pub fn is_ready(&self) -> bool {
    self.ready.load(Ordering::SeqCst)
  }

  /// Writes one record as a new blob and returns the blob's name.
  ///
  /// Exactly one durable object appears per successful call. The sink never
  /// retries; a failed write loses its allocated sequence number, which is
  /// acceptable: names must be unique, not dense.
  pub async fn write(&self, record: &Record) -> Result<String, SinkError> {
    if !self.ready.load(Ordering::SeqCst) {
      return Err(SinkError::NotReady);
    }
    let name = format!("{}{}", self.storage.prefix, self.sequence.next());
    self
      .store
      .put_text(&self.storage.container, &name, &record.to_wire())
      .await
      .map_err(|source| SinkError::Write {
        name: name.clone(),
        source,
      })?;
    Ok(name)
  }
}

impl Clone for BlobSink {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      storage: self.storage.clone(),
      sequence: self.sequence.clone(),
      ready: Arc::clone(&self.ready),
      config: self.config.clone(),
    }
  }
}

impl Input for BlobSink {
  type Input = Record;
  type InputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

#[async_trait]
impl Consumer for BlobSink {
  async fn open(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
    self.prepare().await.map_err(|e| Box::new(e) as _)
  }

  /// Writes each record from the stream. A failed write is logged and then
  /// resolved through the configured error strategy: stop draining, skip the
  /// record, or retry the write (a retry allocates a fresh name).
  async fn consume(&mut self, mut stream: Self::InputStream) {
    let component = self.component_info().name;
    'records: while let Some(record) = stream.next().await {
      let mut retries = 0;
      loop {
        match self.write(&record).await {
          Ok(name) => {
            debug!(component = %component, blob = %name, "wrote record");
            break;
          }
          Err(e) => {
            error!(
              component = %component,
              word = %record.word,
              error = %e,
              "failed to write record"
            );
            let mut failure = StreamError::new(
              Box::new(e),
              self.create_error_context(Some(record.clone())),
              self.component_info(),
            );
            failure.retries = retries;
            match self.handle_error(&failure) {
              ErrorAction::Retry => retries += 1,
              ErrorAction::Skip => break,
              ErrorAction::Stop => break 'records,
            }
          }
        }
      }
    }
  }

  fn set_config_impl(&mut self, config: ConsumerConfig<Record>) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ConsumerConfig<Record> {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ConsumerConfig<Record> {
    &mut self.config
  }
}
