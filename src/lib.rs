//! # Squall
//!
//! Sample streaming word topologies, built as composable async pipelines.
//!
//! Two topologies share one word source: pipeline A appends a marker suffix
//! to each word and persists it as a uniquely named blob; pipeline B keeps a
//! running count per word in a shared tally. Around them sit the operational
//! pieces a deployed topology needs: a submission retry loop with backoff and
//! cancellation, and smoke checks for the coordination service.
//!
//! External collaborators (the object store, the execution cluster, the
//! coordination service) are trait seams with in-memory implementations, so
//! the whole thing runs and tests in-process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use squall::blob::{MemoryBlobStore, StorageConfig};
//! use squall::producers::WordProducer;
//! use squall::topology::{blob_pipeline, run_local, DEFAULT_LOCAL_RUN};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let store = Arc::new(MemoryBlobStore::new());
//!   let storage = StorageConfig::new(
//!     "DefaultEndpointsProtocol=https;AccountName=sample;AccountKey=c2VjcmV0",
//!     "words",
//!     "blob",
//!   );
//!   let pipeline = blob_pipeline(WordProducer::new(), store, storage);
//!   run_local(pipeline, DEFAULT_LOCAL_RUN).await?;
//!   Ok(())
//! }
//! ```

/// Blob storage seam and in-memory store.
pub mod blob;
/// Consumer trait with the open/consume/close lifecycle.
pub mod consumer;
/// Concrete consumers: the blob sink and a collecting consumer.
pub mod consumers;
/// Coordination-service seam and smoke checks.
pub mod coordination;
/// Error strategies and pipeline errors.
pub mod error;
/// Input marker trait.
pub mod input;
/// Output marker trait.
pub mod output;
/// Typestate pipeline builder and execution.
pub mod pipeline;
/// Producer trait.
pub mod producer;
/// Concrete producers: the rate-limited word source.
pub mod producers;
/// The record type flowing through the topologies.
pub mod record;
/// Monotonic sequence counter behind blob naming.
pub mod sequence;
/// Topology submission with retry, backoff and cancellation.
pub mod submit;
/// Shared word-count aggregation.
pub mod tally;
/// Topology wiring, argument parsing and run modes.
pub mod topology;
/// Transformer trait.
pub mod transformer;
/// Concrete transformers: suffixing and counting.
pub mod transformers;

pub use consumer::Consumer;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use producer::Producer;
pub use record::Record;
pub use transformer::Transformer;
