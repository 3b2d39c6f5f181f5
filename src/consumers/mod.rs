//! Consumer implementations.

pub mod blob_sink;
pub mod vec_consumer;

pub use blob_sink::{BlobSink, SinkError};
pub use vec_consumer::VecConsumer;
