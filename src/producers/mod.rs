//! Producer implementations.

pub mod word_producer;

pub use word_producer::WordProducer;
