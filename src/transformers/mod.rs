//! Transformer implementations.

pub mod counting_transformer;
pub mod suffix_transformer;

pub use counting_transformer::CountingTransformer;
pub use suffix_transformer::SuffixTransformer;
