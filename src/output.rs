//! Marker trait for components that produce a stream.

use futures::Stream;

/// Implemented by producers and transformers; fixes the item type they emit
/// and the concrete stream type they hand downstream.
pub trait Output
where
  Self::Output: Send + 'static,
{
  /// Item type emitted by this component.
  type Output;
  /// Stream of output items. Boxed and pinned at trait seams.
  type OutputStream: Stream<Item = Self::Output> + Send + 'static;
}
