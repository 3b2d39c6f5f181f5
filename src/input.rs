//! Marker trait for components that consume a stream.

use futures::Stream;

/// Implemented by transformers and consumers; fixes the item type they accept
/// and the concrete stream type they are driven from.
pub trait Input
where
  Self::Input: Send + 'static,
{
  /// Item type accepted by this component.
  type Input;
  /// Stream of input items. Boxed and pinned at trait seams.
  type InputStream: Stream<Item = Self::Input> + Send + 'static;
}
