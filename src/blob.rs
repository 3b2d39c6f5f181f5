//! Blob storage seam.
//!
//! The cloud object store itself is an external collaborator; this module
//! defines the [`BlobStore`] trait the sink writes through, the storage
//! configuration with its connection-string validation, and an in-memory
//! store used by tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Error raised by a blob store operation.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The target container does not exist.
  #[error("container {0} does not exist")]
  NoContainer(String),
  /// A blob with this name already exists; blobs are write-once.
  #[error("blob {0} already exists")]
  BlobExists(String),
  /// The storage endpoint could not be reached.
  #[error("storage endpoint unreachable: {0}")]
  Unreachable(String),
}

/// Destination of the blob sink: where to connect, which container, and the
/// prefix blob names are derived from.
#[derive(Debug, Clone)]
pub struct StorageConfig {
  /// Account connection string, `key=value` pairs separated by `;`.
  pub connection_string: String,
  /// Destination container, created on prepare if absent.
  pub container: String,
  /// Prefix each blob name starts with; the sequence number is appended.
  pub prefix: String,
}

impl StorageConfig {
  /// Creates a config from its three parts.
  pub fn new(
    connection_string: impl Into<String>,
    container: impl Into<String>,
    prefix: impl Into<String>,
  ) -> Self {
    Self {
      connection_string: connection_string.into(),
      container: container.into(),
      prefix: prefix.into(),
    }
  }

  /// Checks the connection string shape: `;`-separated `key=value` pairs
  /// that include `AccountName` and `AccountKey`. Returns the offending
  /// detail on failure; credential validation proper belongs to the store.
  pub fn validate(&self) -> Result<(), String> {
    let mut has_name = false;
    let mut has_key = false;
    for pair in self.connection_string.split(';').filter(|p| !p.is_empty()) {
      let Some((key, value)) = pair.split_once('=') else {
        return Err(format!("malformed connection string segment: {}", pair));
      };
      match key {
        "AccountName" => has_name = !value.is_empty(),
        "AccountKey" => has_key = !value.is_empty(),
        _ => {}
      }
    }
    if !has_name {
      return Err("connection string is missing AccountName".to_string());
    }
    if !has_key {
      return Err("connection string is missing AccountKey".to_string());
    }
    if self.container.is_empty() {
      return Err("container name is empty".to_string());
    }
    Ok(())
  }
}

/// Text-blob operations the sink needs from an object store.
#[async_trait]
pub trait BlobStore: Send + Sync {
  /// Creates the container if it does not exist. Idempotent.
  async fn ensure_container(&self, container: &str) -> Result<(), StoreError>;

  /// Writes a new blob. Blobs are write-once; an existing name is an error.
  async fn put_text(&self, container: &str, name: &str, body: &str) -> Result<(), StoreError>;

  /// Reads a blob's text, or `None` if it does not exist.
  async fn get_text(&self, container: &str, name: &str) -> Result<Option<String>, StoreError>;

  /// Lists blob names in a container starting with `prefix`.
  async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory blob store. Clones share the same tree, so a test can hand a
/// store to a sink and inspect what was written through another handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
  containers: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
  unreachable: Arc<AtomicBool>,
}

impl MemoryBlobStore {
  /// Creates an empty store.
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every subsequent operation fail with `Unreachable`, for testing
  /// the transient-failure paths.
  pub fn set_unreachable(&self, unreachable: bool) {
    self.unreachable.store(unreachable, Ordering::SeqCst);
  }

  fn check_reachable(&self) -> Result<(), StoreError> {
    if self.unreachable.load(Ordering::SeqCst) {
      return Err(StoreError::Unreachable("memory store offline".to_string()));
    }
    Ok(())
  }

  /// Number of blobs in a container, 0 if it does not exist.
  pub fn blob_count(&self, container: &str) -> usize {
    self
      .containers
      .lock()
      .expect("store mutex poisoned")
      .get(container)
      .map(|blobs| blobs.len())
      .unwrap_or(0)
  }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
  async fn ensure_container(&self, container: &str) -> Result<(), StoreError> {
    self.check_reachable()?;
    self
      .containers
      .lock()
      .expect("store mutex poisoned")
      .entry(container.to_string())
      .or_default();
    Ok(())
  }

  async fn put_text(&self, container: &str, name: &str, body: &str) -> Result<(), StoreError> {
    self.check_reachable()?;
    let mut containers = self.containers.lock().expect("store mutex poisoned");
    let blobs = containers
      .get_mut(container)
      .ok_or_else(|| StoreError::NoContainer(container.to_string()))?;
    if blobs.contains_key(name) {
      return Err(StoreError::BlobExists(name.to_string()));
    }
    blobs.insert(name.to_string(), body.to_string());
    Ok(())
  }

  async fn get_text(&self, container: &str, name: &str) -> Result<Option<String>, StoreError> {
    self.check_reachable()?;
    let containers = self.containers.lock().expect("store mutex poisoned");
    Ok(
      containers
        .get(container)
        .and_then(|blobs| blobs.get(name))
        .cloned(),
    )
  }

  async fn list(&self, container: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
    self.check_reachable()?;
    let containers = self.containers.lock().expect("store mutex poisoned");
    let mut names: Vec<String> = containers
      .get(container)
      .map(|blobs| {
        blobs
          .keys()
          .filter(|name| name.starts_with(prefix))
          .cloned()
          .collect()
      })
      .unwrap_or_default();
    names.sort();
    Ok(names)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn valid_config() -> StorageConfig {
    StorageConfig::new(
      "DefaultEndpointsProtocol=https;AccountName=sample;AccountKey=c2VjcmV0",
      "words",
      "blob",
    )
  }

  #[test]
  fn valid_connection_string_passes() {
    assert!(valid_config().validate().is_ok());
  }

  #[test]
  fn missing_account_key_is_rejected() {
    let config = StorageConfig::new("AccountName=sample", "words", "blob");
    let err = config.validate().unwrap_err();
    assert!(err.contains("AccountKey"));
  }

  #[test]
  fn malformed_segment_is_rejected() {
    let config = StorageConfig::new("AccountName=sample;garbage", "words", "blob");
    assert!(config.validate().unwrap_err().contains("garbage"));
  }

  #[tokio::test]
  async fn ensure_container_is_idempotent() {
    let store = MemoryBlobStore::new();
    store.ensure_container("c").await.unwrap();
    store.put_text("c", "b1", "x").await.unwrap();
    store.ensure_container("c").await.unwrap();
    assert_eq!(store.get_text("c", "b1").await.unwrap().as_deref(), Some("x"));
  }

  #[tokio::test]
  async fn blobs_are_write_once() {
    let store = MemoryBlobStore::new();
    store.ensure_container("c").await.unwrap();
    store.put_text("c", "b1", "first").await.unwrap();
    assert!(matches!(
      store.put_text("c", "b1", "second").await,
      Err(StoreError::BlobExists(_))
    ));
  }

  #[tokio::test]
  async fn missing_container_is_an_error() {
    let store = MemoryBlobStore::new();
    assert!(matches!(
      store.put_text("nope", "b", "x").await,
      Err(StoreError::NoContainer(_))
    ));
  }

  #[tokio::test]
  async fn unreachable_store_fails_every_operation() {
    let store = MemoryBlobStore::new();
    store.set_unreachable(true);
    assert!(matches!(
      store.ensure_container("c").await,
      Err(StoreError::Unreachable(_))
    ));
    store.set_unreachable(false);
    assert!(store.ensure_container("c").await.is_ok());
  }

  #[tokio::test]
  async fn list_filters_by_prefix() {
    let store = MemoryBlobStore::new();
    store.ensure_container("c").await.unwrap();
    store.put_text("c", "blob1", "x").await.unwrap();
    store.put_text("c", "blob2", "y").await.unwrap();
    store.put_text("c", "other", "z").await.unwrap();
    assert_eq!(store.list("c", "blob").await.unwrap(), vec!["blob1", "blob2"]);
  }
}
