//! Coordination-service smoke checks.
//!
//! The coordination service (a remote tree of nodes with ephemeral or
//! persistent lifecycle) is an external collaborator behind the
//! [`CoordinationClient`] trait. The smoke checks here are standalone
//! diagnostics, not part of the data pipelines: they walk a single node
//! through `Absent -> Created -> Verified` and report the first assertion
//! that fails.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Lifecycle of a coordination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
  /// Removed automatically when the creating session closes.
  Ephemeral,
  /// Survives the creating session.
  Persistent,
}

/// Error raised by a coordination client operation.
#[derive(Debug, Error)]
pub enum CoordinationError {
  /// A node already exists at the path.
  #[error("node {0} already exists")]
  NodeExists(String),
  /// No node exists at the path.
  #[error("no node at {0}")]
  NoNode(String),
  /// The client's session is closed.
  #[error("session is closed")]
  SessionClosed,
}

/// Error raised by a smoke check.
#[derive(Debug, Error)]
pub enum SmokeError {
  /// The node existed before the check started; nothing was created.
  #[error("node {0} already exists")]
  AlreadyExists(String),
  /// The node was created but a follow-up existence check failed.
  #[error("node {0} does not exist after creation")]
  CreationVerification(String),
  /// A client call failed outright.
  #[error(transparent)]
  Coordination(#[from] CoordinationError),
}

/// Connection parameters for a coordination service.
#[derive(Debug, Clone)]
pub struct CoordinationConfig {
  /// `host:port` of the service.
  pub endpoint: String,
  /// Session timeout negotiated with the service.
  pub session_timeout: Duration,
}

impl Default for CoordinationConfig {
  fn default() -> Self {
    Self {
      endpoint: "localhost:2181".to_string(),
      session_timeout: Duration::from_secs(3),
    }
  }
}

/// Session-scoped handle to a coordination service.
///
/// Each handle owns its own session; the "two independent clients" scenario
/// uses two handles, never a shared one. Closing a session releases its
/// ephemeral nodes, which is a property of the service itself.
#[async_trait]
pub trait CoordinationClient: Send {
  /// Whether a node exists at `path`.
  async fn exists(&self, path: &str) -> Result<bool, CoordinationError>;

  /// Creates a node at `path` with the given payload and lifecycle.
  async fn create(
    &self,
    path: &str,
    payload: &[u8],
    mode: CreateMode,
  ) -> Result<(), CoordinationError>;

  /// Deletes the node at `path`.
  async fn delete(&self, path: &str) -> Result<(), CoordinationError>;

  /// Closes the session, releasing any ephemeral nodes it created.
  async fn close(&mut self) -> Result<(), CoordinationError>;
}

#[derive(Debug, Clone)]
struct NodeEntry {
  payload: Vec<u8>,
  mode: CreateMode,
  owner: u64,
}

/// The shared node tree an in-memory coordination service serves.
#[derive(Debug, Default)]
pub struct CoordinationTree {
  nodes: Mutex<HashMap<String, NodeEntry>>,
  next_session: AtomicU64,
}

impl CoordinationTree {
  /// Creates an empty tree.
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }
}

/// In-memory coordination client. Sessions connected to the same
/// [`CoordinationTree`] see each other's nodes, which is what the two-client
/// smoke check exercises.
#[derive(Debug)]
pub struct MemoryCoordination {
  tree: Arc<CoordinationTree>,
  session: u64,
  open: bool,
}

impl MemoryCoordination {
  /// Opens a new session against the shared tree.
  pub fn connect(tree: Arc<CoordinationTree>) -> Self {
    let session = tree.next_session.fetch_add(1, Ordering::Relaxed) + 1;
    Self {
      tree,
      session,
      open: true,
    }
  }

  fn check_open(&self) -> Result<(), CoordinationError> {
    if self.open {
      Ok(())
    } else {
      Err(CoordinationError::SessionClosed)
    }
  }
}

#[async_trait]
impl CoordinationClient for MemoryCoordination {
  async fn exists(&self, path: &str) -> Result<bool, CoordinationError> {
    self.check_open()?;
    let nodes = self.tree.nodes.lock().expect("tree mutex poisoned");
    Ok(nodes.contains_key(path))
  }

  async fn create(
    &self,
    path: &str,
    payload: &[u8],
    mode: CreateMode,
  ) -> Result<(), CoordinationError> {
    self.check_open()?;
    let mut nodes = self.tree.nodes.lock().expect("tree mutex poisoned");
    if nodes.contains_key(path) {
      return Err(CoordinationError::NodeExists(path.to_string()));
    }
    nodes.insert(
      path.to_string(),
      NodeEntry {
        payload: payload.to_vec(),
        mode,
        owner: self.session,
      },
    );
    Ok(())
  }

  async fn delete(&self, path: &str) -> Result<(), CoordinationError> {
    self.check_open()?;
    let mut nodes = self.tree.nodes.lock().expect("tree mutex poisoned");
    nodes
      .remove(path)
      .map(|_| ())
      .ok_or_else(|| CoordinationError::NoNode(path.to_string()))
  }

  async fn close(&mut self) -> Result<(), CoordinationError> {
    self.check_open()?;
    self.open = false;
    let mut nodes = self.tree.nodes.lock().expect("tree mutex poisoned");
    nodes.retain(|_, entry| entry.mode != CreateMode::Ephemeral || entry.owner != self.session);
    Ok(())
  }
}

/// Single-client smoke check over one node path.
///
/// The path must start absent; the check creates an ephemeral node there and
/// verifies it became visible. The node is left for session close to reclaim.
pub async fn smoke_check<C: CoordinationClient>(client: &C, path: &str) -> Result<(), SmokeError> {
  if client.exists(path).await? {
    return Err(SmokeError::AlreadyExists(path.to_string()));
  }
  client.create(path, &[], CreateMode::Ephemeral).await?;
  if !client.exists(path).await? {
    return Err(SmokeError::CreationVerification(path.to_string()));
  }
  info!(path, "coordination smoke check passed");
  Ok(())
}

/// Two-client smoke check: `writer` creates the node, `observer` (an
/// independent session) verifies it is visible, exercising cross-connection
/// consistency of the service. The observer also performs the initial
/// absence check, and the writer deletes the node on the way out.
pub async fn smoke_check_two_clients<W, O>(
  writer: &W,
  observer: &O,
  path: &str,
) -> Result<(), SmokeError>
where
  W: CoordinationClient,
  O: CoordinationClient,
{
  if observer.exists(path).await? {
    return Err(SmokeError::AlreadyExists(path.to_string()));
  }
  writer.create(path, &[], CreateMode::Ephemeral).await?;
  if !observer.exists(path).await? {
    return Err(SmokeError::CreationVerification(path.to_string()));
  }
  writer.delete(path).await?;
  info!(path, "two-client coordination smoke check passed");
  Ok(())
}
