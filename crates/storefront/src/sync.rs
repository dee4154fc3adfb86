//! Cross-context synchronization.
//!
//! A [`StorageScope`] is what contexts share: the backing store plus a
//! broadcast channel of [`StorageEvent`]s. An event only says which key
//! changed and who changed it. Receivers re-read the record; they never
//! assume anything about ordering or content beyond "key X changed".
//!
//! Last writer wins. Contexts converge after the next notification or the
//! next explicit read.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::BrowsingContext;
use crate::store::{KeyValueStore, MemoryStore};

/// Notifications buffered per receiver before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Identifies one browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    /// Generate a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A context sharing this scope.
    Context(ContextId),
    /// Something outside the scope, such as another process writing the
    /// same data directory.
    External,
}

/// "The record under `key` changed."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: Origin,
    pub at: DateTime<Utc>,
}

impl StorageEvent {
    #[must_use]
    pub fn new(key: impl Into<String>, origin: Origin) -> Self {
        Self {
            key: key.into(),
            origin,
            at: Utc::now(),
        }
    }

    /// Time since the change was published.
    #[must_use]
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.at
    }

    /// Whether `context` produced this event.
    #[must_use]
    pub fn is_from(&self, context: ContextId) -> bool {
        self.origin == Origin::Context(context)
    }
}

/// Storage shared by a set of contexts.
///
/// Cheap to clone; clones share the backend and the channel.
#[derive(Debug, Clone)]
pub struct StorageScope {
    backend: Arc<dyn KeyValueStore>,
    sender: broadcast::Sender<StorageEvent>,
}

impl StorageScope {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { backend, sender }
    }

    /// A scope over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Deliver `event` to every subscriber. Nobody listening is not an error.
    pub fn publish(&self, event: StorageEvent) {
        debug!(key = %event.key, origin = ?event.origin, "Publishing storage event");
        let _ = self.sender.send(event);
    }
}

/// A running sync listener. Dropping the handle stops it.
#[derive(Debug)]
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop the listener and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that feeds `context` every notification of its scope.
///
/// The subscription is taken before this returns, so no event published
/// after the call is missed. If the listener falls behind, it re-reads both
/// records instead of replaying the dropped events.
///
/// Must be called from within a Tokio runtime.
#[must_use]
pub fn spawn_listener(context: BrowsingContext) -> ListenerHandle {
    let mut receiver = context.scope().subscribe();
    let task = tokio::spawn(async move {
        info!(context_id = %context.id(), "Sync listener started");
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    debug!(
                        context_id = %context.id(),
                        key = %event.key,
                        delay_ms = event.age().num_milliseconds(),
                        "Notification received"
                    );
                    context.handle_notification(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        context_id = %context.id(),
                        skipped,
                        "Sync listener lagged, resynchronizing"
                    );
                    context.resync();
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!(context_id = %context.id(), "Sync listener stopped");
    });
    ListenerHandle { task }
}
