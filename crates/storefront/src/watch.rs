//! Filesystem watcher for a [`FileStore`] directory.
//!
//! Processes that share a data directory cannot share a broadcast channel.
//! The watcher closes that gap: every record file created or replaced in the
//! directory becomes a [`StorageEvent`] with [`Origin::External`] on the
//! local scope, and the scope's contexts re-read as usual.

use std::collections::BTreeSet;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::error::Result;
use crate::store::FileStore;
use crate::sync::{Origin, StorageEvent, StorageScope};

/// Keeps the watcher alive. Dropping it stops watching.
pub struct ScopeWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for ScopeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeWatcher").finish_non_exhaustive()
    }
}

impl ScopeWatcher {
    /// Watch `store`'s directory and publish changes to `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform watcher cannot be created or the
    /// directory cannot be watched.
    pub fn start(store: &FileStore, scope: &StorageScope) -> Result<Self> {
        let scope = scope.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for key in changed_keys(&event) {
                        scope.publish(StorageEvent::new(key, Origin::External));
                    }
                }
                Err(e) => warn!(error = %e, "Store watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(store.dir(), RecursiveMode::NonRecursive)?;

        info!(dir = %store.dir().display(), "Watching store directory");
        Ok(Self { _watcher: watcher })
    }
}

/// Record keys touched by a filesystem event.
///
/// Only creations and modifications count; a rename onto a record file is
/// reported as a modification. Removals, accesses, and temporary files are
/// ignored.
#[must_use]
pub fn changed_keys(event: &Event) -> BTreeSet<String> {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return BTreeSet::new();
    }
    event
        .paths
        .iter()
        .filter_map(|path| FileStore::key_for_path(path))
        .collect()
}
