//! Beelivery Storefront library.
//!
//! The storefront widget core: a shopping cart and a light/dark theme kept in
//! device-local storage, shared by every browsing context (tab, window, or
//! process) opened on the same storage scope.
//!
//! # Architecture
//!
//! - [`store`] - key-value backends and the record adapter for the cart and theme records
//! - [`context`] - one browsing context: cart/theme operations and view hooks
//! - [`sync`] - storage scope, change notifications, and the sync listener
//! - [`watch`] - filesystem watcher turning file-store changes into notifications
//! - [`catalog`] - static product catalog with search/filter
//! - [`views`] - display models for external renderers
//!
//! The store is the single source of truth: every operation re-reads the
//! record it touches, and every notification triggers a re-read instead of
//! trusting a payload.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod store;
pub mod sync;
pub mod views;
pub mod watch;

pub use catalog::Catalog;
pub use config::{ConfigError, StorefrontConfig};
pub use context::BrowsingContext;
pub use error::StoreError;
pub use hooks::{CartSummary, Notice};
pub use store::{FileStore, KeyValueStore, MemoryStore, RecordKeys, RecordStore};
pub use sync::{ContextId, ListenerHandle, Origin, StorageEvent, StorageScope};
pub use watch::ScopeWatcher;
