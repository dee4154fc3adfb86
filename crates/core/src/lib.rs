//! Beelivery Core - Shared types library.
//!
//! This crate provides the types used across all Beelivery components:
//! - `storefront` - The storefront widget (store adapter, cart/theme models, sync)
//! - `cli` - Command-line surface over a file-backed store
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage access, no event delivery. Cart mutation rules live here so
//! they can be exercised without any storage backend.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, decimal prices, catalog products, cart lines, and theme

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
