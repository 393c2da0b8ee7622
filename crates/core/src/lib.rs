//! Peerbook Core - Shared types library.
//!
//! This crate provides common types used across all Peerbook components:
//! - `server` - First-install report ingestion and address book API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, device identity, statuses, and
//!   date-bucket labels

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
