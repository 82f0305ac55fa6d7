//! Vitrinex Core - Shared types library.
//!
//! This crate provides common types used across all Vitrinex components:
//! - `api` - REST API for accounts and stores
//! - `cli` - Command-line tools for migrations, accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles and store modes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
