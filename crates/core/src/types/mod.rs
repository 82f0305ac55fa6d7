//! Core types for Vitrinex.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod mode;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use mode::StoreMode;
pub use role::{AccountRole, RoleError};
