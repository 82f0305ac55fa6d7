//! Vitrinex marketplace API library.
//!
//! Accounts with cookie-carried sessions, and stores that only their owner
//! may change. The `vitrinex-api` binary and the CLI both build on this
//! crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_app;
