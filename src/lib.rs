//! estate - client for a real-estate marketplace API
//!
//! This crate provides an authenticated API client with single-flight token
//! refresh, typed endpoint services, optimistic favorite and collection
//! toggles, and the `estate` command-line tool built on top of them.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod http;
pub mod logging;
pub mod models;
pub mod output;
pub mod recent;
pub mod session;
pub mod toggle;
pub mod utils;

pub use error::{EstateError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
