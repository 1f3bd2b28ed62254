//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the catalog sync tool:
//! - Logging and tracing infrastructure
//! - Run configuration and validation
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It owns no global state: configuration is an explicit [`SyncConfig`]
//! value handed to the service, and logging is installed once by the binary.
//!
//! [`SyncConfig`]: config::SyncConfig

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
