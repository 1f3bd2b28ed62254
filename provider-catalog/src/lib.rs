//! # Catalog Provider
//!
//! Implements `CatalogProvider` for the media catalog's REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Metadata view, collection, and asset lookups
//! - Paged collection listings and cursor-based search
//! - Asset title and metadata updates
//! - Status triage with bounded retry under a per-operation deadline

pub mod connector;
pub mod error;
pub mod types;

pub use connector::CatalogConnector;
pub use error::{CatalogError, Result};
