//! # Host Bridge Traits
//!
//! Contracts between the sync core and the outside world.
//!
//! ## Overview
//!
//! The core never touches the network, the filesystem, or the wall clock
//! directly. Each of those capabilities is a trait defined here and
//! implemented by a bridge crate (`bridge-desktop` for the CLI), so the
//! engine can be exercised against in-memory fakes.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Single-shot async HTTP with per-call timeout
//! - [`CatalogProvider`](catalog::CatalogProvider) - Typed operations on the remote asset catalog
//!
//! ### Files
//! - [`TableStore`](tabular::TableStore) - Read/write CSV and Excel tables as string rows
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! Bridge implementations report failures as [`BridgeError`](error::BridgeError):
//!
//! - Convert library-specific errors to `BridgeError`
//! - Keep transport failures (`Timeout`, `Transport`) distinct from request
//!   construction failures so callers can decide what to retry
//! - Include context (file paths, URLs) in messages
//!
//! Catalog operations use the richer [`CatalogError`](catalog::CatalogError),
//! which carries the HTTP status triage outcome.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! behind `Arc<dyn Trait>`.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod http;
pub mod tabular;
pub mod time;

pub use error::BridgeError;

pub use catalog::{
    Asset, CatalogError, CatalogProvider, CatalogResult, Collection, CollectionObject,
    CollectionPage, FieldOption, FileDescriptor, MetadataMap, MetadataUpdate, MetadataValue,
    MetadataView, ObjectKind, SearchRequest, SearchResults, ViewField,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use tabular::{TableFormat, TableStore};
pub use time::{Clock, FixedClock, SystemClock};
