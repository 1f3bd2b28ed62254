//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for the command-line tool
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` (single attempt, per-request timeout)
//! - `TableStore` using `csv` for delimited files, `calamine` for reading
//!   workbooks and `rust_xlsxwriter` for writing them
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileTableStore, ReqwestHttpClient};
//! use bridge_traits::{HttpClient, TableStore};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let tables = FileTableStore::new();
//!
//!     // Hand both to the catalog service
//!     Ok(())
//! }
//! ```

mod http;
mod tabular;

pub use http::ReqwestHttpClient;
pub use tabular::FileTableStore;
