//! HTTP client for the library catalog REST API.
//!
//! This crate provides:
//! - Typed records and request payloads for books, authors and genres
//! - [`ClientTrait`], the complete catalog API interface
//! - [`CatalogClient`], the HTTP implementation of that interface
//! - [`MockClient`], a client replaying canned responses for tests
//! - Common error handling for catalog API operations
//!
//! ## Usage
//!
//! ```ignore
//! use library_catalog::{BookListParams, CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let config = CatalogClientConfig::new("http://127.0.0.1:8000/api/v1");
//! let client = CatalogClient::new(config)?;
//! let page = client.list_books(&BookListParams::default()).await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
pub mod types;

pub use client::{CatalogClient, Client, ClientTrait, Resource};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::{CatalogClientError, ErrorResponse};
pub use mock::{GenericResponse, MockClient, MockDataError, RecordedCall, Response};
pub use types::*;
