//! Core of the docfetch project: a small client that connects to a document store,
//! verifies it is alive, and reads back every document of one collection.
//!
//! This crate provides:
//!
//! - **Configuration** ([`config`]) - Endpoint, locator and timeouts, validated once at startup
//! - **Source abstraction** ([`backend`]) - Traits implemented by concrete stores
//!   (MongoDB, in-memory)
//! - **Client** ([`store`]) - The connect and fetch-all operations over any source
//! - **Caller context** ([`context`]) - Deadline and cancellation carried into fetch calls
//! - **Documents** ([`document`]) - The dynamically typed document and typed decoding helpers
//! - **Error handling** ([`error`]) - The error taxonomy and result alias
//!
//! # Example
//!
//! ```ignore
//! use docfetch_core::{config::StoreConfig, context::FetchContext, store::DocumentStoreClient};
//! use std::time::Duration;
//!
//! let client = DocumentStoreClient::connect(source, StoreConfig::default()).await?;
//! let users = client
//!     .list_documents(&FetchContext::with_timeout(Duration::from_secs(5)))
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfetch_core;

pub mod backend;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod store;
