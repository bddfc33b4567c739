//! In-memory document source for docfetch.
//!
//! This crate provides a thread-safe, in-memory implementation of the `DocumentSource`
//! trait. It holds the records of a single collection behind an async-aware read-write
//! lock and can be told to fail or stall at every step a real store can, which makes it
//! the source of choice for development and for testing the client's failure handling.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent fetches share one snapshot-per-cursor store
//! - **Malformed records** - Any non-document BSON value fails to decode, like a corrupt record
//! - **Fault injection** - Ping, query and cursor failures plus artificial latency
//! - **Release tracking** - Counts opened and closed cursors
//!
//! # Quick Start
//!
//! ```ignore
//! use docfetch::{prelude::*, memory::InMemorySource};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = InMemorySource::builder().build().await?;
//!     source.insert_documents(vec![doc! { "_id": 1, "name": "Alice" }]).await;
//!
//!     let client = DocumentStoreClient::connect(source, StoreConfig::default()).await?;
//!     let users = client.list_documents(&FetchContext::background()).await?;
//!     assert_eq!(users.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfetch_memory;

pub mod store;

pub use store::{InMemoryCursor, InMemorySource, InMemorySourceBuilder};
