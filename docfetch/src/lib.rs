//! Main docfetch crate providing a small client for reading a document store collection.
//!
//! This crate is the primary entry point for users of docfetch. It re-exports the core
//! types from the sub-crates and gives access to the available sources.
//!
//! # Features
//!
//! - **Validated configuration** - Endpoint, database, collection and time bounds checked
//!   once at startup
//! - **Liveness on connect** - A client is only handed out after the store answered a ping
//! - **Fetch-all** - Every document of the collection, in cursor order, or nothing on failure
//! - **Caller context** - Deadlines and cancellation for reads; cursor cleanup runs regardless
//! - **Multiple sources** - MongoDB and an in-memory source for development and testing
//!
//! # Quick Start
//!
//! ```ignore
//! use docfetch::{prelude::*, memory::InMemorySource};
//! use bson::doc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create an in-memory source seeded with two users
//!     let source = InMemorySource::builder()
//!         .documents(vec![
//!             doc! { "_id": 1, "name": "Alice" },
//!             doc! { "_id": 2, "name": "Bob" },
//!         ])
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     // Connect: validates the config and pings the source
//!     let client = DocumentStoreClient::connect(source, StoreConfig::default())
//!         .await
//!         .unwrap();
//!
//!     // Read the whole collection under a five second deadline
//!     let users = client
//!         .list_documents(&FetchContext::with_timeout(Duration::from_secs(5)))
//!         .await
//!         .unwrap();
//!
//!     println!("Fetched users: {:?}", users);
//!
//!     client.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Startup failures
//!
//! Construction returns an error instead of aborting. Callers that cannot run without a
//! store typically treat [`FetchError::is_startup`](error::FetchError::is_startup) errors
//! as fatal:
//!
//! ```ignore
//! let client = match docfetch::mongodb::connect(StoreConfig::from_env()?).await {
//!     Ok(client) => client,
//!     Err(e) if e.is_startup() => {
//!         eprintln!("document store unavailable: {e}");
//!         std::process::exit(1);
//!     }
//!     Err(e) => return Err(e.into()),
//! };
//! ```
//!
//! # Sources
//!
//! - [`memory`] - In-memory source with fault injection
//! - [`mongodb`] - MongoDB source (requires `mongodb` feature)

pub mod prelude;

pub use docfetch_core::{backend, config, context, document, error, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory source implementations.
pub mod memory {
    pub use docfetch_memory::{InMemoryCursor, InMemorySource, InMemorySourceBuilder};
}

/// MongoDB source implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docfetch_mongodb::{MongoDbCursor, MongoDbSource, MongoDbSourceBuilder, connect};
}
