//! MongoDB source implementation for docfetch.
//!
//! This crate implements the `DocumentSource` trait on top of the official MongoDB async
//! driver, so the generic client can ping a server and read a collection through it.
//!
//! To use this source, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docfetch = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The endpoint, database and collection come from a `StoreConfig`. [`connect`] validates
//! it, builds the driver client and pings the server before handing back a client.
//!
//! # Example
//!
//! ```ignore
//! use docfetch::{prelude::*, mongodb::connect};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = connect(StoreConfig::from_env()?).await?;
//!     let users = client.list_documents(&FetchContext::background()).await?;
//!
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docfetch_mongodb;

pub mod store;

pub use store::{MongoDbCursor, MongoDbSource, MongoDbSourceBuilder, connect};
