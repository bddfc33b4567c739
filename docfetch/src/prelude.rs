//! Convenient re-exports of commonly used types from docfetch.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docfetch::prelude::*;
//! ```

pub use docfetch_core::{
    backend::{DocumentSource, DocumentSourceBuilder, RecordCursor},
    config::{Locator, StoreConfig},
    context::FetchContext,
    document::{Document, DocumentExt},
    error::{FetchError, FetchResult},
    store::DocumentStoreClient,
};
