//! Source abstraction for the document store client.
//!
//! This module defines the traits a concrete store implements so that
//! [`DocumentStoreClient`](crate::store::DocumentStoreClient) can connect to it and read
//! from it without knowing which store it is talking to.
//!
//! # Traits
//!
//! - [`DocumentSource`]: a connected store bound to one [`Locator`]
//! - [`RecordCursor`]: an open server-side iterator over a query result
//! - [`DocumentSourceBuilder`]: factory that creates a source from configuration
//!
//! # Cursor protocol
//!
//! A cursor is driven in three steps, and each step fails with its own error variant:
//!
//! 1. [`RecordCursor::advance`] moves to the next record, returning `Ok(false)` once
//!    the result set is exhausted. Failures are
//!    [`FetchError::Cursor`](crate::error::FetchError::Cursor).
//! 2. [`RecordCursor::decode_current`] decodes the record the cursor is positioned on.
//!    Failures are [`FetchError::Decode`](crate::error::FetchError::Decode).
//! 3. [`RecordCursor::close`] releases the cursor. It is infallible; implementations log
//!    what they cannot clean up. The client calls it once per opened cursor, also when
//!    the fetch future is dropped before iteration ends. Implementations should still
//!    release on `Drop`, for the case where no runtime is left to run `close`.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{config::Locator, document::Document, error::FetchResult};

/// A connected document store bound to one database and collection.
///
/// Implementations must be thread-safe; a single source may serve many concurrent fetches.
#[async_trait]
pub trait DocumentSource: Send + Sync + Debug {
    /// The cursor type produced by [`open_cursor`](Self::open_cursor).
    type Cursor: RecordCursor;

    /// The database and collection this source reads from.
    fn locator(&self) -> &Locator;

    /// Performs a single liveness round trip.
    ///
    /// Implementations do not bound the call themselves; the client applies the
    /// configured connect timeout around it.
    async fn ping(&self) -> FetchResult<()>;

    /// Issues an unfiltered query against the locator and returns its cursor.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Query`](crate::error::FetchError::Query) if the query
    /// cannot be issued.
    async fn open_cursor(&self) -> FetchResult<Self::Cursor>;

    /// Closes the source and its underlying connections.
    async fn shutdown(self) -> FetchResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// An open cursor over a query result.
///
/// Cursors are `'static` so that a cursor abandoned mid-fetch can be closed on a
/// detached task.
#[async_trait]
pub trait RecordCursor: Send + 'static {
    /// Moves to the next record; `Ok(false)` means the result set is exhausted.
    async fn advance(&mut self) -> FetchResult<bool>;

    /// Decodes the record the cursor is currently positioned on.
    fn decode_current(&self) -> FetchResult<Document>;

    /// Releases the cursor and any server-side resources it holds.
    async fn close(self)
    where
        Self: Sized;
}

/// Factory trait for constructing a [`DocumentSource`].
///
/// Building a source only prepares the driver; it does not check liveness. Use
/// [`DocumentStoreClient::connect`](crate::store::DocumentStoreClient::connect) to
/// build a client that has been pinged.
#[async_trait]
pub trait DocumentSourceBuilder {
    type Source: DocumentSource;

    async fn build(self) -> FetchResult<Self::Source>;
}
