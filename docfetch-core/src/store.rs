//! The document store client.
//!
//! [`DocumentStoreClient`] owns a connected [`DocumentSource`] and exposes the two
//! operations of the crate: [`connect`](DocumentStoreClient::connect), which validates
//! the configuration and checks liveness, and
//! [`list_documents`](DocumentStoreClient::list_documents), which reads the whole
//! collection.
//!
//! # Example
//!
//! ```ignore
//! use docfetch_core::{config::StoreConfig, context::FetchContext, store::DocumentStoreClient};
//!
//! let client = DocumentStoreClient::connect(source, StoreConfig::default()).await?;
//! let documents = client.list_documents(&FetchContext::background()).await?;
//! ```

use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::{runtime::Handle, time::timeout};
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{DocumentSource, RecordCursor},
    config::{Locator, StoreConfig},
    context::FetchContext,
    document::{Document, DocumentExt},
    error::{FetchError, FetchResult},
};


/// A client bound to one collection of a live document store.
///
/// # Type Parameters
///
/// * `S` - The source implementation type
#[derive(Debug)]
pub struct DocumentStoreClient<S: DocumentSource> {
    source: S,
    config: StoreConfig,
}

impl<S: DocumentSource> DocumentStoreClient<S> {
    /// Validates `config`, then pings `source` within `config.connect_timeout`.
    ///
    /// The timeout is internal; there is no way to cancel construction from outside
    /// other than dropping the returned future.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Config`] if the configuration is invalid, or if the source is
    ///   bound to a different locator than the configuration names
    /// - [`FetchError::Liveness`] if the ping fails
    /// - [`FetchError::LivenessTimeout`] if the ping does not answer in time
    #[instrument(skip_all, fields(database = %config.database, collection = %config.collection))]
    pub async fn connect(source: S, config: StoreConfig) -> FetchResult<Self> {
        config.validate()?;

        if source.locator() != &config.locator() {
            return Err(FetchError::Config(format!(
                "source is bound to {} but the configuration names {}",
                source.locator().namespace(),
                config.locator().namespace(),
            )));
        }

        let client = Self { source, config };
        client.ping().await?;

        info!(endpoint = %client.config.endpoint, "connected to document store");

        Ok(client)
    }

    /// Re-runs the liveness check under the configured connect timeout.
    pub async fn ping(&self) -> FetchResult<()> {
        timeout(self.config.connect_timeout, self.source.ping())
            .await
            .map_err(|_| FetchError::LivenessTimeout(self.config.connect_timeout))?
    }

    /// Fetches every document in the collection, in cursor order.
    ///
    /// The whole result set is materialized, so this is meant for small collections.
    /// Once a cursor has been opened it is released on every path, under the configured
    /// cleanup timeout rather than `ctx`.
    ///
    /// # Errors
    ///
    /// Fails without partial results on the first of:
    ///
    /// - [`FetchError::Query`] if the query cannot be issued
    /// - [`FetchError::Decode`] if a record cannot be decoded
    /// - [`FetchError::Cursor`] if the cursor fails while iterating
    /// - [`FetchError::Cancelled`] or [`FetchError::DeadlineExceeded`] if `ctx` ends first
    #[instrument(skip_all, fields(namespace = %self.source.locator().namespace()))]
    pub async fn list_documents(&self, ctx: &FetchContext) -> FetchResult<Vec<Document>> {
        debug!("issuing unfiltered query");

        let cursor = ctx.run(self.source.open_cursor()).await?;
        let mut guard = CursorGuard::new(cursor, self.config.cleanup_timeout);
        let result = drain(guard.cursor(), ctx).await;
        guard.release().await;

        match &result {
            Ok(documents) => debug!(count = documents.len(), "fetched documents"),
            Err(e) => debug!(error = %e, "fetch failed"),
        }

        result
    }

    /// Fetches every document and decodes each one into `T`.
    ///
    /// Same contract as [`list_documents`](Self::list_documents); a document that does
    /// not match `T` fails the whole call with [`FetchError::Decode`].
    pub async fn list_documents_as<T: DeserializeOwned>(
        &self,
        ctx: &FetchContext,
    ) -> FetchResult<Vec<T>> {
        self.list_documents(ctx)
            .await?
            .iter()
            .map(|document| document.decode::<T>())
            .collect()
    }

    pub fn locator(&self) -> &Locator {
        self.source.locator()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns a reference to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Closes the client and the underlying source.
    pub async fn shutdown(self) -> FetchResult<()> {
        self.source.shutdown().await
    }
}

/// Owns an open cursor and makes sure it is released exactly once.
///
/// The normal path awaits [`release`](Self::release). If the guard is dropped first
/// (the fetch future was dropped mid-iteration), the close is handed to a detached task
/// on the current runtime, still bounded by the cleanup timeout. Outside a runtime the
/// cursor is dropped in place.
struct CursorGuard<C: RecordCursor> {
    cursor: Option<C>,
    cleanup_timeout: Duration,
}

impl<C: RecordCursor> CursorGuard<C> {
    fn new(cursor: C, cleanup_timeout: Duration) -> Self {
        Self {
            cursor: Some(cursor),
            cleanup_timeout,
        }
    }

    fn cursor(&mut self) -> &mut C {
        // Only `release` and `Drop` take the cursor, and both end the guard.
        self.cursor
            .as_mut()
            .unwrap_or_else(|| unreachable!("cursor already released"))
    }

    async fn release(mut self) {
        if let Some(cursor) = self.cursor.take() {
            close_within(cursor, self.cleanup_timeout).await;
        }
    }
}

impl<C: RecordCursor> Drop for CursorGuard<C> {
    fn drop(&mut self) {
        let Some(cursor) = self.cursor.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                debug!("fetch dropped before release; closing cursor in background");
                handle.spawn(close_within(cursor, self.cleanup_timeout));
            }
            Err(_) => drop(cursor),
        }
    }
}

async fn close_within<C: RecordCursor>(cursor: C, cleanup_timeout: Duration) {
    match timeout(cleanup_timeout, cursor.close()).await {
        Ok(()) => debug!("cursor released"),
        Err(_) => warn!(
            timeout = ?cleanup_timeout,
            "cursor release did not finish in time; abandoning it"
        ),
    }
}

async fn drain<C: RecordCursor>(cursor: &mut C, ctx: &FetchContext) -> FetchResult<Vec<Document>> {
    let mut documents = Vec::new();

    while ctx.run(cursor.advance()).await? {
        documents.push(cursor.decode_current()?);
    }

    Ok(documents)
}
