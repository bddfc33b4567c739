//! In-memory source implementation.
//!
//! Records live in a `Vec<Bson>` guarded by an async-safe read-write lock. Each opened
//! cursor iterates over a snapshot taken when it was opened, so concurrent writes through
//! the fixture helpers never disturb an iteration in progress.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;
use tokio::time::sleep;
use tracing::debug;

use docfetch_core::{
    backend::{DocumentSource, DocumentSourceBuilder, RecordCursor},
    config::Locator,
    error::{FetchError, FetchResult},
};


/// Failures and latency the source injects into the client's calls.
#[derive(Debug, Clone, Default)]
struct Faults {
    ping_error: Option<String>,
    ping_delay: Option<Duration>,
    query_error: Option<String>,
    cursor_error_after: Option<(usize, String)>,
    advance_delay: Option<Duration>,
    close_delay: Option<Duration>,
}

/// Thread-safe in-memory document source bound to one locator.
///
/// `InMemorySource` is cloneable; clones share the same records and counters, so a test
/// can keep a handle for seeding data and inspecting cursor counts after handing the
/// source to a client.
///
/// Records are stored as raw [`Bson`] values. Anything other than a document models a
/// malformed record and fails to decode when the cursor reaches it.
#[derive(Clone, Debug)]
pub struct InMemorySource {
    locator: Locator,
    records: Arc<RwLock<Vec<Bson>>>,
    faults: Arc<Faults>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemorySource {
    /// Creates an empty source bound to `locator` with no faults.
    pub fn new(locator: Locator) -> Self {
        Self::with_parts(locator, Vec::new(), Faults::default())
    }

    /// Creates a builder for a source with seeded records or injected faults.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docfetch_memory::InMemorySource;
    ///
    /// let source = InMemorySource::builder()
    ///     .fail_cursor_after(1, "connection reset")
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemorySourceBuilder {
        InMemorySourceBuilder::default()
    }

    fn with_parts(locator: Locator, records: Vec<Bson>, faults: Faults) -> Self {
        Self {
            locator,
            records: Arc::new(RwLock::new(records)),
            faults: Arc::new(faults),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Appends well-formed documents to the collection.
    pub async fn insert_documents(&self, documents: Vec<Document>) {
        self.insert_records(documents.into_iter().map(Bson::Document).collect())
            .await;
    }

    /// Appends raw records, which may be malformed, to the collection.
    pub async fn insert_records(&self, records: Vec<Bson>) {
        self.records.write().await.extend(records);
    }

    /// Removes every record from the collection.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of cursors opened so far.
    pub fn opened_cursors(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of cursors released so far, by `close` or by being dropped.
    pub fn closed_cursors(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for InMemorySource {
    type Cursor = InMemoryCursor;

    fn locator(&self) -> &Locator {
        &self.locator
    }

    async fn ping(&self) -> FetchResult<()> {
        if let Some(delay) = self.faults.ping_delay {
            sleep(delay).await;
        }

        match &self.faults.ping_error {
            Some(message) => Err(FetchError::Liveness(message.clone())),
            None => Ok(()),
        }
    }

    async fn open_cursor(&self) -> FetchResult<Self::Cursor> {
        if let Some(message) = &self.faults.query_error {
            return Err(FetchError::Query(message.clone()));
        }

        let snapshot = self.records.read().await.clone();
        self.opened.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryCursor {
            records: snapshot,
            next: 0,
            current: None,
            faults: Arc::clone(&self.faults),
            closed: Arc::clone(&self.closed),
            released: false,
        })
    }

    async fn shutdown(self) -> FetchResult<()> {
        debug!(namespace = %self.locator.namespace(), "in-memory source shut down");

        Ok(())
    }
}

/// Cursor over a snapshot of an [`InMemorySource`]'s records.
///
/// The cursor counts as released once, either when [`close`](RecordCursor::close)
/// finishes or when it is dropped without having been closed.
#[derive(Debug)]
pub struct InMemoryCursor {
    records: Vec<Bson>,
    next: usize,
    current: Option<usize>,
    faults: Arc<Faults>,
    closed: Arc<AtomicUsize>,
    released: bool,
}

impl InMemoryCursor {
    fn mark_released(&mut self) {
        if !self.released {
            self.released = true;
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for InMemoryCursor {
    fn drop(&mut self) {
        self.mark_released();
    }
}

#[async_trait]
impl RecordCursor for InMemoryCursor {
    async fn advance(&mut self) -> FetchResult<bool> {
        if let Some(delay) = self.faults.advance_delay {
            sleep(delay).await;
        }

        if let Some((after, message)) = &self.faults.cursor_error_after {
            if self.next == *after {
                self.current = None;
                return Err(FetchError::Cursor(message.clone()));
            }
        }

        if self.next < self.records.len() {
            self.current = Some(self.next);
            self.next += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn decode_current(&self) -> FetchResult<Document> {
        match self.current.map(|index| &self.records[index]) {
            Some(Bson::Document(document)) => Ok(document.clone()),
            Some(other) => Err(FetchError::Decode(format!(
                "record {} is a {:?}, not a document",
                self.next - 1,
                other.element_type(),
            ))),
            None => Err(FetchError::Cursor("cursor is not positioned on a record".into())),
        }
    }

    async fn close(mut self) {
        if let Some(delay) = self.faults.close_delay {
            sleep(delay).await;
        }

        self.mark_released();
    }
}

/// Builder for [`InMemorySource`].
#[derive(Debug, Default)]
pub struct InMemorySourceBuilder {
    locator: Option<Locator>,
    records: Vec<Bson>,
    faults: Faults,
}

impl InMemorySourceBuilder {
    /// Binds the source to `locator` instead of the default `r&d.users`.
    pub fn locator(mut self, locator: Locator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn documents(mut self, documents: Vec<Document>) -> Self {
        self.records.extend(documents.into_iter().map(Bson::Document));
        self
    }

    pub fn records(mut self, records: Vec<Bson>) -> Self {
        self.records.extend(records);
        self
    }

    /// Makes every ping fail with `message`.
    pub fn fail_ping(mut self, message: impl Into<String>) -> Self {
        self.faults.ping_error = Some(message.into());
        self
    }

    pub fn ping_delay(mut self, delay: Duration) -> Self {
        self.faults.ping_delay = Some(delay);
        self
    }

    /// Makes every query fail to issue with `message`.
    pub fn fail_query(mut self, message: impl Into<String>) -> Self {
        self.faults.query_error = Some(message.into());
        self
    }

    /// Makes cursors fail with `message` once they have yielded `records` records.
    pub fn fail_cursor_after(mut self, records: usize, message: impl Into<String>) -> Self {
        self.faults.cursor_error_after = Some((records, message.into()));
        self
    }

    pub fn advance_delay(mut self, delay: Duration) -> Self {
        self.faults.advance_delay = Some(delay);
        self
    }

    pub fn close_delay(mut self, delay: Duration) -> Self {
        self.faults.close_delay = Some(delay);
        self
    }
}

#[async_trait]
impl DocumentSourceBuilder for InMemorySourceBuilder {
    type Source = InMemorySource;

    async fn build(self) -> FetchResult<Self::Source> {
        Ok(InMemorySource::with_parts(
            self.locator.unwrap_or_default(),
            self.records,
            self.faults,
        ))
    }
}
