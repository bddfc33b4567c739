use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::{Client, Collection as MongoCollection, Cursor, options::ClientOptions};
use tracing::debug;

use docfetch_core::{
    backend::{DocumentSource, DocumentSourceBuilder, RecordCursor},
    config::{Locator, StoreConfig},
    error::{FetchError, FetchResult},
    store::DocumentStoreClient,
};


/// Validates `config`, builds a MongoDB source for it and checks liveness.
///
/// # Errors
///
/// - [`FetchError::Config`] if the configuration is invalid
/// - [`FetchError::Connection`] if the driver client cannot be created
/// - [`FetchError::Liveness`] or [`FetchError::LivenessTimeout`] if the ping fails
pub async fn connect(config: StoreConfig) -> FetchResult<DocumentStoreClient<MongoDbSource>> {
    config.validate()?;

    let source = MongoDbSource::builder(config.clone()).build().await?;

    DocumentStoreClient::connect(source, config).await
}

#[derive(Debug)]
pub struct MongoDbSource {
    client: Client,
    locator: Locator,
}

impl MongoDbSource {
    pub fn new(client: Client, locator: Locator) -> Self {
        Self { client, locator }
    }

    pub fn builder(config: StoreConfig) -> MongoDbSourceBuilder {
        MongoDbSourceBuilder::new(config)
    }

    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self) -> MongoCollection<Document> {
        self.client
            .database(&self.locator.database)
            .collection(&self.locator.collection)
    }
}

#[async_trait]
impl DocumentSource for MongoDbSource {
    type Cursor = MongoDbCursor;

    fn locator(&self) -> &Locator {
        &self.locator
    }

    async fn ping(&self) -> FetchResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| FetchError::Liveness(e.to_string()))?;

        Ok(())
    }

    async fn open_cursor(&self) -> FetchResult<Self::Cursor> {
        Ok(MongoDbCursor {
            inner: self
                .get_collection()
                .find(doc! {})
                .await
                .map_err(|e| FetchError::Query(e.to_string()))?,
        })
    }

    async fn shutdown(self) -> FetchResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// A driver cursor over the result of an unfiltered find.
#[derive(Debug)]
pub struct MongoDbCursor {
    inner: Cursor<Document>,
}

#[async_trait]
impl RecordCursor for MongoDbCursor {
    async fn advance(&mut self) -> FetchResult<bool> {
        self.inner
            .advance()
            .await
            .map_err(|e| FetchError::Cursor(e.to_string()))
    }

    fn decode_current(&self) -> FetchResult<Document> {
        self.inner
            .deserialize_current()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn close(self) {
        // Dropping a live driver cursor issues killCursors on a detached task.
        drop(self.inner);
        debug!("driver cursor dropped");
    }
}

pub struct MongoDbSourceBuilder {
    config: StoreConfig,
}

impl MongoDbSourceBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DocumentSourceBuilder for MongoDbSourceBuilder {
    type Source = MongoDbSource;

    async fn build(self) -> FetchResult<Self::Source> {
        let mut options = ClientOptions::parse(&self.config.endpoint)
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        options.connect_timeout = Some(self.config.connect_timeout);
        options.server_selection_timeout = Some(self.config.connect_timeout);
        if let Some(app_name) = &self.config.app_name {
            options.app_name = Some(app_name.clone());
        }

        Ok(MongoDbSource::new(
            Client::with_options(options).map_err(|e| FetchError::Connection(e.to_string()))?,
            self.config.locator(),
        ))
    }
}
