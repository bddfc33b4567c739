use std::{sync::Arc, time::Duration};

use bson::{Bson, doc};
use serde::Deserialize;
use tokio::time::Instant;

use docfetch_core::{
    backend::DocumentSourceBuilder,
    config::{Locator, StoreConfig},
    context::FetchContext,
    error::FetchError,
    store::DocumentStoreClient,
};
use docfetch_memory::{InMemorySource, InMemorySourceBuilder};

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    #[serde(rename = "_id")]
    id: i32,
    name: String,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn connect(
    builder: InMemorySourceBuilder,
) -> (InMemorySource, DocumentStoreClient<InMemorySource>) {
    init_tracing();

    let source = builder.build().await.unwrap();
    let client = DocumentStoreClient::connect(source.clone(), StoreConfig::default())
        .await
        .unwrap();

    (source, client)
}

fn alice_and_bob() -> Vec<bson::Document> {
    vec![
        doc! { "_id": 1, "name": "Alice" },
        doc! { "_id": 2, "name": "Bob" },
    ]
}

#[tokio::test]
async fn connect_succeeds_against_live_source() {
    let (_, client) = connect(InMemorySource::builder()).await;

    assert_eq!(client.locator(), &Locator::new("r&d", "users"));
    assert!(client.ping().await.is_ok());
}

#[tokio::test]
async fn connect_fails_when_ping_fails() {
    let source = InMemorySource::builder()
        .fail_ping("connection refused")
        .build()
        .await
        .unwrap();

    let error = DocumentStoreClient::connect(source, StoreConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Liveness(_)));
    assert!(error.is_startup());
}

#[tokio::test(start_paused = true)]
async fn connect_times_out_on_unresponsive_source() {
    let source = InMemorySource::builder()
        .ping_delay(Duration::from_secs(30))
        .build()
        .await
        .unwrap();
    let started = Instant::now();

    let error = DocumentStoreClient::connect(
        source,
        StoreConfig::default().with_connect_timeout(Duration::from_millis(200)),
    )
    .await
    .unwrap_err();

    assert!(matches!(error, FetchError::LivenessTimeout(t) if t == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn connect_rejects_invalid_config_before_pinging() {
    let source = InMemorySource::builder()
        .ping_delay(Duration::from_secs(30))
        .build()
        .await
        .unwrap();

    let config = StoreConfig::default().with_endpoint("localhost:27017");

    let error = DocumentStoreClient::connect(source, config).await.unwrap_err();

    assert!(matches!(error, FetchError::Config(_)));
}

#[tokio::test]
async fn connect_rejects_mismatched_locator() {
    let source = InMemorySource::builder()
        .locator(Locator::new("r&d", "accounts"))
        .build()
        .await
        .unwrap();

    let error = DocumentStoreClient::connect(source, StoreConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(error, FetchError::Config(_)));
}

#[tokio::test]
async fn empty_collection_yields_empty_sequence() {
    let (source, client) = connect(InMemorySource::builder()).await;

    let documents = client.list_documents(&FetchContext::background()).await.unwrap();

    assert!(documents.is_empty());
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test]
async fn returns_every_document_in_cursor_order() {
    let (_, client) = connect(InMemorySource::builder().documents(alice_and_bob())).await;

    let documents = client.list_documents(&FetchContext::background()).await.unwrap();

    assert_eq!(documents, alice_and_bob());
}

#[tokio::test]
async fn returns_exactly_n_documents_without_duplicates() {
    let seeded: Vec<_> = (0..250)
        .map(|i| {
            doc! {
                "_id": i,
                "name": format!("user-{i}"),
                "tags": ["a", "b"],
                "profile": { "age": (i % 90) }
            }
        })
        .collect();
    let (_, client) = connect(InMemorySource::builder().documents(seeded.clone())).await;

    let documents = client.list_documents(&FetchContext::background()).await.unwrap();

    let mut ids: Vec<i32> = documents.iter().map(|d| d.get_i32("_id").unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(documents.len(), 250);
    assert_eq!(ids.len(), 250);
    assert_eq!(documents, seeded);
}

#[tokio::test]
async fn repeated_fetch_is_idempotent() {
    let (source, client) = connect(InMemorySource::builder().documents(alice_and_bob())).await;
    let ctx = FetchContext::background();

    let first = client.list_documents(&ctx).await.unwrap();
    let second = client.list_documents(&ctx).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
    assert_eq!(source.opened_cursors(), 2);
    assert_eq!(source.closed_cursors(), 2);
}

#[tokio::test]
async fn malformed_record_fails_without_partial_results() {
    let (source, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .records(vec![Bson::Int32(42)])
            .documents(vec![doc! { "_id": 3, "name": "Carol" }]),
    )
    .await;

    let result = client.list_documents(&FetchContext::background()).await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test]
async fn query_failure_is_reported_and_opens_no_cursor() {
    let (source, client) =
        connect(InMemorySource::builder().fail_query("not authorized on r&d")).await;

    let result = client.list_documents(&FetchContext::background()).await;

    assert!(matches!(
        result,
        Err(FetchError::Query(message)) if message.contains("not authorized")
    ));
    assert_eq!(source.opened_cursors(), 0);
    assert_eq!(source.closed_cursors(), 0);
}

#[tokio::test]
async fn cursor_failure_discards_accumulated_documents() {
    let (source, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .fail_cursor_after(1, "cursor id not found"),
    )
    .await;

    let result = client.list_documents(&FetchContext::background()).await;

    assert!(matches!(result, Err(FetchError::Cursor(_))));
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test]
async fn cancellation_stops_iteration_and_still_releases_cursor() {
    let (source, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .advance_delay(Duration::from_millis(50)),
    )
    .await;
    let ctx = FetchContext::background();
    let token = ctx.cancellation_token().clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let result = client.list_documents(&ctx).await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert_eq!(source.opened_cursors(), 1);
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_deadline_still_releases_cursor() {
    let (source, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .advance_delay(Duration::from_secs(1))
            .close_delay(Duration::from_millis(100)),
    )
    .await;

    let result = client
        .list_documents(&FetchContext::with_timeout(Duration::from_millis(1500)))
        .await;

    assert!(matches!(result, Err(FetchError::DeadlineExceeded)));
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_release_is_bounded_and_keeps_result() {
    init_tracing();
    let source = InMemorySource::builder()
        .documents(alice_and_bob())
        .close_delay(Duration::from_secs(60))
        .build()
        .await
        .unwrap();
    let client = DocumentStoreClient::connect(
        source.clone(),
        StoreConfig::default().with_cleanup_timeout(Duration::from_millis(250)),
    )
    .await
    .unwrap();
    let started = Instant::now();

    let documents = client.list_documents(&FetchContext::background()).await.unwrap();

    assert_eq!(documents.len(), 2);
    assert!(started.elapsed() < Duration::from_secs(1));
    // The abandoned close drops the cursor, which still releases it.
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test]
async fn dropped_fetch_still_releases_cursor() {
    let (source, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .advance_delay(Duration::from_millis(200)),
    )
    .await;

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        client.list_documents(&FetchContext::background()),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(outcome.is_err());
    assert_eq!(source.opened_cursors(), 1);
    assert_eq!(source.closed_cursors(), 1);
}

#[tokio::test]
async fn decodes_documents_into_typed_values() {
    let (_, client) = connect(InMemorySource::builder().documents(alice_and_bob())).await;

    let users: Vec<User> = client.list_documents_as(&FetchContext::background()).await.unwrap();

    assert_eq!(
        users,
        vec![
            User { id: 1, name: "Alice".into() },
            User { id: 2, name: "Bob".into() },
        ]
    );
}

#[tokio::test]
async fn typed_decode_rejects_mismatched_shape() {
    let (_, client) = connect(
        InMemorySource::builder()
            .documents(alice_and_bob())
            .documents(vec![doc! { "_id": 3 }]),
    )
    .await;

    let result = client.list_documents_as::<User>(&FetchContext::background()).await;

    assert!(matches!(result, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn concurrent_fetches_share_one_client() {
    let (source, client) = connect(InMemorySource::builder().documents(alice_and_bob())).await;
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.list_documents(&FetchContext::background()).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 2);
    }
    assert_eq!(source.closed_cursors(), 8);
}

#[tokio::test]
async fn shutdown_consumes_client() {
    let (_, client) = connect(InMemorySource::builder()).await;

    assert!(client.shutdown().await.is_ok());
}
