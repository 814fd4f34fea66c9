mod common;

use std::sync::Arc;
use std::time::Duration;

use common::ScriptedBackend;
use prism::{
    Document, DocumentStore, EngineConfig, Metadata, PrismError, RetryPolicy, SearchEngine,
    SearchQuery, SimilarityRow, Slot, SlotWeights, WeightedSearchQuery,
};

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .max_retries(max_retries)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(4))
}

fn engine(backend: Arc<ScriptedBackend>, max_retries: u32) -> SearchEngine {
    let config = EngineConfig::builder()
        .dimension(3)
        .retry(fast_retry(max_retries))
        .build();
    SearchEngine::new(backend, config).unwrap()
}

#[tokio::test]
async fn test_single_search_dispatch_and_passthrough() -> prism::Result<()> {
    let row = SimilarityRow {
        id: "doc-1".into(),
        content: "hello".into(),
        metadata: Metadata::new().with("lang", "en"),
        similarity: 0.9,
    };
    let backend = Arc::new(ScriptedBackend::new().with_single_rows(vec![row.clone()]));
    let engine = engine(backend.clone(), 0);

    let query = SearchQuery::builder(vec![0.1, 0.2, 0.3])
        .threshold(0.8)
        .limit(5)
        .build();
    let results = engine.search(&query).await?;

    // 1. Backend received exactly the expected parameters
    let sent = backend.single_params.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].query_embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(sent[0].match_threshold, 0.8);
    assert_eq!(sent[0].match_count, 5);
    let wire = serde_json::to_value(&sent[0])?;
    let mut keys: Vec<&str> = wire
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default();
    keys.sort();
    assert_eq!(
        keys,
        vec!["filter_metadata", "match_count", "match_threshold", "query_embedding"]
    );
    assert!(wire["filter_metadata"].is_null());

    // 2. The row comes back unchanged
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, row.id);
    assert_eq!(results[0].content, row.content);
    assert_eq!(results[0].metadata, row.metadata);
    assert_eq!(results[0].similarity, 0.9);
    Ok(())
}

#[tokio::test]
async fn test_weighted_search_normalizes_before_dispatch() -> prism::Result<()> {
    let backend = Arc::new(ScriptedBackend::new());
    let engine = engine(backend.clone(), 0);

    let query = WeightedSearchQuery::builder(vec![1.0, 0.0, 0.0])
        .vector(Slot::Section2, vec![0.0, 1.0, 0.0])
        .weights(
            SlotWeights::new()
                .with(Slot::Main, 50.0)
                .with(Slot::Section1, 0.0)
                .with(Slot::Section2, 50.0)
                .with(Slot::Section3, 0.0),
        )
        .build();
    engine.weighted_search(&query).await?;

    let sent = backend.weighted_params.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].weights().as_array(), [0.5, 0.0, 0.5, 0.0]);
    assert!(sent[0].section_1_query.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_section_is_not_applicable() -> prism::Result<()> {
    let backend = Arc::new(ScriptedBackend::new());
    let engine = engine(backend.clone(), 0);

    let partial = Document::new_with_id("partial", "no first section")
        .with_embedding(Slot::Main, vec![1.0, 0.0, 0.0])
        .with_embedding(Slot::Section2, vec![0.0, 1.0, 0.0]);
    let full = Document::new_with_id("full", "all sections")
        .with_embedding(Slot::Main, vec![1.0, 0.0, 0.0])
        .with_embedding(Slot::Section1, vec![0.0, 0.0, 1.0])
        .with_embedding(Slot::Section2, vec![0.0, 1.0, 0.0]);
    engine.documents().insert_batch(vec![partial, full]).await?;

    let query = WeightedSearchQuery::builder(vec![1.0, 0.0, 0.0])
        .vector(Slot::Section1, vec![0.0, 0.0, 1.0])
        .vector(Slot::Section2, vec![0.0, 1.0, 0.0])
        .weight(Slot::Main, 1.0)
        .weight(Slot::Section1, 1.0)
        .weight(Slot::Section2, 1.0)
        .weight(Slot::Section3, 0.0)
        .threshold(0.5)
        .build();
    let results = engine.weighted_search(&query).await?;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "full");
    assert!((results[0].similarity - 1.0).abs() < 1e-5);

    let partial = &results[1];
    assert_eq!(partial.id, "partial");
    assert!((partial.similarity - 2.0 / 3.0).abs() < 1e-5);
    let section_1 = partial.component(Slot::Section1).unwrap();
    assert_eq!(section_1.similarity, None);
    let section_2 = partial.component(Slot::Section2).unwrap();
    assert!((section_2.similarity.unwrap() - 1.0).abs() < 1e-5);
    assert!(partial.component(Slot::Section3).is_none());
    Ok(())
}

#[tokio::test]
async fn test_search_recovers_from_transient_failures() -> prism::Result<()> {
    let backend = Arc::new(ScriptedBackend::new().failing(3));
    let engine = engine(backend.clone(), 3);

    let results = engine.search(&SearchQuery::new(vec![0.1, 0.2, 0.3])).await?;
    assert!(results.is_empty());
    assert_eq!(backend.calls(), 4);
    Ok(())
}

#[tokio::test]
async fn test_search_surfaces_last_error_after_exhaustion() {
    let backend = Arc::new(ScriptedBackend::new().failing(100));
    let engine = engine(backend.clone(), 2);

    let result = engine
        .weighted_search(&WeightedSearchQuery::new(vec![0.1, 0.2, 0.3]))
        .await;
    match result {
        Err(err @ PrismError::Search { .. }) => {
            assert_eq!(err.code(), Some("08006"));
            assert!(err.is_retryable());
        }
        other => panic!("expected a search error, got {other:?}"),
    }
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_invalid_queries_never_reach_the_backend() {
    let backend = Arc::new(ScriptedBackend::new().failing(100));
    let engine = engine(backend.clone(), 5);

    let wrong_dimension = engine.search(&SearchQuery::new(vec![0.1, 0.2])).await;
    assert!(matches!(
        wrong_dimension,
        Err(PrismError::DimensionMismatch {
            expected: 3,
            actual: 2
        })
    ));

    let not_finite = engine
        .search(&SearchQuery::new(vec![0.1, f32::NAN, 0.3]))
        .await;
    assert!(matches!(
        not_finite,
        Err(PrismError::InvalidEmbeddingValues(_))
    ));

    let zero_weights = WeightedSearchQuery::builder(vec![0.1, 0.2, 0.3])
        .weights(
            SlotWeights::new()
                .with(Slot::Main, 0.0)
                .with(Slot::Section1, 0.0)
                .with(Slot::Section2, 0.0)
                .with(Slot::Section3, 0.0),
        )
        .build();
    assert!(matches!(
        engine.weighted_search(&zero_weights).await,
        Err(PrismError::InvalidWeights(_))
    ));

    assert_eq!(backend.calls(), 0);
    assert!(backend.single_params.lock().is_empty());
    assert!(backend.weighted_params.lock().is_empty());
}

#[tokio::test]
async fn test_metadata_filter_restricts_results() -> prism::Result<()> {
    let backend = Arc::new(ScriptedBackend::new());
    let config = EngineConfig::builder().retry(RetryPolicy::none()).build();
    let store = DocumentStore::new(backend.clone(), &config)?;
    let engine = SearchEngine::new(backend, config)?;

    store
        .insert_batch(vec![
            Document::new("tagged")
                .with_metadata(
                    Metadata::new()
                        .with("tags", serde_json::json!(["rust", "search"]))
                        .with("year", 2024),
                )
                .with_embedding(Slot::Main, vec![1.0, 0.0]),
            Document::new("untagged").with_embedding(Slot::Main, vec![1.0, 0.0]),
        ])
        .await?;

    let query = SearchQuery::builder(vec![1.0, 0.0])
        .filter(Metadata::new().with("tags", "rust"))
        .build();
    let results = engine.search(&query).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "tagged");
    Ok(())
}
