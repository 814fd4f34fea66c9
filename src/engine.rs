//! The search engine facade.
//!
//! [`SearchEngine`] ties the similarity adapter, the retry executor, the
//! document store and an optional embedder together behind one handle.

pub mod config;

use std::sync::Arc;

use log::{debug, info};

use crate::backend::SimilarityBackend;
use crate::data::Document;
use crate::embedding::{DocumentEmbedder, DocumentInput, Embedder, embed_in_chunks};
use crate::error::{PrismError, Result};
use crate::retry::{is_retryable_error, retry_if, with_retry};
use crate::search::adapter::SimilarityAdapter;
use crate::search::request::{SearchQuery, TextQuery, WeightedSearchQuery};
use crate::search::response::SearchResult;
use crate::store::document::DocumentStore;
use crate::vector::slot::Slot;

use self::config::EngineConfig;

/// Search orchestrator.
///
/// Every search runs the same pipeline: validate the query, normalize
/// weights (weighted searches only), call the backend under the configured
/// [`RetryPolicy`](crate::RetryPolicy) and map the rows into
/// [`SearchResult`]s. Validation happens before the retry boundary, so a
/// malformed query never reaches the backend and is never retried.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: EngineConfig,
    adapter: SimilarityAdapter,
    store: DocumentStore,
    embedder: Option<Arc<dyn Embedder>>,
}

impl SearchEngine {
    /// Create an engine over `backend`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The similarity backend shared by searches and document access.
    /// * `config` - Engine configuration; rejected with `InvalidConfig` if invalid.
    pub fn new(backend: Arc<dyn SimilarityBackend>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let adapter = SimilarityAdapter::new(Arc::clone(&backend))
            .with_defaults(config.default_threshold, config.default_limit);
        let store = DocumentStore::new(backend, &config)?;
        Ok(Self {
            config,
            adapter,
            store,
            embedder: None,
        })
    }

    /// Attach the embedder used by the text entry points.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if let Some(expected) = self.config.dimension {
            if embedder.dimension() != expected {
                return Err(PrismError::invalid_config(format!(
                    "embedder '{}' produces {}-dimensional vectors but the engine expects {}",
                    embedder.name(),
                    embedder.dimension(),
                    expected
                )));
            }
        }
        self.embedder = Some(embedder);
        Ok(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn adapter(&self) -> &SimilarityAdapter {
        &self.adapter
    }

    /// Document access over the same backend and configuration.
    pub fn documents(&self) -> &DocumentStore {
        &self.store
    }

    pub fn embedder(&self) -> Option<&Arc<dyn Embedder>> {
        self.embedder.as_ref()
    }

    /// Single-vector similarity search.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let params = self.adapter.prepare_single(query, self.config.dimension)?;
        let results =
            with_retry(&self.config.retry, || self.adapter.execute_single(&params)).await?;
        debug!("single-vector search returned {} results", results.len());
        Ok(results)
    }

    /// Weighted multi-vector similarity search.
    ///
    /// Weights are normalized to sum to 1 before dispatch. Each result carries
    /// one component per slot the query supplied; a component is `None` when
    /// the candidate has no embedding for that slot.
    pub async fn weighted_search(&self, query: &WeightedSearchQuery) -> Result<Vec<SearchResult>> {
        let prepared = self
            .adapter
            .prepare_weighted(query, self.config.dimension)?;
        let results =
            with_retry(&self.config.retry, || self.adapter.execute_weighted(&prepared)).await?;
        debug!("weighted search returned {} results", results.len());
        Ok(results)
    }

    /// Embed `query.text` and run a single-vector search with it.
    pub async fn search_text(&self, query: &TextQuery) -> Result<Vec<SearchResult>> {
        check_query_text(&query.text)?;
        let embedding = self
            .embed_texts(std::slice::from_ref(&query.text))
            .await?
            .pop()
            .ok_or_else(|| PrismError::embedding("embedder returned no vector for query text"))?;

        let search = SearchQuery {
            embedding,
            threshold: query.threshold,
            limit: query.limit,
            filter: query.filter.clone(),
        };
        self.search(&search).await
    }

    /// Embed the query text and its section texts, then run a weighted search.
    ///
    /// Blank section texts leave their slot without a query vector.
    pub async fn weighted_search_text(&self, query: &TextQuery) -> Result<Vec<SearchResult>> {
        check_query_text(&query.text)?;
        if query.sections.len() > Slot::SECTIONS.len() {
            return Err(PrismError::validation(format!(
                "query has {} section texts; at most {} are supported",
                query.sections.len(),
                Slot::SECTIONS.len()
            )));
        }

        let mut texts = vec![query.text.clone()];
        let mut slots = vec![Slot::Main];
        for (position, text) in query.sections.iter().enumerate() {
            if text.trim().is_empty() {
                continue;
            }
            if let Some(slot) = Slot::section(position) {
                texts.push(text.clone());
                slots.push(slot);
            }
        }

        let vectors = self.embed_texts(&texts).await?;
        let mut builder = WeightedSearchQuery::builder(Vec::new()).weights(query.weights);
        for (slot, vector) in slots.into_iter().zip(vectors) {
            builder = builder.vector(slot, vector);
        }
        if let Some(threshold) = query.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(limit) = query.limit {
            builder = builder.limit(limit);
        }
        if let Some(filter) = &query.filter {
            builder = builder.filter(filter.clone());
        }
        self.weighted_search(&builder.build()).await
    }

    /// Embed raw documents and insert them in batches.
    ///
    /// `on_progress(completed, total)` is called after each inserted chunk.
    pub async fn ingest<P>(&self, inputs: Vec<DocumentInput>, on_progress: P) -> Result<Vec<Document>>
    where
        P: FnMut(usize, usize),
    {
        let embedder = self.require_embedder()?;
        let pipeline = DocumentEmbedder::new(Arc::clone(embedder))
            .chunk_size(self.config.embedding_chunk_size)
            .chunk_delay(self.config.embedding_chunk_delay());

        let documents = retry_if(
            &self.config.retry,
            || pipeline.embed_documents(inputs.clone()),
            is_retryable_error,
        )
        .await?;
        info!(
            "embedded {} documents with '{}'",
            documents.len(),
            embedder.name()
        );
        self.store
            .insert_batch_with_progress(documents, on_progress)
            .await
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embedder = self.require_embedder()?;
        retry_if(
            &self.config.retry,
            || {
                embed_in_chunks(
                    embedder.as_ref(),
                    texts,
                    self.config.embedding_chunk_size,
                    self.config.embedding_chunk_delay(),
                )
            },
            is_retryable_error,
        )
        .await
    }

    fn require_embedder(&self) -> Result<&Arc<dyn Embedder>> {
        self.embedder.as_ref().ok_or_else(|| {
            PrismError::invalid_config("text search requires an embedder; see SearchEngine::with_embedder")
        })
    }
}

fn check_query_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(PrismError::validation("query text must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::data::Metadata;
    use crate::retry::RetryPolicy;

    /// Maps a few keywords onto axes of a 3-dimensional space.
    #[derive(Debug)]
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            let axis = |word: &str| if text.contains(word) { 1.0 } else { 0.0 };
            let vector = vec![axis("rust"), axis("python"), axis("search")];
            if vector.iter().all(|v| *v == 0.0) {
                return Ok(vec![0.1, 0.1, 0.1]);
            }
            Ok(vector)
        }

        fn dimension(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn engine() -> SearchEngine {
        let config = EngineConfig::builder()
            .dimension(3)
            .retry(RetryPolicy::none())
            .build();
        SearchEngine::new(Arc::new(InMemoryBackend::new()), config)
            .unwrap()
            .with_embedder(Arc::new(KeywordEmbedder))
            .unwrap()
    }

    #[test]
    fn test_rejects_embedder_with_wrong_dimension() {
        let config = EngineConfig::builder().dimension(8).build();
        let result = SearchEngine::new(Arc::new(InMemoryBackend::new()), config)
            .unwrap()
            .with_embedder(Arc::new(KeywordEmbedder));
        assert!(matches!(result, Err(PrismError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_text_search_requires_embedder() {
        let engine =
            SearchEngine::new(Arc::new(InMemoryBackend::new()), EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.search_text(&TextQuery::new("rust")).await,
            Err(PrismError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_then_search_text() {
        let engine = engine();
        let mut progress = Vec::new();
        let stored = engine
            .ingest(
                vec![
                    DocumentInput::new("Rust ownership")
                        .with_metadata(Metadata::new().with("lang", "rust")),
                    DocumentInput::new("Python generators")
                        .with_metadata(Metadata::new().with("lang", "python")),
                    DocumentInput::new("Rust search engines").with_section("search"),
                ],
                |done, total| progress.push((done, total)),
            )
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(progress, vec![(3, 3)]);

        let results = engine
            .search_text(&TextQuery::new("rust").threshold(0.6))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "Rust ownership");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);

        let filtered = engine
            .search_text(
                &TextQuery::new("rust")
                    .threshold(0.0)
                    .filter(Metadata::new().with("lang", "python")),
            )
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].content, "Python generators");
    }

    #[tokio::test]
    async fn test_weighted_search_text_uses_sections() {
        let engine = engine();
        engine
            .ingest(
                vec![
                    DocumentInput::new("Rust search engines").with_section("search"),
                    DocumentInput::new("Rust ownership").with_section("python"),
                ],
                |_, _| {},
            )
            .await
            .unwrap();

        let query = TextQuery::new("rust")
            .section("search")
            .weight(Slot::Main, 1.0)
            .weight(Slot::Section1, 1.0)
            .weight(Slot::Section2, 0.0)
            .weight(Slot::Section3, 0.0)
            .threshold(0.0);
        let results = engine.weighted_search_text(&query).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "Rust search engines");
        let section = results[0].component(Slot::Section1).unwrap();
        assert!(section.similarity.is_some());
        assert!(results[0].component(Slot::Section2).is_none());
    }

    #[tokio::test]
    async fn test_blank_query_text_is_rejected() {
        let engine = engine();
        assert!(matches!(
            engine.search_text(&TextQuery::new("  ")).await,
            Err(PrismError::Validation(_))
        ));
        let too_many = TextQuery::new("rust")
            .section("a")
            .section("b")
            .section("c")
            .section("d");
        assert!(matches!(
            engine.weighted_search_text(&too_many).await,
            Err(PrismError::Validation(_))
        ));
    }
}
