//! # Prism
//!
//! Weighted multi-vector semantic search over a pluggable similarity backend.
//!
//! ## Features
//!
//! - Single-vector and weighted multi-vector (main + three section) search
//! - Weight normalization and embedding dimension validation
//! - Bounded retry with exponential backoff around every backend call
//! - Metadata containment filters
//! - Document CRUD with chunked batch insert and progress reporting
//! - Chunked concurrent embedding through a pluggable [`Embedder`]
//! - A brute-force [`InMemoryBackend`] for tests and small corpora
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prism::{EngineConfig, InMemoryBackend, SearchEngine, Slot, WeightedSearchQuery};
//!
//! # async fn run() -> prism::Result<()> {
//! let engine = SearchEngine::new(Arc::new(InMemoryBackend::new()), EngineConfig::default())?;
//! let query = WeightedSearchQuery::builder(vec![0.1, 0.2, 0.3])
//!     .vector(Slot::Section1, vec![0.3, 0.2, 0.1])
//!     .weight(Slot::Main, 3.0)
//!     .weight(Slot::Section1, 1.0)
//!     .build();
//! for hit in engine.weighted_search(&query).await? {
//!     println!("{} {:.3}", hit.id, hit.similarity);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod data;
pub mod embedding;
mod engine;
mod error;
pub mod retry;
pub mod search;
mod store;
pub mod vector;

// Re-exports for the public API
pub use backend::memory::InMemoryBackend;
pub use backend::{
    BackendError, BackendResult, SimilarityBackend, SimilarityRow, SingleVectorParams,
    WeightedSimilarityRow, WeightedVectorParams,
};
pub use data::{Document, DocumentPatch, Metadata};
pub use embedding::{DocumentEmbedder, DocumentInput, Embedder, embed_in_chunks};
pub use engine::SearchEngine;
pub use engine::config::{EngineConfig, EngineConfigBuilder};
pub use error::{PrismError, Result};
pub use retry::{RetryPolicy, is_retryable_error, retry_if, with_retry, with_retry_notify};
pub use search::{
    SearchQuery, SearchQueryBuilder, SearchResult, SlotSimilarity, TextQuery,
    WeightedSearchQuery, WeightedSearchQueryBuilder,
};
pub use store::DocumentStore;
pub use vector::{NormalizedWeights, Slot, SlotWeights, normalize_weights, validate_dimensions};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
