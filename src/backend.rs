//! The similarity backend seam.
//!
//! Prism does not index or store vectors itself. It talks to a
//! [`SimilarityBackend`], an opaque engine that can find the top rows by
//! per-column vector distance and persist documents. Implementations must be
//! safe to share across tasks; connection-level concurrency is theirs to
//! manage.
//!
//! [`memory::InMemoryBackend`] is a brute-force reference implementation of
//! the scoring contract in [`crate::search::scoring`].

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Document, DocumentPatch, Metadata};
use crate::vector::slot::Slot;
use crate::vector::weights::NormalizedWeights;

/// A failure reported by the backend, with its native error code if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub code: Option<String>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Parameters of a single-vector similarity lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleVectorParams {
    pub query_embedding: Vec<f32>,
    pub match_threshold: f32,
    pub match_count: usize,
    pub filter_metadata: Option<Metadata>,
}

/// Parameters of a weighted multi-vector similarity lookup.
///
/// Weights are already normalized. An absent section query means that slot
/// contributes nothing to any candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedVectorParams {
    pub query_embedding: Vec<f32>,
    pub section_1_query: Option<Vec<f32>>,
    pub section_2_query: Option<Vec<f32>>,
    pub section_3_query: Option<Vec<f32>>,
    pub main_weight: f32,
    pub section_1_weight: f32,
    pub section_2_weight: f32,
    pub section_3_weight: f32,
    pub match_threshold: f32,
    pub match_count: usize,
    pub filter_metadata: Option<Metadata>,
}

impl WeightedVectorParams {
    pub fn query_for(&self, slot: Slot) -> Option<&[f32]> {
        match slot {
            Slot::Main => Some(self.query_embedding.as_slice()),
            Slot::Section1 => self.section_1_query.as_deref(),
            Slot::Section2 => self.section_2_query.as_deref(),
            Slot::Section3 => self.section_3_query.as_deref(),
        }
    }

    pub fn weight_for(&self, slot: Slot) -> f32 {
        match slot {
            Slot::Main => self.main_weight,
            Slot::Section1 => self.section_1_weight,
            Slot::Section2 => self.section_2_weight,
            Slot::Section3 => self.section_3_weight,
        }
    }

    pub fn weights(&self) -> NormalizedWeights {
        NormalizedWeights {
            main: self.main_weight,
            section_1: self.section_1_weight,
            section_2: self.section_2_weight,
            section_3: self.section_3_weight,
        }
    }
}

/// A row returned by a single-vector lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub similarity: f32,
}

/// A row returned by a weighted lookup.
///
/// Per-slot similarities are `None` when the query or the document lacks that
/// slot's embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedSimilarityRow {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub similarity: f32,
    #[serde(default)]
    pub main_similarity: Option<f32>,
    #[serde(default)]
    pub section_1_similarity: Option<f32>,
    #[serde(default)]
    pub section_2_similarity: Option<f32>,
    #[serde(default)]
    pub section_3_similarity: Option<f32>,
}

impl WeightedSimilarityRow {
    pub fn slot_similarity(&self, slot: Slot) -> Option<f32> {
        match slot {
            Slot::Main => self.main_similarity,
            Slot::Section1 => self.section_1_similarity,
            Slot::Section2 => self.section_2_similarity,
            Slot::Section3 => self.section_3_similarity,
        }
    }
}

/// An embedding-similarity backend.
#[async_trait]
pub trait SimilarityBackend: Send + Sync + std::fmt::Debug {
    /// Rows whose similarity to the query is at least the threshold, best first.
    async fn find_by_single_vector(
        &self,
        params: &SingleVectorParams,
    ) -> BackendResult<Vec<SimilarityRow>>;

    /// Rows ranked by weighted aggregate similarity, best first.
    async fn find_by_weighted_vectors(
        &self,
        params: &WeightedVectorParams,
    ) -> BackendResult<Vec<WeightedSimilarityRow>>;

    /// Persist documents, assigning ids to those without one. Returns the
    /// stored documents in input order.
    async fn insert_documents(&self, documents: Vec<Document>) -> BackendResult<Vec<Document>>;

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>>;

    /// Apply a partial update. `None` if no document has this id.
    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> BackendResult<Option<Document>>;

    /// Returns true if a document was removed.
    async fn delete_document(&self, id: &str) -> BackendResult<bool>;

    async fn count_documents(&self, filter: Option<&Metadata>) -> BackendResult<usize>;
}
