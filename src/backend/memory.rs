//! In-memory similarity backend.
//!
//! Brute-force reference implementation of [`SimilarityBackend`]: every
//! lookup scores all stored documents with the contract in
//! [`crate::search::scoring`]. Suitable for tests and small corpora.
//!
//! Like a vector column, the table has one dimension for every embedding it
//! holds. The first embedding written pins it; later writes of another length
//! are rejected, so lookups never meet a mixed-dimension row.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::backend::{
    BackendError, BackendResult, SimilarityBackend, SimilarityRow, SingleVectorParams,
    WeightedSimilarityRow, WeightedVectorParams,
};
use crate::data::{Document, DocumentPatch, Metadata};
use crate::error::PrismError;
use crate::search::scoring::{matches_filter, rank, score_document, score_main};
use crate::vector::slot::Slot;

/// Postgres-style codes so callers see the same diagnostics as from a SQL backend.
const CODE_DATA_EXCEPTION: &str = "22000";
const CODE_UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<String, Document>,
    dimension: Option<usize>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().rows.is_empty()
    }

    /// Dimension pinned by the first stored embedding.
    pub fn dimension(&self) -> Option<usize> {
        self.table.read().dimension
    }

    fn snapshot(&self) -> Vec<Document> {
        self.table.read().rows.values().cloned().collect()
    }
}

/// Check every embedding of `document` against the pinned dimension, pinning
/// it on the first embedding if nothing is pinned yet.
fn pin_dimension(pinned: Option<usize>, document: &Document) -> BackendResult<Option<usize>> {
    let mut pinned = pinned;
    for (_, vector) in document.embeddings() {
        match pinned {
            Some(expected) if expected != vector.len() => {
                return Err(BackendError::with_code(
                    CODE_DATA_EXCEPTION,
                    format!("expected {expected} dimensions, not {}", vector.len()),
                ));
            }
            Some(_) => {}
            None => pinned = Some(vector.len()),
        }
    }
    Ok(pinned)
}

fn scoring_error(err: PrismError) -> BackendError {
    match err {
        PrismError::DimensionMismatch { expected, actual } => BackendError::with_code(
            CODE_DATA_EXCEPTION,
            format!("different vector dimensions {expected} and {actual}"),
        ),
        other => BackendError::with_code(CODE_DATA_EXCEPTION, other.to_string()),
    }
}

#[async_trait]
impl SimilarityBackend for InMemoryBackend {
    async fn find_by_single_vector(
        &self,
        params: &SingleVectorParams,
    ) -> BackendResult<Vec<SimilarityRow>> {
        let filter = params.filter_metadata.as_ref();
        let mut scored = Vec::new();
        for document in self.snapshot() {
            if !matches_filter(&document, filter) {
                continue;
            }
            if let Some(similarity) =
                score_main(&params.query_embedding, &document).map_err(scoring_error)?
            {
                scored.push((similarity, document));
            }
        }

        Ok(rank(scored, params.match_threshold, params.match_count)
            .into_iter()
            .map(|(similarity, document)| SimilarityRow {
                id: document.id.unwrap_or_default(),
                content: document.content,
                metadata: document.metadata,
                similarity,
            })
            .collect())
    }

    async fn find_by_weighted_vectors(
        &self,
        params: &WeightedVectorParams,
    ) -> BackendResult<Vec<WeightedSimilarityRow>> {
        let filter = params.filter_metadata.as_ref();
        let mut scored = Vec::new();
        for document in self.snapshot() {
            if !matches_filter(&document, filter) {
                continue;
            }
            let scores = score_document(params, &document).map_err(scoring_error)?;
            scored.push((scores.aggregate, (scores, document)));
        }

        Ok(rank(scored, params.match_threshold, params.match_count)
            .into_iter()
            .map(|(similarity, (scores, document))| WeightedSimilarityRow {
                id: document.id.unwrap_or_default(),
                content: document.content,
                metadata: document.metadata,
                similarity,
                main_similarity: scores.get(Slot::Main),
                section_1_similarity: scores.get(Slot::Section1),
                section_2_similarity: scores.get(Slot::Section2),
                section_3_similarity: scores.get(Slot::Section3),
            })
            .collect())
    }

    async fn insert_documents(&self, documents: Vec<Document>) -> BackendResult<Vec<Document>> {
        let mut guard = self.table.write();
        let now = Utc::now();

        let mut dimension = guard.dimension;
        let mut prepared = Vec::with_capacity(documents.len());
        for mut document in documents {
            dimension = pin_dimension(dimension, &document)?;
            let id = document
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let duplicate = guard.rows.contains_key(&id)
                || prepared
                    .iter()
                    .any(|d: &Document| d.id.as_deref() == Some(id.as_str()));
            if duplicate {
                return Err(BackendError::with_code(
                    CODE_UNIQUE_VIOLATION,
                    format!("duplicate key value violates unique constraint: id={id}"),
                ));
            }
            document.id = Some(id);
            document.created_at = Some(now);
            document.updated_at = Some(now);
            prepared.push(document);
        }

        guard.dimension = dimension;
        for document in &prepared {
            if let Some(id) = &document.id {
                guard.rows.insert(id.clone(), document.clone());
            }
        }
        Ok(prepared)
    }

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>> {
        Ok(self.table.read().rows.get(id).cloned())
    }

    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> BackendResult<Option<Document>> {
        let mut guard = self.table.write();
        let Some(current) = guard.rows.get(id) else {
            return Ok(None);
        };
        let mut document = current.clone();
        document.apply(patch);
        let dimension = pin_dimension(guard.dimension, &document)?;

        document.updated_at = Some(Utc::now());
        guard.dimension = dimension;
        guard.rows.insert(id.to_string(), document.clone());
        Ok(Some(document))
    }

    async fn delete_document(&self, id: &str) -> BackendResult<bool> {
        Ok(self.table.write().rows.remove(id).is_some())
    }

    async fn count_documents(&self, filter: Option<&Metadata>) -> BackendResult<usize> {
        let guard = self.table.read();
        Ok(match filter {
            None => guard.rows.len(),
            Some(filter) => guard
                .rows
                .values().filter(|d| d.metadata.contains(filter)).count(),
        })
    }
}
