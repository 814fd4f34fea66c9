//! Document access layer.
//!
//! Thin CRUD over a [`SimilarityBackend`]. Every backend call goes through the
//! retry executor, and inputs are validated before the first call so that a
//! malformed document never reaches the backend.

use std::sync::Arc;

use log::{debug, info};

use crate::backend::SimilarityBackend;
use crate::data::{Document, DocumentPatch, Metadata};
use crate::engine::config::EngineConfig;
use crate::error::{PrismError, Result};
use crate::retry::{RetryPolicy, with_retry};
use crate::vector::validation::validate_dimensions;

/// Retry-wrapped document CRUD with chunked batch insert.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    backend: Arc<dyn SimilarityBackend>,
    retry: RetryPolicy,
    dimension: Option<usize>,
    batch_size: usize,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn SimilarityBackend>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            retry: config.retry.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Insert one document and return it as stored (with its id).
    pub async fn insert(&self, document: Document) -> Result<Document> {
        self.validate_document(&document, 0)?;
        let batch = vec![document];
        let mut stored = with_retry(&self.retry, || self.backend.insert_documents(batch.clone()))
            .await
            .map_err(PrismError::from)?;
        stored
            .pop()
            .ok_or_else(|| PrismError::search("backend returned no row for inserted document"))
    }

    /// Insert documents in chunks of [`Self::batch_size`].
    pub async fn insert_batch(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        self.insert_batch_with_progress(documents, |_, _| {}).await
    }

    /// Insert documents chunk by chunk, calling `on_progress(completed, total)`
    /// after each chunk has been stored.
    ///
    /// The whole batch is validated before anything is sent. A chunk that
    /// still fails after retries aborts the remaining chunks; chunks already
    /// stored stay stored.
    pub async fn insert_batch_with_progress<P>(
        &self,
        documents: Vec<Document>,
        mut on_progress: P,
    ) -> Result<Vec<Document>>
    where
        P: FnMut(usize, usize),
    {
        for (index, document) in documents.iter().enumerate() {
            self.validate_document(document, index)?;
        }

        let total = documents.len();
        let mut stored = Vec::with_capacity(total);
        let mut completed = 0;
        for chunk in documents.chunks(self.batch_size) {
            let inserted = with_retry(&self.retry, || self.backend.insert_documents(chunk.to_vec()))
                .await
                .map_err(PrismError::from)?;
            stored.extend(inserted);
            completed += chunk.len();
            debug!("inserted chunk: {completed}/{total} documents");
            on_progress(completed, total);
        }
        info!("inserted {total} documents");
        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        with_retry(&self.retry, || self.backend.get_document(id))
            .await
            .map_err(PrismError::from)
    }

    /// Apply a partial update, returning the updated document.
    ///
    /// New embeddings must match the configured dimension or, without one,
    /// the embeddings the document already has.
    pub async fn update(&self, id: &str, patch: DocumentPatch) -> Result<Document> {
        if let Some(content) = &patch.content {
            if content.trim().is_empty() {
                return Err(PrismError::validation("document content must not be empty"));
            }
        }
        for vector in patch.embeddings.values().flatten() {
            check_embedding(vector, self.dimension)?;
        }
        if self.dimension.is_none() && patch.embeddings.values().any(Option::is_some) {
            let mut patched = self
                .get(id)
                .await?
                .ok_or_else(|| PrismError::DocumentNotFound(id.to_string()))?;
            patched.apply(&patch);
            check_slots(&patched, None)?;
        }

        with_retry(&self.retry, || self.backend.update_document(id, &patch))
            .await
            .map_err(PrismError::from)?
            .ok_or_else(|| PrismError::DocumentNotFound(id.to_string()))
    }

    /// Returns true if a document was removed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        with_retry(&self.retry, || self.backend.delete_document(id))
            .await
            .map_err(PrismError::from)
    }

    pub async fn count(&self, filter: Option<&Metadata>) -> Result<usize> {
        with_retry(&self.retry, || self.backend.count_documents(filter))
            .await
            .map_err(PrismError::from)
    }

    fn validate_document(&self, document: &Document, index: usize) -> Result<()> {
        if document.content.trim().is_empty() {
            return Err(PrismError::validation(format!(
                "document {index} has empty content"
            )));
        }
        check_slots(document, self.dimension)
    }
}

/// Without a configured dimension, the first present slot sets it for the rest.
fn check_slots(document: &Document, dimension: Option<usize>) -> Result<()> {
    let mut dimension = dimension;
    for (_, vector) in document.embeddings() {
        check_embedding(vector, dimension)?;
        dimension.get_or_insert(vector.len());
    }
    Ok(())
}

fn check_embedding(vector: &[f32], dimension: Option<usize>) -> Result<()> {
    if vector.is_empty() {
        return Err(PrismError::validation(
            "embeddings must not be empty; leave the slot unset instead",
        ));
    }
    validate_dimensions(vector, dimension.unwrap_or(vector.len()))
}
