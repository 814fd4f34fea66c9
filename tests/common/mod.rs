//! Shared test doubles.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use prism::{
    BackendError, BackendResult, Document, DocumentPatch, InMemoryBackend, Metadata,
    SimilarityBackend, SimilarityRow, SingleVectorParams, WeightedSimilarityRow,
    WeightedVectorParams,
};

/// Wraps an [`InMemoryBackend`], recording every call and failing the first
/// `failures` calls with a transient error.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    inner: InMemoryBackend,
    failures: AtomicU32,
    broken_after: Mutex<Option<u32>>,
    calls: AtomicU32,
    single_rows: Mutex<Option<Vec<SimilarityRow>>>,
    pub single_params: Mutex<Vec<SingleVectorParams>>,
    pub weighted_params: Mutex<Vec<WeightedVectorParams>>,
    pub insert_sizes: Mutex<Vec<usize>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` calls.
    pub fn failing(self, n: u32) -> Self {
        self.failures.store(n, Ordering::SeqCst);
        self
    }

    /// Let the first `n` calls through, then fail every call after them.
    pub fn broken_after(self, n: u32) -> Self {
        *self.broken_after.lock() = Some(n);
        self
    }

    /// Answer single-vector lookups with `rows` instead of scoring.
    pub fn with_single_rows(self, rows: Vec<SimilarityRow>) -> Self {
        *self.single_rows.lock() = Some(rows);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> BackendResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_after.lock().is_some_and(|limit| call >= limit) {
            return Err(BackendError::with_code("08006", "connection refused"));
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BackendError::with_code("08006", "connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl SimilarityBackend for ScriptedBackend {
    async fn find_by_single_vector(
        &self,
        params: &SingleVectorParams,
    ) -> BackendResult<Vec<SimilarityRow>> {
        self.single_params.lock().push(params.clone());
        self.enter()?;
        if let Some(rows) = self.single_rows.lock().clone() {
            return Ok(rows);
        }
        self.inner.find_by_single_vector(params).await
    }

    async fn find_by_weighted_vectors(
        &self,
        params: &WeightedVectorParams,
    ) -> BackendResult<Vec<WeightedSimilarityRow>> {
        self.weighted_params.lock().push(params.clone());
        self.enter()?;
        self.inner.find_by_weighted_vectors(params).await
    }

    async fn insert_documents(&self, documents: Vec<Document>) -> BackendResult<Vec<Document>> {
        self.enter()?;
        self.insert_sizes.lock().push(documents.len());
        self.inner.insert_documents(documents).await
    }

    async fn get_document(&self, id: &str) -> BackendResult<Option<Document>> {
        self.enter()?;
        self.inner.get_document(id).await
    }

    async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> BackendResult<Option<Document>> {
        self.enter()?;
        self.inner.update_document(id, patch).await
    }

    async fn delete_document(&self, id: &str) -> BackendResult<bool> {
        self.enter()?;
        self.inner.delete_document(id).await
    }

    async fn count_documents(&self, filter: Option<&Metadata>) -> BackendResult<usize> {
        self.enter()?;
        self.inner.count_documents(filter).await
    }
}
