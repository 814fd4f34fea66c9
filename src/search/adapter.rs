//! Translation between search queries and backend calls.
//!
//! Each search is split into a `prepare_*` step, which validates the query and
//! builds backend parameters without touching the backend, and an `execute_*`
//! step, which makes exactly one backend call. The orchestrator retries only
//! the execute step.

use std::sync::Arc;

use log::debug;

use crate::backend::{SimilarityBackend, SingleVectorParams, WeightedVectorParams};
use crate::error::{PrismError, Result};
use crate::search::request::{
    DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD, SearchQuery, WeightedSearchQuery,
};
use crate::search::response::SearchResult;
use crate::vector::slot::Slot;
use crate::vector::validation::validate_dimensions;
use crate::vector::weights::normalize_weights;

/// Backend parameters for a weighted search plus the slots the query covers.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedWeightedSearch {
    pub params: WeightedVectorParams,
    pub slots: Vec<Slot>,
}

/// Maps structured queries onto a [`SimilarityBackend`].
#[derive(Debug, Clone)]
pub struct SimilarityAdapter {
    backend: Arc<dyn SimilarityBackend>,
    default_threshold: f32,
    default_limit: usize,
}

impl SimilarityAdapter {
    pub fn new(backend: Arc<dyn SimilarityBackend>) -> Self {
        Self {
            backend,
            default_threshold: DEFAULT_MATCH_THRESHOLD,
            default_limit: DEFAULT_MATCH_COUNT,
        }
    }

    /// Override the threshold and limit applied when a query leaves them unset.
    pub fn with_defaults(mut self, threshold: f32, limit: usize) -> Self {
        self.default_threshold = threshold;
        self.default_limit = limit;
        self
    }

    pub fn backend(&self) -> &Arc<dyn SimilarityBackend> {
        &self.backend
    }

    /// Validate and run a single-vector search.
    pub async fn single_vector_search(
        &self,
        query: &SearchQuery,
        expected_dimensions: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let params = self.prepare_single(query, expected_dimensions)?;
        self.execute_single(&params).await
    }

    /// Validate and run a weighted multi-vector search.
    pub async fn weighted_vector_search(
        &self,
        query: &WeightedSearchQuery,
        expected_dimensions: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let prepared = self.prepare_weighted(query, expected_dimensions)?;
        self.execute_weighted(&prepared).await
    }

    pub fn prepare_single(
        &self,
        query: &SearchQuery,
        expected_dimensions: Option<usize>,
    ) -> Result<SingleVectorParams> {
        check_main_vector(&query.embedding, expected_dimensions)?;
        let match_threshold = self.resolve_threshold(query.threshold)?;
        let match_count = self.resolve_limit(query.limit)?;

        Ok(SingleVectorParams {
            query_embedding: query.embedding.clone(),
            match_threshold,
            match_count,
            filter_metadata: query.filter.clone(),
        })
    }

    pub async fn execute_single(&self, params: &SingleVectorParams) -> Result<Vec<SearchResult>> {
        debug!(
            "single-vector search: dim={} threshold={} count={} filtered={}",
            params.query_embedding.len(),
            params.match_threshold,
            params.match_count,
            params.filter_metadata.is_some()
        );
        let rows = self.backend.find_by_single_vector(params).await?;
        Ok(rows.into_iter().map(SearchResult::from_single).collect())
    }

    pub fn prepare_weighted(
        &self,
        query: &WeightedSearchQuery,
        expected_dimensions: Option<usize>,
    ) -> Result<PreparedWeightedSearch> {
        check_main_vector(&query.embedding, expected_dimensions)?;
        let dimension = expected_dimensions.unwrap_or(query.embedding.len());
        for slot in Slot::SECTIONS {
            if let Some(vector) = query.vector_for(slot) {
                if vector.is_empty() {
                    return Err(PrismError::validation(format!(
                        "query vector for slot '{slot}' is empty; omit it instead"
                    )));
                }
                validate_dimensions(vector, dimension)?;
            }
        }

        let weights = normalize_weights(&query.weights)?;
        let match_threshold = self.resolve_threshold(query.threshold)?;
        let match_count = self.resolve_limit(query.limit)?;

        let params = WeightedVectorParams {
            query_embedding: query.embedding.clone(),
            section_1_query: query.section_1_embedding.clone(),
            section_2_query: query.section_2_embedding.clone(),
            section_3_query: query.section_3_embedding.clone(),
            main_weight: weights.main,
            section_1_weight: weights.section_1,
            section_2_weight: weights.section_2,
            section_3_weight: weights.section_3,
            match_threshold,
            match_count,
            filter_metadata: query.filter.clone(),
        };
        Ok(PreparedWeightedSearch {
            params,
            slots: query.present_slots(),
        })
    }

    pub async fn execute_weighted(
        &self,
        prepared: &PreparedWeightedSearch,
    ) -> Result<Vec<SearchResult>> {
        let params = &prepared.params;
        debug!(
            "weighted search: slots={:?} weights={:?} threshold={} count={}",
            prepared.slots,
            params.weights().as_array(),
            params.match_threshold,
            params.match_count
        );
        let rows = self.backend.find_by_weighted_vectors(params).await?;
        Ok(rows
            .into_iter()
            .map(|row| SearchResult::from_weighted(row, &prepared.slots))
            .collect())
    }

    fn resolve_threshold(&self, threshold: Option<f32>) -> Result<f32> {
        let threshold = threshold.unwrap_or(self.default_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PrismError::validation(format!(
                "match threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(threshold)
    }

    fn resolve_limit(&self, limit: Option<usize>) -> Result<usize> {
        match limit.unwrap_or(self.default_limit) {
            0 => Err(PrismError::validation("match count must be positive")),
            n => Ok(n),
        }
    }
}

fn check_main_vector(vector: &[f32], expected_dimensions: Option<usize>) -> Result<()> {
    if vector.is_empty() {
        return Err(PrismError::validation("query embedding is required"));
    }
    validate_dimensions(vector, expected_dimensions.unwrap_or(vector.len()))
}
