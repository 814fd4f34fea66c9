//! Search requests, results, and the backend adapter.
//!
//! # Module Structure
//!
//! - `request`: single-vector, weighted and text query types with builders
//! - `response`: ranked results with per-slot similarity components
//! - `scoring`: the weighted aggregate scoring contract
//! - `adapter`: validation and translation of queries into backend calls

pub mod adapter;
pub mod request;
pub mod response;
pub mod scoring;

pub use adapter::{PreparedWeightedSearch, SimilarityAdapter};
pub use request::{
    DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD, SearchQuery, SearchQueryBuilder, TextQuery,
    WeightedSearchQuery, WeightedSearchQueryBuilder,
};
pub use response::{SearchResult, SlotSimilarity};
pub use scoring::SlotScores;
