//! Search request types.

use serde::{Deserialize, Serialize};

use crate::data::Metadata;
use crate::vector::slot::Slot;
use crate::vector::weights::SlotWeights;

/// Threshold used when a query does not set one.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.5;

/// Result cap used when a query does not set one.
pub const DEFAULT_MATCH_COUNT: usize = 10;

/// Single-vector similarity query.
///
/// Unset threshold and limit fall back to the engine defaults
/// ([`DEFAULT_MATCH_THRESHOLD`] and [`DEFAULT_MATCH_COUNT`] unless configured).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub embedding: Vec<f32>,
    /// Minimum similarity in `[0, 1]`.
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Maximum number of results.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Metadata that must be contained in a candidate's metadata.
    #[serde(default)]
    pub filter: Option<Metadata>,
}

impl SearchQuery {
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            ..Default::default()
        }
    }

    pub fn builder(embedding: Vec<f32>) -> SearchQueryBuilder {
        SearchQueryBuilder {
            query: Self::new(embedding),
        }
    }
}

pub struct SearchQueryBuilder {
    query: SearchQuery,
}

impl SearchQueryBuilder {
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.query.threshold = Some(threshold);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: Metadata) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn build(self) -> SearchQuery {
        self.query
    }
}

/// Weighted multi-vector query over the main slot and up to three sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedSearchQuery {
    /// Query vector for the main slot. Required.
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub section_1_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub section_2_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub section_3_embedding: Option<Vec<f32>>,
    /// Raw weights; normalized before dispatch.
    #[serde(default)]
    pub weights: SlotWeights,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub filter: Option<Metadata>,
}

impl WeightedSearchQuery {
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            ..Default::default()
        }
    }

    pub fn builder(embedding: Vec<f32>) -> WeightedSearchQueryBuilder {
        WeightedSearchQueryBuilder {
            query: Self::new(embedding),
        }
    }

    /// The query vector for `slot`, if the query carries one.
    pub fn vector_for(&self, slot: Slot) -> Option<&[f32]> {
        match slot {
            Slot::Main => Some(self.embedding.as_slice()),
            Slot::Section1 => self.section_1_embedding.as_deref(),
            Slot::Section2 => self.section_2_embedding.as_deref(),
            Slot::Section3 => self.section_3_embedding.as_deref(),
        }
    }

    /// Slots this query carries a vector for, main first.
    pub fn present_slots(&self) -> Vec<Slot> {
        Slot::ALL
            .into_iter()
            .filter(|slot| self.vector_for(*slot).is_some())
            .collect()
    }

    fn vector_mut(&mut self, slot: Slot) -> Option<&mut Option<Vec<f32>>> {
        match slot {
            Slot::Main => None,
            Slot::Section1 => Some(&mut self.section_1_embedding),
            Slot::Section2 => Some(&mut self.section_2_embedding),
            Slot::Section3 => Some(&mut self.section_3_embedding),
        }
    }
}

pub struct WeightedSearchQueryBuilder {
    query: WeightedSearchQuery,
}

impl WeightedSearchQueryBuilder {
    /// Set the query vector of a slot. Setting [`Slot::Main`] replaces the
    /// main vector.
    pub fn vector(mut self, slot: Slot, vector: Vec<f32>) -> Self {
        match self.query.vector_mut(slot) {
            Some(target) => *target = Some(vector),
            None => self.query.embedding = vector,
        }
        self
    }

    pub fn weight(mut self, slot: Slot, weight: f32) -> Self {
        self.query.weights.set(slot, weight);
        self
    }

    pub fn weights(mut self, weights: SlotWeights) -> Self {
        self.query.weights = weights;
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.query.threshold = Some(threshold);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: Metadata) -> Self {
        self.query.filter = Some(filter);
        self
    }

    pub fn build(self) -> WeightedSearchQuery {
        self.query
    }
}

/// Query text to be embedded before searching.
///
/// `text` is embedded into the main query vector and each entry of
/// `sections` into the section slot at the same position. Single-vector
/// searches ignore `sections` and `weights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextQuery {
    pub text: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub weights: SlotWeights,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub filter: Option<Metadata>,
}

impl TextQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn section(mut self, text: impl Into<String>) -> Self {
        self.sections.push(text.into());
        self
    }

    pub fn weight(mut self, slot: Slot, weight: f32) -> Self {
        self.weights.set(slot, weight);
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, filter: Metadata) -> Self {
        self.filter = Some(filter);
        self
    }
}
