//! Search result types.

use serde::{Deserialize, Serialize};

use crate::backend::{SimilarityRow, WeightedSimilarityRow};
use crate::data::Metadata;
use crate::vector::slot::Slot;

/// Similarity of one slot. `similarity` is `None` when either the query or the
/// document lacks that slot's embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotSimilarity {
    pub slot: Slot,
    pub similarity: Option<f32>,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// Aggregate similarity in `[0, 1]`.
    pub similarity: f32,
    /// One entry per slot the query carried a vector for, main first.
    pub components: Vec<SlotSimilarity>,
}

impl SearchResult {
    /// Component for `slot`, if the query covered it.
    pub fn component(&self, slot: Slot) -> Option<&SlotSimilarity> {
        self.components.iter().find(|c| c.slot == slot)
    }

    pub(crate) fn from_single(row: SimilarityRow) -> Self {
        Self {
            components: vec![SlotSimilarity {
                slot: Slot::Main,
                similarity: Some(row.similarity),
            }],
            id: row.id,
            content: row.content,
            metadata: row.metadata,
            similarity: row.similarity,
        }
    }

    pub(crate) fn from_weighted(row: WeightedSimilarityRow, slots: &[Slot]) -> Self {
        let components = slots
            .iter()
            .map(|slot| SlotSimilarity {
                slot: *slot,
                similarity: row.slot_similarity(*slot),
            })
            .collect();
        Self {
            id: row.id,
            content: row.content,
            metadata: row.metadata,
            similarity: row.similarity,
            components,
        }
    }
}
