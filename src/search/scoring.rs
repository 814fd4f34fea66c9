//! The weighted scoring contract.
//!
//! For every candidate and every slot, the slot similarity is
//! `1 - cosine_distance(query, candidate)` when both the query and the
//! candidate have an embedding for that slot. The aggregate is the sum of
//! `similarity * weight` over those slots. A slot missing on either side
//! contributes nothing and is reported as not applicable; it does not count as
//! zero similarity for any other slot.
//!
//! Candidates are kept when their aggregate reaches the threshold and their
//! metadata contains the filter, ordered by aggregate descending and capped at
//! the match count. The threshold is applied to the final per-document
//! aggregate.

use std::cmp::Ordering;

use crate::backend::WeightedVectorParams;
use crate::data::{Document, Metadata};
use crate::error::Result;
use crate::vector::distance::cosine_similarity;
use crate::vector::slot::Slot;

/// Per-slot similarities and their weighted aggregate for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlotScores {
    pub aggregate: f32,
    /// Indexed by [`Slot::index`]; `None` means not applicable.
    pub slots: [Option<f32>; 4],
}

impl SlotScores {
    pub fn get(&self, slot: Slot) -> Option<f32> {
        self.slots[slot.index()]
    }
}

/// Score one candidate against a weighted query.
pub fn score_document(params: &WeightedVectorParams, document: &Document) -> Result<SlotScores> {
    let mut scores = SlotScores::default();
    for slot in Slot::ALL {
        let (Some(query), Some(candidate)) = (params.query_for(slot), document.embedding_for(slot))
        else {
            continue;
        };
        let similarity = cosine_similarity(query, candidate)?;
        scores.slots[slot.index()] = Some(similarity);
        scores.aggregate += similarity * params.weight_for(slot);
    }
    Ok(scores)
}

/// Similarity of a candidate's main embedding to a single query vector.
///
/// `None` when the candidate has no main embedding.
pub fn score_main(query: &[f32], document: &Document) -> Result<Option<f32>> {
    document
        .embedding_for(Slot::Main)
        .map(|candidate| cosine_similarity(query, candidate))
        .transpose()
}

/// Whether a candidate passes the optional metadata filter.
pub fn matches_filter(document: &Document, filter: Option<&Metadata>) -> bool {
    filter.is_none_or(|filter| document.metadata.contains(filter))
}

/// Keep entries scoring at least `threshold`, best first, at most `limit`.
pub fn rank<T>(mut scored: Vec<(f32, T)>, threshold: f32, limit: usize) -> Vec<(f32, T)> {
    scored.retain(|(score, _)| *score >= threshold);
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(section_1: Option<Vec<f32>>, weights: [f32; 4]) -> WeightedVectorParams {
        WeightedVectorParams {
            query_embedding: vec![1.0, 0.0],
            section_1_query: section_1,
            section_2_query: Some(vec![0.0, 1.0]),
            section_3_query: None,
            main_weight: weights[0],
            section_1_weight: weights[1],
            section_2_weight: weights[2],
            section_3_weight: weights[3],
            match_threshold: 0.0,
            match_count: 10,
            filter_metadata: None,
        }
    }

    #[test]
    fn test_missing_candidate_section_is_not_applicable() {
        let doc = Document::new("d")
            .with_embedding(Slot::Main, vec![1.0, 0.0])
            .with_embedding(Slot::Section2, vec![0.0, 1.0]);

        let scores = score_document(&params(Some(vec![1.0, 0.0]), [0.25; 4]), &doc).unwrap();

        assert_eq!(scores.get(Slot::Section1), None);
        assert_eq!(scores.get(Slot::Section3), None);
        assert!((scores.get(Slot::Main).unwrap() - 1.0).abs() < 1e-6);
        assert!((scores.get(Slot::Section2).unwrap() - 1.0).abs() < 1e-6);
        assert!((scores.aggregate - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_query_section_is_not_applicable() {
        let doc = Document::new("d")
            .with_embedding(Slot::Main, vec![1.0, 0.0])
            .with_embedding(Slot::Section1, vec![1.0, 0.0]);

        let scores = score_document(&params(None, [0.5, 0.5, 0.0, 0.0]), &doc).unwrap();
        assert_eq!(scores.get(Slot::Section1), None);
        assert!((scores.aggregate - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rank_filters_orders_and_caps() {
        let ranked = rank(vec![(0.4, "a"), (0.9, "b"), (0.6, "c"), (0.7, "d")], 0.5, 2);
        assert_eq!(ranked, vec![(0.9, "b"), (0.7, "d")]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ranked = rank(vec![(0.5, 1), (0.49, 2)], 0.5, 10);
        assert_eq!(ranked, vec![(0.5, 1)]);
    }
}
