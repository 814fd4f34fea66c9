//! Slot weight normalization.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{PrismError, Result};
use crate::vector::slot::Slot;

/// Weight given to a slot whose weight was not supplied.
pub const DEFAULT_SLOT_WEIGHT: f32 = 0.25;

/// Weights within this distance of summing to one are used as-is.
pub const NORMALIZATION_TOLERANCE: f32 = 0.01;

/// Raw, caller-supplied slot weights.
///
/// Unset weights take [`DEFAULT_SLOT_WEIGHT`] before normalization, whether or
/// not the query carries a vector for that slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotWeights {
    #[serde(default)]
    pub main: Option<f32>,
    #[serde(default)]
    pub section_1: Option<f32>,
    #[serde(default)]
    pub section_2: Option<f32>,
    #[serde(default)]
    pub section_3: Option<f32>,
}

impl SlotWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a single slot.
    pub fn with(mut self, slot: Slot, weight: f32) -> Self {
        self.set(slot, weight);
        self
    }

    pub fn set(&mut self, slot: Slot, weight: f32) {
        *self.slot_mut(slot) = Some(weight);
    }

    pub fn get(&self, slot: Slot) -> Option<f32> {
        match slot {
            Slot::Main => self.main,
            Slot::Section1 => self.section_1,
            Slot::Section2 => self.section_2,
            Slot::Section3 => self.section_3,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<f32> {
        match slot {
            Slot::Main => &mut self.main,
            Slot::Section1 => &mut self.section_1,
            Slot::Section2 => &mut self.section_2,
            Slot::Section3 => &mut self.section_3,
        }
    }

    /// The four weights with defaults filled in, in [`Slot::ALL`] order.
    pub fn resolved(&self) -> [f32; 4] {
        Slot::ALL.map(|slot| self.get(slot).unwrap_or(DEFAULT_SLOT_WEIGHT))
    }

    pub fn normalize(&self) -> Result<NormalizedWeights> {
        normalize_weights(self)
    }
}

/// Slot weights that sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeights {
    pub main: f32,
    pub section_1: f32,
    pub section_2: f32,
    pub section_3: f32,
}

impl NormalizedWeights {
    fn from_array(w: [f32; 4]) -> Self {
        Self {
            main: w[0],
            section_1: w[1],
            section_2: w[2],
            section_3: w[3],
        }
    }

    pub fn get(&self, slot: Slot) -> f32 {
        match slot {
            Slot::Main => self.main,
            Slot::Section1 => self.section_1,
            Slot::Section2 => self.section_2,
            Slot::Section3 => self.section_3,
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.main, self.section_1, self.section_2, self.section_3]
    }

    pub fn sum(&self) -> f32 {
        self.as_array().iter().sum()
    }
}

impl Default for NormalizedWeights {
    fn default() -> Self {
        Self::from_array([DEFAULT_SLOT_WEIGHT; 4])
    }
}

/// Turn raw slot weights into weights summing to one.
///
/// Negative or non-finite weights, and an all-zero vector, are rejected with
/// [`PrismError::InvalidWeights`]. Weights already within
/// [`NORMALIZATION_TOLERANCE`] of summing to one are returned unchanged.
pub fn normalize_weights(weights: &SlotWeights) -> Result<NormalizedWeights> {
    let raw = weights.resolved();

    for (slot, w) in Slot::ALL.iter().zip(raw.iter()) {
        if !w.is_finite() || *w < 0.0 {
            return Err(PrismError::invalid_weights(format!(
                "weight for slot '{slot}' must be a non-negative number, got {w}"
            )));
        }
    }

    let total: f32 = raw.iter().sum();
    if total == 0.0 {
        return Err(PrismError::invalid_weights(
            "weights sum to zero and cannot be normalized",
        ));
    }

    if (total - 1.0).abs() <= NORMALIZATION_TOLERANCE {
        return Ok(NormalizedWeights::from_array(raw));
    }

    let normalized = raw.map(|w| w / total);
    info!("normalized slot weights from {raw:?} (sum {total}) to {normalized:?}");
    Ok(NormalizedWeights::from_array(normalized))
}
