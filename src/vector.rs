//! Vector primitives shared by the search and document layers.
//!
//! # Module Structure
//!
//! - `slot`: the four embedding positions of a document
//! - `distance`: cosine distance / similarity
//! - `validation`: dimension and value checks for embeddings
//! - `weights`: slot weight normalization

pub mod distance;
pub mod slot;
pub mod validation;
pub mod weights;

pub use distance::{cosine_distance, cosine_similarity};
pub use slot::Slot;
pub use validation::{embedding_from_value, validate_dimensions, validate_embedding_value};
pub use weights::{
    DEFAULT_SLOT_WEIGHT, NORMALIZATION_TOLERANCE, NormalizedWeights, SlotWeights,
    normalize_weights,
};
