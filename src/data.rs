//! Documents, partial updates and metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::vector::slot::Slot;

/// Arbitrary key-value metadata attached to a document.
///
/// Keys are kept in sorted order so that equal mappings compare and serialize
/// identically regardless of insertion order. The crate attaches no meaning to
/// the values; metadata is only ever matched structurally (see
/// [`Metadata::contains`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns true if `filter` is a structural sub-mapping of `self`.
    ///
    /// Every key of `filter` must be present here with a value that contains
    /// the filter's value: objects match recursively, arrays match when each
    /// filter element is contained in some element of ours, and scalars must
    /// be equal. An empty filter matches everything.
    pub fn contains(&self, filter: &Metadata) -> bool {
        filter.0.iter().all(|(key, wanted)| {
            self.0
                .get(key)
                .is_some_and(|actual| value_contains(actual, wanted))
        })
    }
}

impl FromIterator<(String, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Metadata(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Metadata {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Metadata(map)
    }
}

impl TryFrom<Value> for Metadata {
    type Error = crate::error::PrismError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Metadata::new()),
            other => Err(crate::error::PrismError::validation(format!(
                "metadata must be a JSON object, got {other}"
            ))),
        }
    }
}

fn value_contains(actual: &Value, wanted: &Value) -> bool {
    match (actual, wanted) {
        (Value::Object(actual), Value::Object(wanted)) => wanted.iter().all(|(key, value)| {
            actual
                .get(key)
                .is_some_and(|inner| value_contains(inner, value))
        }),
        (Value::Array(actual), Value::Array(wanted)) => wanted
            .iter()
            .all(|value| actual.iter().any(|item| value_contains(item, value))),
        // A scalar filter value matches an array holding it.
        (Value::Array(actual), scalar) => actual.iter().any(|item| item == scalar),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == wanted,
    }
}

/// A stored document with up to four embedding slots.
///
/// Absent embeddings are `None`, never empty vectors. When present, every
/// embedding of a document has the same dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Backend-generated when `None` at insert time.
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub section_1_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub section_2_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub section_3_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn new_with_id(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach an embedding to the given slot.
    pub fn with_embedding(mut self, slot: Slot, vector: Vec<f32>) -> Self {
        *self.slot_mut(slot) = Some(vector);
        self
    }

    /// The embedding stored in `slot`, if any.
    pub fn embedding_for(&self, slot: Slot) -> Option<&[f32]> {
        match slot {
            Slot::Main => self.embedding.as_deref(),
            Slot::Section1 => self.section_1_embedding.as_deref(),
            Slot::Section2 => self.section_2_embedding.as_deref(),
            Slot::Section3 => self.section_3_embedding.as_deref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<Vec<f32>> {
        match slot {
            Slot::Main => &mut self.embedding,
            Slot::Section1 => &mut self.section_1_embedding,
            Slot::Section2 => &mut self.section_2_embedding,
            Slot::Section3 => &mut self.section_3_embedding,
        }
    }

    /// Iterate over the slots that carry an embedding.
    pub fn embeddings(&self) -> impl Iterator<Item = (Slot, &[f32])> {
        Slot::ALL
            .into_iter()
            .filter_map(|slot| self.embedding_for(slot).map(|v| (slot, v)))
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &DocumentPatch) {
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata = metadata.clone();
        }
        for (slot, change) in &patch.embeddings {
            *self.slot_mut(*slot) = change.clone();
        }
    }
}

/// A partial update. Fields left as `None` are not touched.
///
/// Embedding changes are keyed by slot: `Some(vector)` replaces the slot,
/// `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub embeddings: BTreeMap<Slot, Option<Vec<f32>>>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn embedding(mut self, slot: Slot, vector: Vec<f32>) -> Self {
        self.embeddings.insert(slot, Some(vector));
        self
    }

    pub fn clear_embedding(mut self, slot: Slot) -> Self {
        self.embeddings.insert(slot, None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.metadata.is_none() && self.embeddings.is_empty()
    }
}
