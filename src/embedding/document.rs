//! Attaching generated embeddings to documents.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::{Document, Metadata};
use crate::embedding::batch::embed_in_chunks;
use crate::embedding::embedder::Embedder;
use crate::error::{PrismError, Result};
use crate::vector::slot::Slot;

/// Raw document text to be embedded before insertion.
///
/// `content` is embedded into the main slot and each entry of `sections` into
/// the section slot at the same position. Blank section texts leave their
/// slot empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub sections: Vec<String>,
}

impl DocumentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_section(mut self, text: impl Into<String>) -> Self {
        self.sections.push(text.into());
        self
    }
}

/// Generates main and section embeddings for [`DocumentInput`]s.
#[derive(Debug, Clone)]
pub struct DocumentEmbedder {
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl DocumentEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunk_size: 100,
            chunk_delay: Duration::ZERO,
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed every text of every input and build the documents, in input order.
    pub async fn embed_documents(&self, inputs: Vec<DocumentInput>) -> Result<Vec<Document>> {
        let mut texts = Vec::new();
        let mut targets = Vec::new();
        for (doc_index, input) in inputs.iter().enumerate() {
            if input.content.trim().is_empty() {
                return Err(PrismError::validation(format!(
                    "document {doc_index} has empty content"
                )));
            }
            if input.sections.len() > Slot::SECTIONS.len() {
                return Err(PrismError::validation(format!(
                    "document {doc_index} has {} sections; at most {} are supported",
                    input.sections.len(),
                    Slot::SECTIONS.len()
                )));
            }

            texts.push(input.content.clone());
            targets.push((doc_index, Slot::Main));
            for (position, section) in input.sections.iter().enumerate() {
                if section.trim().is_empty() {
                    continue;
                }
                if let Some(slot) = Slot::section(position) {
                    texts.push(section.clone());
                    targets.push((doc_index, slot));
                }
            }
        }

        let vectors = embed_in_chunks(
            self.embedder.as_ref(),
            &texts,
            self.chunk_size,
            self.chunk_delay,
        )
        .await?;

        let mut documents: Vec<Document> = inputs
            .into_iter()
            .map(|input| Document {
                id: input.id,
                content: input.content,
                metadata: input.metadata,
                ..Default::default()
            })
            .collect();
        for ((doc_index, slot), vector) in targets.into_iter().zip(vectors) {
            *documents[doc_index].slot_mut(slot) = Some(vector);
        }
        Ok(documents)
    }

    pub async fn embed_document(&self, input: DocumentInput) -> Result<Document> {
        self.embed_documents(vec![input])
            .await?
            .pop()
            .ok_or_else(|| PrismError::embedding("no document produced"))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Debug)]
    struct FirstCharEmbedder;

    #[async_trait]
    impl Embedder for FirstCharEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let c = text.chars().next().map(|c| c as u32 as f32).unwrap_or(0.0);
            Ok(vec![c, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "first-char"
        }
    }

    #[tokio::test]
    async fn test_sections_fill_matching_slots() {
        let pipeline = DocumentEmbedder::new(Arc::new(FirstCharEmbedder)).chunk_size(2);
        let docs = pipeline
            .embed_documents(vec![
                DocumentInput::new("alpha")
                    .with_section("beta")
                    .with_section("  ")
                    .with_section("gamma"),
                DocumentInput::new("delta").with_id("d"),
            ])
            .await
            .unwrap();

        assert_eq!(docs[0].embedding_for(Slot::Main), Some(&['a' as u32 as f32, 1.0][..]));
        assert_eq!(
            docs[0].embedding_for(Slot::Section1),
            Some(&['b' as u32 as f32, 1.0][..])
        );
        assert!(docs[0].embedding_for(Slot::Section2).is_none());
        assert_eq!(
            docs[0].embedding_for(Slot::Section3),
            Some(&['g' as u32 as f32, 1.0][..])
        );
        assert_eq!(docs[1].id.as_deref(), Some("d"));
        assert_eq!(docs[1].embeddings().count(), 1);
    }

    #[tokio::test]
    async fn test_rejects_too_many_sections_and_empty_content() {
        let pipeline = DocumentEmbedder::new(Arc::new(FirstCharEmbedder));
        let input = DocumentInput::new("x")
            .with_section("a")
            .with_section("b")
            .with_section("c")
            .with_section("d");
        assert!(matches!(
            pipeline.embed_document(input).await,
            Err(PrismError::Validation(_))
        ));
        assert!(matches!(
            pipeline.embed_document(DocumentInput::new(" ")).await,
            Err(PrismError::Validation(_))
        ));
    }
}
