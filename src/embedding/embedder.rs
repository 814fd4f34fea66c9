//! The embedding provider seam.

use std::fmt::Debug;

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::error::Result;

/// Maps text to fixed-dimension vectors.
///
/// Providers are fallible and usually rate-limited; see
/// [`crate::embedding::batch::embed_in_chunks`] for chunked batch embedding.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    ///
    /// The default launches one [`Embedder::embed`] call per text and waits
    /// for all of them; the first failure is returned. Providers with a native
    /// batch endpoint should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        try_join_all(texts.iter().map(|text| self.embed(text))).await
    }

    /// Dimension of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Name used in logs and error messages.
    fn name(&self) -> &str;
}
