//! Chunked batch embedding.

use std::time::Duration;

use log::debug;

use crate::embedding::embedder::Embedder;
use crate::error::{PrismError, Result};
use crate::vector::validation::validate_dimensions;

/// Embed `texts` in chunks of at most `chunk_size`.
///
/// Texts within a chunk are embedded concurrently through
/// [`Embedder::embed_batch`]; chunks run one after another with `delay`
/// between them to stay under provider rate limits. The first failing chunk
/// aborts the call. Output order matches input order, and every vector is
/// checked against [`Embedder::dimension`].
pub async fn embed_in_chunks(
    embedder: &dyn Embedder,
    texts: &[String],
    chunk_size: usize,
    delay: Duration,
) -> Result<Vec<Vec<f32>>> {
    if chunk_size == 0 {
        return Err(PrismError::invalid_config("embedding chunk size must be positive"));
    }

    let total_chunks = texts.len().div_ceil(chunk_size);
    let mut vectors = Vec::with_capacity(texts.len());
    for (index, chunk) in texts.chunks(chunk_size).enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!(
            "embedding chunk {}/{} ({} texts) with '{}'",
            index + 1,
            total_chunks,
            chunk.len(),
            embedder.name()
        );

        let embedded = embedder.embed_batch(chunk).await?;
        if embedded.len() != chunk.len() {
            return Err(PrismError::embedding(format!(
                "embedder '{}' returned {} vectors for {} texts",
                embedder.name(),
                embedded.len(),
                chunk.len()
            )));
        }
        for vector in &embedded {
            validate_dimensions(vector, embedder.dimension())?;
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}
