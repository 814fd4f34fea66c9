//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PrismError, Result};
use crate::retry::{RetryPolicy, duration_to_millis};
use crate::search::request::{DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD};

fn default_batch_size() -> usize {
    100
}

fn default_embedding_chunk_size() -> usize {
    100
}

fn default_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_limit() -> usize {
    DEFAULT_MATCH_COUNT
}

/// Configuration shared by [`SearchEngine`](crate::SearchEngine) and
/// [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Expected embedding dimension. When set, every query and document
    /// embedding is checked against it before reaching the backend.
    #[serde(default)]
    pub dimension: Option<usize>,
    /// Retry policy for backend calls.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Documents per backend call in batch inserts.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Texts per embedding provider call.
    #[serde(default = "default_embedding_chunk_size")]
    pub embedding_chunk_size: usize,
    /// Pause between embedding chunks.
    #[serde(default)]
    pub embedding_chunk_delay_ms: u64,
    /// Threshold for queries that leave it unset.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
    /// Result cap for queries that leave it unset.
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension: None,
            retry: RetryPolicy::default(),
            batch_size: default_batch_size(),
            embedding_chunk_size: default_embedding_chunk_size(),
            embedding_chunk_delay_ms: 0,
            default_threshold: default_threshold(),
            default_limit: default_limit(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn embedding_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.embedding_chunk_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == Some(0) {
            return Err(PrismError::invalid_config("dimension must be positive"));
        }
        if self.batch_size == 0 {
            return Err(PrismError::invalid_config("batch_size must be positive"));
        }
        if self.embedding_chunk_size == 0 {
            return Err(PrismError::invalid_config(
                "embedding_chunk_size must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(PrismError::invalid_config(format!(
                "default_threshold must be within [0, 1], got {}",
                self.default_threshold
            )));
        }
        if self.default_limit == 0 {
            return Err(PrismError::invalid_config("default_limit must be positive"));
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(PrismError::invalid_config(format!(
                "retry initial delay ({} ms) exceeds max delay ({} ms)",
                self.retry.initial_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.dimension = Some(dimension);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn embedding_chunk_size(mut self, size: usize) -> Self {
        self.config.embedding_chunk_size = size;
        self
    }

    pub fn embedding_chunk_delay(mut self, delay: Duration) -> Self {
        self.config.embedding_chunk_delay_ms = duration_to_millis(delay);
        self
    }

    pub fn default_threshold(mut self, threshold: f32) -> Self {
        self.config.default_threshold = threshold;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
