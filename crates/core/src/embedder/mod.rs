//! Embedding client for a local Ollama-compatible HTTP endpoint.
//!
//! No bundled model, no on-disk cache: every embed call is an HTTP request
//! against `config.endpoint` (default `http://localhost:11434`), the way
//! Ollama's `/api/embeddings` works. This keeps the crate free of a model
//! runtime dependency at the cost of requiring the endpoint to be reachable;
//! callers that can't reach it fall back to keyword-only search rather than
//! failing outright (see [`CocoError::EmbedderUnavailable`]).
//!
//! ## Failure handling
//!
//! A warm-up call at construction classifies the embedder as available or
//! degraded up front, so the pipeline can log once rather than retry every
//! chunk. Once degraded, subsequent `embed`/`embed_many` calls short-circuit
//! without hitting the network again -- [`Embedder::is_available`] reflects
//! the last successful/failed check, it isn't re-probed per call.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::{CocoError, CocoResult};

/// HTTP client wrapping one Ollama-compatible embedding endpoint.
pub struct Embedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
    available: AtomicBool,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl Embedder {
    /// Build an embedder from `config`. Does not perform any network I/O;
    /// call [`Embedder::warm_up`] once after construction to classify
    /// availability before ingestion begins.
    #[must_use]
    pub fn new(config: &EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            config: config.clone(),
            available: AtomicBool::new(true),
        }
    }

    /// Build an embedder that never calls out, always returning
    /// [`CocoError::EmbedderUnavailable`]. Used in tests and any caller
    /// that explicitly wants keyword-only mode.
    #[must_use]
    pub fn degraded(config: &EmbeddingConfig) -> Self {
        let embedder = Self::new(config);
        embedder.available.store(false, Ordering::Relaxed);
        embedder
    }

    /// Issue one embedding request to classify the endpoint as reachable.
    /// Marks the embedder degraded on any failure rather than returning an
    /// error, since a cold Ollama instance at startup is an expected,
    /// recoverable state (spec's "keyword-only fallback").
    pub async fn warm_up(&self) -> CocoResult<()> {
        match self.request_embedding("cocosearch warm-up probe").await {
            Ok(_) => {
                self.available.store(true, Ordering::Relaxed);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, endpoint = %self.config.endpoint, "embedding endpoint unreachable, falling back to keyword-only search");
                self.available.store(false, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Whether the last warm-up/embed call succeeded.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Configured output vector dimensionality.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Embed a single string.
    pub async fn embed(&self, text: &str) -> CocoResult<Vec<f32>> {
        if !self.is_available() {
            return Err(CocoError::EmbedderUnavailable {
                reason: format!("{} marked unreachable after last failure", self.config.endpoint),
            });
        }

        match self.request_embedding(text).await {
            Ok(embedding) => Ok(embedding),
            Err(err) => {
                self.available.store(false, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    /// Embed a batch of chunk texts, `config.batch_size` at a time.
    ///
    /// Returns one slot per input; a slot is `None` when that specific
    /// chunk failed to embed even though the endpoint as a whole is up
    /// (oversized input, transient error) -- the caller stores the chunk
    /// without a vector and keyword search still finds it.
    pub async fn embed_many(&self, texts: &[&str]) -> Vec<Option<Vec<f32>>> {
        if !self.is_available() {
            return vec![None; texts.len()];
        }

        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            for text in batch {
                match self.request_embedding(text).await {
                    Ok(embedding) => results.push(Some(embedding)),
                    Err(err) => {
                        tracing::warn!(error = %err, "embedding request failed for one chunk, storing without a vector");
                        results.push(None);
                    }
                }
            }
        }
        results
    }

    async fn request_embedding(&self, text: &str) -> CocoResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.endpoint.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest { model: &self.config.model, prompt: text })
            .send()
            .await?
            .error_for_status()?;

        let body: EmbedResponse = response.json().await?;
        if body.embedding.len() != self.config.dimensions {
            return Err(CocoError::Internal(format!(
                "embedding endpoint returned {} dimensions, expected {}",
                body.embedding.len(),
                self.config.dimensions
            )));
        }
        Ok(body.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            endpoint: "http://127.0.0.1:1".into(),
            model: "nomic-embed-text".into(),
            dimensions: 768,
            batch_size: 8,
            timeout_secs: 1,
        }
    }

    #[test]
    fn degraded_embedder_reports_unavailable() {
        let embedder = Embedder::degraded(&config());
        assert!(!embedder.is_available());
    }

    #[tokio::test]
    async fn degraded_embedder_embed_returns_unavailable_error() {
        let embedder = Embedder::degraded(&config());
        let err = embedder.embed("fn main() {}").await.unwrap_err();
        assert!(matches!(err, CocoError::EmbedderUnavailable { .. }));
    }

    #[tokio::test]
    async fn embed_many_on_degraded_embedder_returns_all_none() {
        let embedder = Embedder::degraded(&config());
        let results = embedder.embed_many(&["a", "b", "c"]).await;
        assert_eq!(results, vec![None, None, None]);
    }

    #[tokio::test]
    async fn warm_up_against_unreachable_endpoint_marks_degraded() {
        let embedder = Embedder::new(&config());
        embedder.warm_up().await.unwrap();
        assert!(!embedder.is_available());
    }

    #[test]
    fn dimensions_reflects_config() {
        let embedder = Embedder::degraded(&config());
        assert_eq!(embedder.dimensions(), 768);
    }
}
