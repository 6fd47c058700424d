//! Hybrid search engine: cache lookup, parallel vector/keyword retrieval,
//! RRF fusion, definition boosting, and smart-context expansion.

pub mod analyzer;
pub mod cache;
pub mod context;
pub mod fusion;

use std::path::Path;

use crate::config::{CacheConfig, SearchConfig};
use crate::embedder::Embedder;
use crate::error::CocoResult;
use crate::storage::Storage;
use crate::tokenize::normalize_query;
use crate::types::{ByteRange, ScoreBreakdown, SearchOptions, SearchResult};

pub use analyzer::{analyze, QueryAnalysis, SearchMode};

/// Over-fetch factor applied to `limit` before fusion, so RRF has enough
/// candidates from each leg to actually change the ranking.
const FETCH_FACTOR: usize = 4;
const MIN_FETCH: usize = 20;

/// Stateless hybrid search orchestrator; all state it needs (the pool, the
/// embedding client) is passed in per call so it can be constructed once
/// and shared across concurrent requests.
pub struct SearchEngine {
    search_config: SearchConfig,
    cache_config: CacheConfig,
}

impl SearchEngine {
    /// Build a search engine bound to one configuration snapshot.
    #[must_use]
    pub fn new(search_config: SearchConfig, cache_config: CacheConfig) -> Self {
        Self { search_config, cache_config }
    }

    /// Run one hybrid search: cache lookup, parallel vector + keyword
    /// retrieval (unless hybrid resolves to off, which skips the vector
    /// leg), RRF fusion, definition boost, min-score/limit filtering,
    /// hydration, and optional context expansion.
    ///
    /// `options.use_hybrid` of `None` auto-detects from the query shape via
    /// [`analyzer::analyze`]: identifier-shaped queries run both legs
    /// (hybrid), since a symbol name is exactly what the keyword leg is
    /// best at and the vector leg still helps rank near-miss names; prose
    /// queries run vector-only, since free text rarely shares vocabulary
    /// with `tsvector`'s identifier-weighted half. `Some(true)` always runs
    /// both legs; `Some(false)` always skips the vector leg and runs
    /// keyword-only.
    pub async fn search(
        &self,
        storage: &Storage,
        embedder: &Embedder,
        project_root: &Path,
        index_name: &str,
        query: &str,
        options: &SearchOptions,
    ) -> CocoResult<Vec<SearchResult>> {
        let is_identifier = analyzer::analyze(query).looks_like_identifier;
        let (run_vector_leg, run_keyword_leg) = resolve_legs(options.use_hybrid, is_identifier);
        let query_embedding = if run_vector_leg && embedder.is_available() { embedder.embed(query).await.ok() } else { None };

        if self.cache_config.enabled && !options.no_cache {
            if let Some(cached) = cache::lookup(
                storage,
                index_name,
                query,
                &options.filters,
                options.limit,
                options.min_score,
                query_embedding.as_deref(),
                self.cache_config.semantic_similarity_threshold,
            )
            .await?
            {
                return Ok(cached);
            }
        }

        let fetch_k = (options.limit * FETCH_FACTOR).max(MIN_FETCH);

        let vector_results = match &query_embedding {
            Some(embedding) => storage.vector_search(index_name, embedding, fetch_k, &options.filters).await?,
            None => Vec::new(),
        };
        let keyword_results = if run_keyword_leg {
            let normalized_query = normalize_query(query);
            storage.keyword_search(index_name, &normalized_query, fetch_k, &options.filters).await?
        } else {
            Vec::new()
        };

        let fused = fusion::fuse(&vector_results, &keyword_results, self.search_config.rrf_k);

        let hydration_keys: Vec<(String, ByteRange)> =
            fused.iter().take(fetch_k).map(|c| (c.filename.clone(), c.location)).collect();
        let chunks = storage.fetch_chunks(index_name, &hydration_keys).await?;

        let mut results = Vec::new();
        for candidate in fused.into_iter().take(fetch_k) {
            let Some(chunk) = chunks
                .iter()
                .find(|c| c.filename == candidate.filename && c.location.location_key() == candidate.location.location_key())
            else {
                continue;
            };

            let definition_boost = if chunk.symbol_type.is_some() { self.search_config.definition_boost } else { 0.0 };
            let score = candidate.rrf_score + definition_boost;
            if score < options.min_score {
                continue;
            }

            let (content, location) = if options.smart_context {
                match std::fs::read_to_string(project_root.join(&chunk.filename)) {
                    Ok(file_text) => context::expand(
                        &chunk.filename,
                        &file_text,
                        chunk.location,
                        &chunk.content,
                        self.search_config.context_line_cap,
                    ),
                    Err(_) => (chunk.content.clone(), chunk.location),
                }
            } else if options.context_before > 0 || options.context_after > 0 {
                match std::fs::read_to_string(project_root.join(&chunk.filename)) {
                    Ok(file_text) => {
                        context::expand_fixed(&file_text, chunk.location, &chunk.content, options.context_before, options.context_after)
                    }
                    Err(_) => (chunk.content.clone(), chunk.location),
                }
            } else {
                (chunk.content.clone(), chunk.location)
            };

            results.push(SearchResult {
                filename: chunk.filename.clone(),
                location,
                content,
                language: chunk.language,
                symbol_name: chunk.symbol_name.clone(),
                symbol_type: chunk.symbol_type,
                match_type: candidate.match_type,
                score,
                score_breakdown: ScoreBreakdown {
                    vector_score: candidate.vector_score,
                    keyword_score: candidate.keyword_score,
                    rrf_score: candidate.rrf_score,
                    definition_boost,
                },
            });
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(options.limit);

        if self.cache_config.enabled && !options.no_cache {
            cache::store(
                storage,
                index_name,
                query,
                &options.filters,
                options.limit,
                options.min_score,
                query_embedding.as_deref(),
                &results,
            )
            .await?;
        }

        Ok(results)
    }
}

/// Which legs to run for a given `use_hybrid` setting and query shape.
/// `None` (auto) runs both legs for an identifier-shaped query and
/// vector-only for prose; `Some(_)` pins the choice regardless of shape.
fn resolve_legs(use_hybrid: Option<bool>, is_identifier: bool) -> (bool, bool) {
    match use_hybrid {
        Some(true) => (true, true),
        Some(false) => (false, true),
        None if is_identifier => (true, true),
        None => (true, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_k_has_a_floor_for_small_limits() {
        let fetch_k = (1usize * FETCH_FACTOR).max(MIN_FETCH);
        assert_eq!(fetch_k, MIN_FETCH);
    }

    #[test]
    fn fetch_k_scales_with_limit() {
        let fetch_k = (50usize * FETCH_FACTOR).max(MIN_FETCH);
        assert_eq!(fetch_k, 200);
    }

    #[test]
    fn auto_mode_runs_both_legs_for_identifier_queries() {
        assert_eq!(resolve_legs(None, true), (true, true));
    }

    #[test]
    fn auto_mode_runs_vector_only_for_prose_queries() {
        assert_eq!(resolve_legs(None, false), (true, false));
    }

    #[test]
    fn explicit_true_always_runs_both_legs() {
        assert_eq!(resolve_legs(Some(true), false), (true, true));
    }

    #[test]
    fn explicit_false_always_runs_keyword_only() {
        assert_eq!(resolve_legs(Some(false), true), (false, true));
    }
}
