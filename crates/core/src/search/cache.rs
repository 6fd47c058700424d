//! Two-tier query cache: an exact-hash tier for byte-identical repeats, and
//! a semantic tier that matches a new query against previously-embedded
//! queries within a cosine-similarity threshold, per filter signature.

use sha2::{Digest, Sha256};

use crate::error::CocoResult;
use crate::storage::Storage;
use crate::types::{Filters, SearchResult};

/// Compute the exact-match hash and filter signature for one cache key.
/// The filter signature folds limit/min_score/filters into the key so two
/// queries with the same text but different constraints don't collide.
#[must_use]
pub fn cache_keys(query: &str, filters: &Filters, limit: usize, min_score: f32) -> (String, String) {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().to_lowercase().as_bytes());
    let query_hash = hex::encode(hasher.finalize());

    let filter_sig = format!(
        "{}|{}|{}|{}|{:.3}",
        filters.language.as_deref().unwrap_or(""),
        filters.block_type.map(|b| format!("{b:?}")).unwrap_or_default(),
        filters.path_glob.as_deref().unwrap_or(""),
        limit,
        min_score
    );

    (query_hash, filter_sig)
}

/// Look up a cached result set: exact hash first, then semantic similarity
/// against `query_embedding` (if embeddings are available) within
/// `similarity_threshold`.
pub async fn lookup(
    storage: &Storage,
    index_name: &str,
    query: &str,
    filters: &Filters,
    limit: usize,
    min_score: f32,
    query_embedding: Option<&[f32]>,
    similarity_threshold: f32,
) -> CocoResult<Option<Vec<SearchResult>>> {
    let (query_hash, filter_sig) = cache_keys(query, filters, limit, min_score);

    if let Some(blob) = storage.cache_get_exact(index_name, &query_hash, &filter_sig).await? {
        if let Ok(results) = serde_json::from_value(blob) {
            return Ok(Some(results));
        }
    }

    if let Some(embedding) = query_embedding {
        if let Some(blob) = storage.cache_get_semantic(index_name, embedding, &filter_sig, similarity_threshold).await? {
            if let Ok(results) = serde_json::from_value(blob) {
                return Ok(Some(results));
            }
        }
    }

    Ok(None)
}

/// Populate both cache tiers for a freshly computed result set.
pub async fn store(
    storage: &Storage,
    index_name: &str,
    query: &str,
    filters: &Filters,
    limit: usize,
    min_score: f32,
    query_embedding: Option<&[f32]>,
    results: &[SearchResult],
) -> CocoResult<()> {
    let (query_hash, filter_sig) = cache_keys(query, filters, limit, min_score);
    let blob = serde_json::to_value(results)?;

    storage.cache_put_exact(index_name, &query_hash, &filter_sig, &blob).await?;
    if let Some(embedding) = query_embedding {
        storage.cache_put_semantic(index_name, embedding, &filter_sig, &blob).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_case_and_whitespace_insensitive() {
        let filters = Filters::default();
        let (h1, _) = cache_keys("GetUser ", &filters, 10, 0.0);
        let (h2, _) = cache_keys("getuser", &filters, 10, 0.0);
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_limits_produce_different_filter_signatures() {
        let filters = Filters::default();
        let (_, sig1) = cache_keys("query", &filters, 10, 0.0);
        let (_, sig2) = cache_keys("query", &filters, 20, 0.0);
        assert_ne!(sig1, sig2);
    }
}
