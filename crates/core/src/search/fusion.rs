//! Reciprocal rank fusion of the vector and keyword retrieval legs.

use std::collections::HashMap;

use crate::types::{ByteRange, MatchType};

/// One fused candidate before hydration: identifies a chunk and carries
/// enough of each leg's signal to build a [`crate::types::ScoreBreakdown`].
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    /// File the chunk belongs to.
    pub filename: String,
    /// Byte/line range of the chunk.
    pub location: ByteRange,
    /// Cosine similarity from the vector leg, if retrieved there.
    pub vector_score: Option<f32>,
    /// `ts_rank_cd` score from the keyword leg, if retrieved there.
    pub keyword_score: Option<f32>,
    /// Combined RRF score (ties broken in favor of keyword rank).
    pub rrf_score: f32,
    /// Which leg(s) produced this candidate.
    pub match_type: MatchType,
}

/// Fuse ranked vector and keyword result lists with reciprocal rank fusion
/// (`1 / (k + rank)` per leg, summed), ties broken in the keyword leg's
/// favor since an exact lexical match is a stronger signal than a narrowly
/// ranked embedding neighbor at equal RRF score.
#[must_use]
pub fn fuse(
    vector_results: &[(String, ByteRange, f32)],
    keyword_results: &[(String, ByteRange, f32)],
    rrf_k: u32,
) -> Vec<FusedCandidate> {
    let mut candidates: HashMap<(String, String), FusedCandidate> = HashMap::new();
    let k = f64::from(rrf_k);

    for (rank, (filename, range, score)) in vector_results.iter().enumerate() {
        let key = (filename.clone(), range.location_key());
        let contribution = 1.0 / (k + (rank + 1) as f64);
        let entry = candidates.entry(key).or_insert_with(|| FusedCandidate {
            filename: filename.clone(),
            location: *range,
            vector_score: None,
            keyword_score: None,
            rrf_score: 0.0,
            match_type: MatchType::Semantic,
        });
        entry.vector_score = Some(*score);
        #[allow(clippy::cast_possible_truncation)]
        {
            entry.rrf_score += contribution as f32;
        }
    }

    for (rank, (filename, range, score)) in keyword_results.iter().enumerate() {
        let key = (filename.clone(), range.location_key());
        let contribution = 1.0 / (k + (rank + 1) as f64);
        let entry = candidates.entry(key).or_insert_with(|| FusedCandidate {
            filename: filename.clone(),
            location: *range,
            vector_score: None,
            keyword_score: None,
            rrf_score: 0.0,
            match_type: MatchType::Keyword,
        });
        entry.keyword_score = Some(*score);
        #[allow(clippy::cast_possible_truncation)]
        {
            entry.rrf_score += contribution as f32;
        }
        entry.match_type =
            if entry.vector_score.is_some() { MatchType::Both } else { MatchType::Keyword };
    }

    let mut fused: Vec<FusedCandidate> = candidates.into_values().collect();
    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.keyword_score.partial_cmp(&a.keyword_score).unwrap_or(std::cmp::Ordering::Equal))
    });
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize) -> ByteRange {
        ByteRange { start, end: start + 10, start_line: 1, end_line: 1 }
    }

    #[test]
    fn candidate_found_by_both_legs_outranks_single_leg() {
        let vector = vec![("a.rs".to_string(), range(0), 0.9), ("b.rs".to_string(), range(0), 0.8)];
        let keyword = vec![("a.rs".to_string(), range(0), 0.5)];
        let fused = fuse(&vector, &keyword, 60);
        assert_eq!(fused[0].filename, "a.rs");
        assert_eq!(fused[0].match_type, MatchType::Both);
        assert!(fused[0].rrf_score > fused[1].rrf_score);
    }

    #[test]
    fn keyword_tie_break_favors_keyword_rank() {
        let vector = vec![("a.rs".to_string(), range(0), 0.5), ("b.rs".to_string(), range(0), 0.5)];
        let keyword = vec![("b.rs".to_string(), range(0), 0.9)];
        let fused = fuse(&vector, &keyword, 60);
        // both tie on rank-1 vector contribution; b.rs also has a keyword hit
        assert_eq!(fused[0].filename, "b.rs");
    }

    #[test]
    fn empty_legs_produce_no_candidates() {
        assert!(fuse(&[], &[], 60).is_empty());
    }
}
