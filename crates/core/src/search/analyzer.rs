//! Query analysis: decide whether a query looks like a single source
//! identifier (favor keyword/symbol matching) or natural-language prose
//! (favor vector similarity), without ever refusing to run the other leg --
//! this only picks a default presentation for `analyze_query` and a
//! starting point for the definition boost; both retrieval legs still run.

use crate::tokenize::looks_like_identifier;

/// Which retrieval leg a query is expected to do most of the work in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Query reads as a single identifier (`getUserById`): keyword/symbol
    /// matching is expected to dominate.
    Lexical,
    /// Query reads as natural language ("how does auth work"): vector
    /// similarity is expected to dominate.
    Semantic,
}

/// Diagnostic breakdown of how a query was interpreted, returned by
/// `analyze_query` so a caller can see why a search behaved the way it did.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueryAnalysis {
    /// The query as received, trimmed.
    pub query: String,
    /// Whether the query is shaped like a single identifier.
    pub looks_like_identifier: bool,
    /// The retrieval mode this shape suggests.
    pub suggested_mode: SearchMode,
    /// Identifier words the query would expand to if matched against
    /// `tsvector`'s identifier-weighted half (empty for prose queries).
    pub expanded_terms: Vec<String>,
}

/// Classify `query` and compute its identifier expansion, if any.
#[must_use]
pub fn analyze(query: &str) -> QueryAnalysis {
    let trimmed = query.trim();
    let is_identifier = looks_like_identifier(trimmed);

    let expanded_terms = if is_identifier {
        crate::tokenize::split_code_identifier(trimmed)
    } else {
        Vec::new()
    };

    QueryAnalysis {
        query: trimmed.to_string(),
        looks_like_identifier: is_identifier,
        suggested_mode: if is_identifier { SearchMode::Lexical } else { SearchMode::Semantic },
        expanded_terms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_query_suggests_lexical_mode() {
        let analysis = analyze("getUserById");
        assert!(analysis.looks_like_identifier);
        assert_eq!(analysis.suggested_mode, SearchMode::Lexical);
        assert_eq!(analysis.expanded_terms, vec!["get", "user", "by", "id"]);
    }

    #[test]
    fn prose_query_suggests_semantic_mode() {
        let analysis = analyze("how does authentication work");
        assert!(!analysis.looks_like_identifier);
        assert_eq!(analysis.suggested_mode, SearchMode::Semantic);
        assert!(analysis.expanded_terms.is_empty());
    }
}
