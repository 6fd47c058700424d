//! Identifier tokenisation and `tsvector` construction.
//!
//! Source identifiers don't split on whitespace the way prose does, so a
//! plain `plainto_tsquery` over raw chunk text misses `getUserById` when a
//! query says "get user by id". This module splits `camelCase`,
//! `PascalCase`, and `snake_case` identifiers into their component words at
//! both index time (building `content_tsv`) and query time (normalising the
//! lexical half of a search), so the two sides agree on vocabulary.

/// Split a single identifier into its component words, lower-cased.
///
/// `getUserByID` -> `["get", "user", "by", "id"]`
/// `parse_html_document` -> `["parse", "html", "document"]`
/// `HTTPRequest` -> `["http", "request"]`
#[must_use]
pub fn split_code_identifier(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = identifier.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if ch.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next = chars.get(i + 1);
            let prev_is_lower = prev.is_lowercase() || prev.is_ascii_digit();
            let ends_acronym = prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase());

            if prev_is_lower || ends_acronym {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(ch.to_ascii_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }

    words.into_iter().filter(|w| !w.is_empty()).collect()
}

/// Tokenise a chunk's identifiers into a flat, deduplicated word list
/// suitable for the weighted half of a `tsvector` (the `to_tsvector` input
/// for identifier-weighted tokens).
#[must_use]
pub fn tokenize_identifiers(identifiers: &[&str]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for ident in identifiers {
        seen.insert(ident.to_lowercase());
        for word in split_code_identifier(ident) {
            seen.insert(word);
        }
    }
    seen.into_iter().collect()
}

/// Detect whether a query string looks like a single source identifier
/// (camelCase, PascalCase, or snake_case) rather than natural-language
/// prose, used by the query analyser to pick a search strategy.
#[must_use]
pub fn looks_like_identifier(query: &str) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return false;
    }

    let has_separator_casing = trimmed.contains('_')
        || trimmed
            .chars()
            .zip(trimmed.chars().skip(1))
            .any(|(a, b)| a.is_lowercase() && b.is_uppercase());

    let is_identifier_shaped = trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-');

    is_identifier_shaped && (has_separator_casing || trimmed.chars().all(|c| c.is_lowercase() || c.is_numeric()))
}

/// Normalise a raw search query into the same vocabulary `tsvector`
/// indexing uses: split every whitespace-delimited token with
/// [`split_code_identifier`] and rejoin the resulting words with spaces, so
/// `getUserById` and `get user by id` both normalise to `"get user by id"`
/// and `plainto_tsquery` ANDs against words that are actually present in
/// `content_tsv`'s identifier-weighted half, rather than the raw
/// (unsplit) query terms.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .flat_map(|token| {
            let words = split_code_identifier(token);
            if words.is_empty() { vec![token.to_lowercase()] } else { words }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split the inputs Postgres needs to build a weighted `tsvector` for one
/// chunk: an identifier-derived token blob (weight `A`: symbol name,
/// hierarchy path, and their `split_code_identifier` expansions) and the raw
/// chunk body (weight `B`). The caller combines these with
/// `setweight(to_tsvector('simple', $1), 'A') || setweight(to_tsvector('simple', $2), 'B')`
/// rather than building the `tsvector` literal in Rust, so Postgres' own
/// text search parser still handles whitespace/punctuation splitting for
/// the body half.
#[must_use]
pub fn build_tsvector_inputs(identifiers: &[&str], body: &str) -> (String, String) {
    let identifier_tokens = tokenize_identifiers(identifiers);
    (identifier_tokens.join(" "), body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tsvector_inputs_includes_split_and_whole_identifier() {
        let (idents, body) = build_tsvector_inputs(&["getUserById"], "return user");
        assert!(idents.contains("get"));
        assert!(idents.contains("user"));
        assert!(idents.contains("getuserbyid"));
        assert_eq!(body, "return user");
    }

    #[test]
    fn splits_camel_case() {
        assert_eq!(split_code_identifier("getUserById"), vec!["get", "user", "by", "id"]);
    }

    #[test]
    fn splits_snake_case() {
        assert_eq!(split_code_identifier("parse_html_document"), vec!["parse", "html", "document"]);
    }

    #[test]
    fn splits_pascal_case_with_acronym() {
        assert_eq!(split_code_identifier("HTTPRequestHandler"), vec!["http", "request", "handler"]);
    }

    #[test]
    fn single_lowercase_word_is_unchanged() {
        assert_eq!(split_code_identifier("render"), vec!["render"]);
    }

    #[test]
    fn tokenize_identifiers_dedupes_and_sorts() {
        let words = tokenize_identifiers(&["getUser", "get_user"]);
        assert!(words.contains(&"get".to_string()));
        assert!(words.contains(&"user".to_string()));
        assert!(words.contains(&"getuser".to_string()));
        assert!(words.contains(&"get_user".to_string()));
    }

    #[test]
    fn normalize_query_splits_identifier_query() {
        assert_eq!(normalize_query("getUserById"), "get user by id");
    }

    #[test]
    fn normalize_query_splits_each_word_of_prose() {
        assert_eq!(normalize_query("parse_html_document now"), "parse html document now");
    }

    #[test]
    fn identifier_detection() {
        assert!(looks_like_identifier("getUserById"));
        assert!(looks_like_identifier("parse_html_document"));
        assert!(!looks_like_identifier("how does auth work"));
        assert!(!looks_like_identifier(""));
    }
}
