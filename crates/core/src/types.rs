//! Core domain types shared across cocosearch-core's subsystems.
//!
//! Modules communicate exclusively through these types; nothing here talks
//! to Postgres or tree-sitter directly.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A programming language cocosearch can parse and chunk.
///
/// Unrecognised extensions fall back to [`Language::PlainText`], which still
/// gets chunked and embedded but never produces symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Python source (`.py`, `.pyi`).
    Python,
    /// Rust source (`.rs`).
    Rust,
    /// TypeScript / TSX source (`.ts`, `.tsx`).
    TypeScript,
    /// JavaScript / JSX source (`.js`, `.jsx`, `.mjs`, `.cjs`).
    JavaScript,
    /// Go source (`.go`).
    Go,
    /// Java source (`.java`).
    Java,
    /// Anything without a registered handler: still chunked, never parsed
    /// for symbols.
    PlainText,
}

impl Language {
    /// All languages with a registered symbol-extraction handler, i.e.
    /// everything but [`Language::PlainText`].
    #[must_use]
    pub fn parsed_languages() -> &'static [Language] {
        &[
            Language::Python,
            Language::Rust,
            Language::TypeScript,
            Language::JavaScript,
            Language::Go,
            Language::Java,
        ]
    }

    /// Short identifier used in filter predicates and stored in
    /// `chunks.language_id` (e.g. `"python"`, `"rust"`).
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
            Language::PlainText => "plaintext",
        }
    }

    /// Inverse of [`Language::id`]; unrecognised ids (and the empty string
    /// found in rows written before a language was attributed) fall back to
    /// [`Language::PlainText`].
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id {
            "python" => Language::Python,
            "rust" => Language::Rust,
            "typescript" => Language::TypeScript,
            "javascript" => Language::JavaScript,
            "go" => Language::Go,
            "java" => Language::Java,
            _ => Language::PlainText,
        }
    }
}

/// A contiguous byte range within a file, used as part of a chunk's stable
/// primary key alongside its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
    /// 1-based first line covered by this range.
    pub start_line: usize,
    /// 1-based last line covered by this range.
    pub end_line: usize,
}

impl ByteRange {
    /// A stable textual key for this range, used to build `location` and
    /// for cache keys (`"{start}-{end}"`).
    #[must_use]
    pub fn location_key(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// The kind of syntactic unit a chunk or symbol represents.
///
/// Mirrors the `symbol_type` enumeration `{function, class, method,
/// interface, struct, trait, enum, ""}`, so the `symbol_type` search filter
/// can select each kind distinctly instead of every struct/interface/trait/
/// enum collapsing into one `class` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// A function or free-standing subroutine.
    Function,
    /// A method bound to a type/class/struct.
    Method,
    /// A class declaration (Python/JS/TS/Java `class`).
    Class,
    /// An interface or protocol declaration (TS `interface`, Java `interface`, Go `interface{...}`).
    Interface,
    /// A struct declaration (Rust `struct`, Go `struct{...}`).
    Struct,
    /// A trait declaration (Rust `trait`).
    Trait,
    /// An enum declaration (Rust `enum`, Java `enum`).
    Enum,
    /// A module, namespace, or package-level grouping.
    Module,
    /// A chunk with no single enclosing definition (prose, imports, etc.).
    Fragment,
}

/// Why a file's parse attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileParseStatus {
    /// Parsed cleanly with no syntax errors.
    Ok,
    /// Parsed with some tree-sitter error nodes; usable symbols were still
    /// extracted from the rest of the tree.
    Partial,
    /// Parsing failed outright; the file was chunked as plain text.
    Error,
    /// No handler is registered for this file's language; chunked as plain
    /// text by design, not by failure.
    Unsupported,
}

/// A single extracted definition: a function, method, class/interface/
/// struct/trait/enum, or module-level binding discovered by the symbol
/// extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Definition kind (`@definition.<kind>` capture name).
    pub kind: BlockType,
    /// Bare name as written in source.
    pub name: String,
    /// Fully qualified name: receiver/class/module path joined with `.`
    /// (`ClassName.method_name`) or `::` for Rust (`module::Type::method`).
    pub qualified_name: String,
    /// Signature text from the definition keyword up to (not including) the
    /// opening body delimiter.
    pub signature: String,
    /// Byte range of the whole definition (used for smart-context
    /// expansion), not just the signature.
    pub range: ByteRange,
}

/// One chunk of a file: the unit cocosearch embeds, indexes, and returns
/// from search.
///
/// Primary key is `(filename, location)`, stable across reindexing as long
/// as the underlying text at that byte range is unchanged — this is what
/// lets incremental reindex diff at chunk granularity instead of
/// whole-file granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Path relative to the project root, forward-slash separated.
    pub filename: String,
    /// Byte range (and line range) this chunk covers within `filename`.
    pub location: ByteRange,
    /// Raw chunk text.
    pub content: String,
    /// Dense embedding vector, `None` until the embedding stage runs (or
    /// permanently, in degraded/keyword-only mode).
    pub embedding: Option<Vec<f32>>,
    /// Kind of syntactic unit this chunk represents.
    pub block_type: BlockType,
    /// Enclosing-scope path, outermost first (e.g. `["UserService", "login"]`).
    pub hierarchy: Vec<String>,
    /// Language the chunk's file was parsed as.
    pub language: Language,
    /// Symbol kind if this chunk corresponds to one definition, else `None`.
    pub symbol_type: Option<BlockType>,
    /// Symbol name if `symbol_type` is set.
    pub symbol_name: Option<String>,
    /// Symbol signature if `symbol_type` is set.
    pub symbol_signature: Option<String>,
}

/// Per-file ingestion outcome, persisted so incremental reindex can diff
/// against it without re-parsing unchanged files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    /// Path relative to the project root.
    pub filename: String,
    /// SHA-256 of the file's bytes at the time of this parse.
    pub content_hash: String,
    /// Outcome of the parse attempt.
    pub status: FileParseStatus,
    /// Diagnostic message when `status` is `Partial` or `Error`.
    pub error_message: Option<String>,
    /// Number of symbols extracted (0 for `Unsupported`/`Error`).
    pub symbol_count: usize,
    /// Number of chunks produced for this file.
    pub chunk_count: usize,
    /// When this file was last (re)indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Registry entry mapping a canonical project path to an index name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRegistryEntry {
    /// Human-assigned or derived index name, unique across the registry.
    pub index_name: String,
    /// Canonicalised (symlink-resolved) absolute project root.
    pub canonical_path: PathBuf,
    /// Discovered `.git` root, if any, found by walking upward from
    /// `canonical_path`.
    pub git_root: Option<PathBuf>,
    /// When this entry was first created.
    pub created_at: DateTime<Utc>,
    /// When this project was last fully indexed.
    pub last_indexed_at: Option<DateTime<Utc>>,
}

impl PathRegistryEntry {
    /// Staleness threshold from the Project Resolver component: an index
    /// not refreshed within this window is flagged stale in diagnostics,
    /// not deleted.
    pub const STALE_AFTER_DAYS: i64 = 7;

    /// Whether this entry's last index run is older than the staleness
    /// threshold (or it was never indexed at all).
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.last_indexed_at {
            Some(last) => (now - last).num_days() >= Self::STALE_AFTER_DAYS,
            None => true,
        }
    }
}

/// Which retrieval path(s) produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Found only by vector (embedding) similarity.
    Semantic,
    /// Found only by keyword (`tsvector`) match.
    Keyword,
    /// Found by both retrieval paths and fused.
    Both,
}

/// Per-result score breakdown, returned so callers (and `analyze_query`)
/// can see how a result was ranked rather than trusting a single opaque
/// number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Cosine similarity from the vector leg, if retrieved there.
    pub vector_score: Option<f32>,
    /// `ts_rank_cd` score from the keyword leg, if retrieved there.
    pub keyword_score: Option<f32>,
    /// Reciprocal-rank-fusion score combining both legs.
    pub rrf_score: f32,
    /// Additive boost applied when the chunk is a definition
    /// (`symbol_type.is_some()`).
    pub definition_boost: f32,
}

/// One search result, hydrated with surrounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// File the result came from, relative to the project root.
    pub filename: String,
    /// Byte/line range of the matched chunk.
    pub location: ByteRange,
    /// Chunk text, possibly expanded to its enclosing definition (see
    /// [`crate::search::context`]).
    pub content: String,
    /// Language of the source file.
    pub language: Language,
    /// Symbol name, if the result is (or was expanded to) a definition.
    pub symbol_name: Option<String>,
    /// Symbol kind, if the result is (or was expanded to) a definition.
    pub symbol_type: Option<BlockType>,
    /// How this result was retrieved.
    pub match_type: MatchType,
    /// Final combined score used for ranking.
    pub score: f32,
    /// Score components, exposed for diagnostics and tuning.
    pub score_breakdown: ScoreBreakdown,
}

/// Structured filters accepted by a search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filters {
    /// Restrict to one language, by [`Language::id`].
    pub language: Option<String>,
    /// Restrict to one symbol/block kind.
    pub block_type: Option<BlockType>,
    /// Restrict to results whose symbol name matches exactly.
    pub symbol_name: Option<String>,
    /// Restrict to files whose relative path matches this glob.
    pub path_glob: Option<String>,
}

/// Options controlling a single search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results to return.
    pub limit: usize,
    /// Minimum final score a result must clear to be returned.
    pub min_score: f32,
    /// Structured filters applied before ranking.
    pub filters: Filters,
    /// Whether to run both retrieval legs. `None` (the default) auto-detects
    /// from the query shape: identifier-shaped queries (`getUserById`) run
    /// both legs, since the keyword leg is exactly what matches the symbol
    /// name and the vector leg still helps rank near-miss results; prose
    /// queries run vector-only, since free text rarely shares vocabulary
    /// with `tsvector`'s identifier-weighted half. `Some(true)` forces both
    /// legs; `Some(false)` forces keyword-only.
    pub use_hybrid: Option<bool>,
    /// Expand each result to its smallest enclosing definition.
    pub smart_context: bool,
    /// Extra lines of raw context to include before a result (when
    /// `smart_context` is `false`).
    pub context_before: usize,
    /// Extra lines of raw context to include after a result (when
    /// `smart_context` is `false`).
    pub context_after: usize,
    /// Skip both cache tiers for this call.
    pub no_cache: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            min_score: 0.0,
            filters: Filters::default(),
            use_hybrid: None,
            smart_context: false,
            context_before: 0,
            context_after: 0,
            no_cache: false,
        }
    }
}

/// Per-language parse-health summary, part of [`IndexStats`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageStats {
    /// Files successfully parsed (`FileParseStatus::Ok`).
    pub ok: usize,
    /// Files with partial parse errors.
    pub partial: usize,
    /// Files that failed to parse.
    pub error: usize,
    /// Files with no registered handler.
    pub unsupported: usize,
}

/// Aggregate statistics returned by `index_stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total indexed files.
    pub file_count: usize,
    /// Total stored chunks.
    pub chunk_count: usize,
    /// Total extracted symbols.
    pub symbol_count: usize,
    /// Percentage of files that parsed `Ok` or `Partial` (0.0-100.0).
    pub parse_health_pct: f32,
    /// Per-language breakdown, keyed by [`Language::id`].
    pub by_language: std::collections::BTreeMap<String, LanguageStats>,
    /// When the index was last fully refreshed.
    pub last_indexed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_range_location_key() {
        let r = ByteRange {
            start: 10,
            end: 42,
            start_line: 2,
            end_line: 5,
        };
        assert_eq!(r.location_key(), "10-42");
    }

    #[test]
    fn staleness_with_no_prior_index_is_stale() {
        let entry = PathRegistryEntry {
            index_name: "demo".into(),
            canonical_path: PathBuf::from("/tmp/demo"),
            git_root: None,
            created_at: Utc::now(),
            last_indexed_at: None,
        };
        assert!(entry.is_stale(Utc::now()));
    }

    #[test]
    fn staleness_threshold() {
        let now = Utc::now();
        let entry = PathRegistryEntry {
            index_name: "demo".into(),
            canonical_path: PathBuf::from("/tmp/demo"),
            git_root: None,
            created_at: now,
            last_indexed_at: Some(now - chrono::Duration::days(8)),
        };
        assert!(entry.is_stale(now));

        let fresh = PathRegistryEntry {
            last_indexed_at: Some(now - chrono::Duration::days(1)),
            ..entry
        };
        assert!(!fresh.is_stale(now));
    }

    #[test]
    fn language_ids_are_stable() {
        assert_eq!(Language::Python.id(), "python");
        assert_eq!(Language::PlainText.id(), "plaintext");
    }

    #[test]
    fn language_from_id_roundtrips() {
        for lang in Language::parsed_languages() {
            assert_eq!(Language::from_id(lang.id()), *lang);
        }
        assert_eq!(Language::from_id("cobol"), Language::PlainText);
    }
}
