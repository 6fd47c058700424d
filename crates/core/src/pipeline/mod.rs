//! Ingestion pipeline and the top-level `Engine` facade.
//!
//! `Engine` wires every subsystem together (config, storage, the embedding
//! client, project resolution, the search engine) and exposes the small set
//! of operations everything else -- CLI, an eventual MCP server -- calls
//! through: index a project, search it, and inspect/manage indexes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::chunker;
use crate::config::Config;
use crate::embedder::Embedder;
use crate::error::{CocoError, CocoResult};
use crate::handlers::Registry;
use crate::resolver::{self, ResolvedProject};
use crate::search::fusion;
use crate::search::{self, QueryAnalysis, SearchEngine};
use crate::storage::Storage;
use crate::symbols::{self, ExtractionResult};
use crate::tokenize::normalize_query;
use crate::types::{Chunk, Filters, Language, MatchType, ParseResult, SearchOptions, SearchResult, Symbol};

/// Parameters for one `run_index` call; everything but the path is
/// optional and falls back to the resolved project / config defaults.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Override the index name the project would otherwise resolve to.
    pub index_name: Option<String>,
    /// Glob patterns to include. Empty defers to `config.indexing.include_patterns`.
    pub include_patterns: Vec<String>,
    /// Extra glob patterns to exclude, on top of `config.indexing.exclude_patterns`.
    pub exclude_patterns: Vec<String>,
    /// Whether `.gitignore` rules are honored while walking the tree.
    pub respect_gitignore: bool,
}

impl IndexOptions {
    #[must_use]
    pub fn new() -> Self {
        Self { respect_gitignore: true, ..Self::default() }
    }
}

/// Outcome of one `run_index` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexReport {
    /// Files indexed for the first time.
    pub files_added: usize,
    /// Previously-indexed files that changed and were reindexed.
    pub files_updated: usize,
    /// Files no longer present on disk whose chunks/parse results were dropped.
    pub files_removed: usize,
    /// Files that could not be read or decoded; skipped but not abort-worthy.
    pub files_failed: usize,
    /// Total chunks written across added/updated files.
    pub chunks_written: usize,
    /// Total symbols extracted across added/updated files.
    pub symbols_extracted: usize,
    /// Total chunks that received an embedding vector.
    pub embeddings_computed: usize,
}

/// One entry from `list_indexes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Index name.
    pub name: String,
    /// Canonical project root this index was built from.
    pub canonical_path: String,
    /// Total stored chunks.
    pub chunks: usize,
    /// Total indexed files.
    pub files: usize,
    /// When the index was last fully refreshed.
    pub last_updated_at: Option<chrono::DateTime<Utc>>,
    /// Days since the last refresh, `None` if never indexed.
    pub stale_days: Option<i64>,
}

/// Detailed stats for one index, as returned by `index_stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatsReport {
    /// Total indexed files.
    pub files: usize,
    /// Total stored chunks.
    pub chunks: usize,
    /// Total extracted symbols.
    pub symbols: usize,
    /// Percentage of files that parsed `Ok` or `Partial` (0.0-100.0).
    pub parse_health_pct: f32,
    /// Per-language parse-health breakdown.
    pub by_language: std::collections::BTreeMap<String, crate::types::LanguageStats>,
    /// Per-file parse failures, populated only if requested.
    pub parse_failures: Option<Vec<ParseResult>>,
}

/// Diagnostic record returned by `analyze_query`: the analyzer's verdict
/// plus a dry-run fusion pass, so a caller can see why a query would be
/// ranked the way it is without committing to a cached search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDiagnostics {
    /// Query analysis (identifier detection, suggested mode, expanded terms).
    pub analysis: QueryAnalysis,
    /// Whether a query embedding was computed (false if the embedder is degraded).
    pub embedding_available: bool,
    /// Candidates returned by the vector leg.
    pub vector_candidate_count: usize,
    /// Candidates returned by the keyword leg.
    pub keyword_candidate_count: usize,
    /// Candidates found by both legs and fused.
    pub both_count: usize,
    /// Candidates found only by the vector leg.
    pub semantic_only_count: usize,
    /// Candidates found only by the keyword leg.
    pub keyword_only_count: usize,
}

/// The top-level facade: one resolved project, bound to storage, the
/// embedding client, and the search engine.
pub struct Engine {
    config: Config,
    storage: Storage,
    embedder: Arc<Embedder>,
    search_engine: SearchEngine,
    project: ResolvedProject,
}

impl Engine {
    /// Load config from `repo_path`, connect to storage, resolve the
    /// project, and warm up the embedding client.
    pub async fn new(repo_path: &Path) -> CocoResult<Self> {
        Self::with_config(Config::load(repo_path)?).await
    }

    /// Build an engine from an already-loaded config.
    pub async fn with_config(config: Config) -> CocoResult<Self> {
        let storage = Storage::connect(&config.storage.database_url, config.storage.max_connections).await?;
        let project = resolver::resolve(&storage, Some(&config.repo_path), false, None).await?;
        storage.provision(&project.index_name, config.embedding.dimensions).await?;

        let embedder = Embedder::new(&config.embedding);
        embedder.warm_up().await?;

        let search_engine = SearchEngine::new(config.search.clone(), config.cache.clone());

        Ok(Self { config, storage, embedder: Arc::new(embedder), search_engine, project })
    }

    /// The resolved project this engine is bound to.
    #[must_use]
    pub fn project(&self) -> &ResolvedProject {
        &self.project
    }

    /// The configuration this engine was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Walk the project tree and (re)index every file that changed,
    /// dropping chunks/parse results for files that no longer exist.
    ///
    /// Per-file I/O runs on a bounded worker pool (`config.indexing.parse_concurrency`
    /// permits); each worker offloads the CPU-bound chunk/symbol-extraction
    /// step onto the global `rayon` pool and awaits it through a one-shot
    /// channel, so the async executor's own threads never block on parsing.
    /// A storage error aborts the run; a single file's decode/parse failure
    /// does not.
    pub async fn run_index(&self, options: &IndexOptions) -> CocoResult<IndexReport> {
        let index_name = options.index_name.clone().unwrap_or_else(|| self.project.index_name.clone());
        self.storage.provision(&index_name, self.config.embedding.dimensions).await?;

        let known_before: HashSet<String> = self.storage.list_known_files(&index_name).await?.into_iter().collect();

        let exclude_patterns: Vec<&str> = self
            .config
            .indexing
            .exclude_patterns
            .iter()
            .map(String::as_str)
            .chain(options.exclude_patterns.iter().map(String::as_str))
            .collect();
        let exclude_set = build_globset(&exclude_patterns)?;

        let include_patterns: Vec<&str> = if options.include_patterns.is_empty() {
            self.config.indexing.include_patterns.iter().map(String::as_str).collect()
        } else {
            options.include_patterns.iter().map(String::as_str).collect()
        };
        let include_set = if include_patterns.is_empty() { None } else { Some(build_globset(&include_patterns)?) };

        let paths = discover_files(
            &self.project.canonical_path,
            options.respect_gitignore,
            self.config.indexing.follow_symlinks,
            self.config.indexing.max_file_size,
            &exclude_set,
            include_set.as_ref(),
        );

        let semaphore = Arc::new(Semaphore::new(self.config.indexing.parse_concurrency.max(1)));
        let mut join_set = JoinSet::new();
        for path in paths {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|err| CocoError::Internal(format!("worker semaphore closed: {err}")))?;
            let storage = self.storage.clone();
            let embedder = Arc::clone(&self.embedder);
            let index_name = index_name.clone();
            let root = self.project.canonical_path.clone();
            let chunk_size = self.config.indexing.chunk_size;
            let chunk_overlap = self.config.indexing.chunk_overlap;
            let weight_identifier = self.config.search.tsvector_weight_identifier;
            let weight_body = self.config.search.tsvector_weight_body;

            join_set.spawn(async move {
                let _permit = permit;
                process_file(
                    &storage,
                    &embedder,
                    &index_name,
                    &root,
                    &path,
                    chunk_size,
                    chunk_overlap,
                    weight_identifier,
                    weight_body,
                )
                .await
            });
        }

        let mut report = IndexReport::default();
        let mut surviving: HashSet<String> = HashSet::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(outcome)) => {
                    surviving.insert(outcome.filename.clone());
                    match outcome.kind {
                        OutcomeKind::Added | OutcomeKind::Updated => {
                            report.chunks_written += outcome.chunks;
                            report.symbols_extracted += outcome.symbols;
                            report.embeddings_computed += outcome.embeddings;
                            if outcome.kind == OutcomeKind::Added {
                                report.files_added += 1;
                            } else {
                                report.files_updated += 1;
                            }
                        }
                        OutcomeKind::Unchanged => {}
                        OutcomeKind::Failed => report.files_failed += 1,
                    }
                }
                Ok(Err(err)) => {
                    join_set.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    join_set.abort_all();
                    return Err(CocoError::IngestionFatal { details: format!("file worker panicked: {join_err}") });
                }
            }
        }

        report.files_removed = known_before.difference(&surviving).count();
        let surviving_list: Vec<String> = surviving.into_iter().collect();
        self.storage.delete_orphaned_files(&index_name, &surviving_list).await?;
        self.storage.invalidate_cache(&index_name).await?;
        self.storage.touch_index(&index_name).await?;

        Ok(report)
    }

    /// Run one hybrid search against `index_name` (or the resolved
    /// project's own index if `None`).
    pub async fn search(
        &self,
        query: &str,
        index_name: Option<&str>,
        options: &SearchOptions,
    ) -> CocoResult<Vec<SearchResult>> {
        let name = index_name.map(String::from).unwrap_or_else(|| self.project.index_name.clone());
        self.search_engine
            .search(&self.storage, &self.embedder, &self.project.canonical_path, &name, query, options)
            .await
    }

    /// List every registered index, with basic stats and staleness.
    pub async fn list_indexes(&self) -> CocoResult<Vec<IndexSummary>> {
        let entries = self.storage.list_indexes().await?;
        let now = Utc::now();
        Ok(entries
            .into_iter()
            .map(|(entry, stats)| IndexSummary {
                name: entry.index_name,
                canonical_path: entry.canonical_path.to_string_lossy().into_owned(),
                chunks: stats.chunk_count,
                files: stats.file_count,
                last_updated_at: entry.last_indexed_at,
                stale_days: entry.last_indexed_at.map(|t| (now - t).num_days()),
            })
            .collect())
    }

    /// Detailed stats for one index (or the resolved project's own index).
    pub async fn index_stats(&self, index_name: Option<&str>, include_failures: bool) -> CocoResult<IndexStatsReport> {
        let name = index_name.map(String::from).unwrap_or_else(|| self.project.index_name.clone());
        let stats = self.storage.stats(&name).await?;
        let parse_failures =
            if include_failures { Some(self.storage.list_parse_failures(&name).await?) } else { None };

        Ok(IndexStatsReport {
            files: stats.file_count,
            chunks: stats.chunk_count,
            symbols: stats.symbol_count,
            parse_health_pct: stats.parse_health_pct,
            by_language: stats.by_language,
            parse_failures,
        })
    }

    /// Drop every table and registry entry for an index.
    pub async fn clear_index(&self, index_name: Option<&str>) -> CocoResult<()> {
        let name = index_name.map(String::from).unwrap_or_else(|| self.project.index_name.clone());
        self.storage.clear_index(&name).await
    }

    /// Run the query analyser and a dry-run fusion pass, without touching
    /// the cache, so a caller can inspect how a query would be retrieved
    /// and ranked.
    pub async fn analyze_query(&self, query: &str, index_name: Option<&str>) -> CocoResult<QueryDiagnostics> {
        let name = index_name.map(String::from).unwrap_or_else(|| self.project.index_name.clone());
        let analysis = search::analyze(query);

        let filters = Filters::default();
        let fetch_k = self.config.search.default_limit.saturating_mul(4).max(20);

        let embedding = if self.embedder.is_available() { self.embedder.embed(query).await.ok() } else { None };
        let vector_results = match &embedding {
            Some(vector) => self.storage.vector_search(&name, vector, fetch_k, &filters).await?,
            None => Vec::new(),
        };
        let normalized_query = normalize_query(query);
        let keyword_results = self.storage.keyword_search(&name, &normalized_query, fetch_k, &filters).await?;
        let fused = fusion::fuse(&vector_results, &keyword_results, self.config.search.rrf_k);

        let both_count = fused.iter().filter(|c| c.match_type == MatchType::Both).count();
        let semantic_only_count = fused.iter().filter(|c| c.match_type == MatchType::Semantic).count();
        let keyword_only_count = fused.iter().filter(|c| c.match_type == MatchType::Keyword).count();

        Ok(QueryDiagnostics {
            analysis,
            embedding_available: embedding.is_some(),
            vector_candidate_count: vector_results.len(),
            keyword_candidate_count: keyword_results.len(),
            both_count,
            semantic_only_count,
            keyword_only_count,
        })
    }
}

/// Outcome of processing one file, reported back to `run_index`'s collector.
struct FileOutcome {
    filename: String,
    chunks: usize,
    symbols: usize,
    embeddings: usize,
    kind: OutcomeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutcomeKind {
    Added,
    Updated,
    Unchanged,
    Failed,
}

impl FileOutcome {
    fn unchanged(filename: String) -> Self {
        Self { filename, chunks: 0, symbols: 0, embeddings: 0, kind: OutcomeKind::Unchanged }
    }

    fn failed(filename: String) -> Self {
        Self { filename, chunks: 0, symbols: 0, embeddings: 0, kind: OutcomeKind::Failed }
    }
}

/// Read, hash-check, chunk, extract symbols from, embed, and store one file.
/// Decode/empty-handler problems are recorded as a failed parse result and
/// reported back as `Ok(FileOutcome::Failed)`, not an error -- only storage
/// failures propagate and abort the run.
#[allow(clippy::too_many_arguments)]
async fn process_file(
    storage: &Storage,
    embedder: &Embedder,
    index_name: &str,
    root: &Path,
    path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
    weight_identifier: char,
    weight_body: char,
) -> CocoResult<FileOutcome> {
    let rel_path = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            record_failure(storage, index_name, &rel_path, &err.to_string()).await?;
            return Ok(FileOutcome::failed(rel_path));
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => {
            record_failure(storage, index_name, &rel_path, "not valid UTF-8").await?;
            return Ok(FileOutcome::failed(rel_path));
        }
    };

    let hash = content_hash(&text);
    let existing = storage.get_parse_result(index_name, &rel_path).await?;
    if let Some(prev) = &existing {
        if prev.content_hash == hash {
            return Ok(FileOutcome::unchanged(rel_path));
        }
    }
    let is_new = existing.is_none();

    let resolution = Registry::global().resolve(Path::new(&rel_path), text.as_bytes());
    let (mut chunks, extraction) =
        compute_chunks_and_symbols(rel_path.clone(), text, resolution, chunk_size, chunk_overlap).await;
    associate_symbols(&mut chunks, &extraction.symbols);

    let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    let embeddings = embedder.embed_many(&texts).await;
    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = embedding;
    }
    let embeddings_computed = chunks.iter().filter(|c| c.embedding.is_some()).count();

    storage.delete_chunks_for_file(index_name, &rel_path).await?;
    for chunk in &chunks {
        storage.upsert_chunk(index_name, chunk, weight_identifier, weight_body).await?;
    }

    let parse_result = ParseResult {
        filename: rel_path.clone(),
        content_hash: hash,
        status: extraction.status,
        error_message: None,
        symbol_count: extraction.symbols.len(),
        chunk_count: chunks.len(),
        indexed_at: Utc::now(),
    };
    storage.upsert_parse_result(index_name, &parse_result).await?;

    Ok(FileOutcome {
        filename: rel_path,
        chunks: chunks.len(),
        symbols: extraction.symbols.len(),
        embeddings: embeddings_computed,
        kind: if is_new { OutcomeKind::Added } else { OutcomeKind::Updated },
    })
}

async fn record_failure(storage: &Storage, index_name: &str, filename: &str, message: &str) -> CocoResult<()> {
    let result = ParseResult {
        filename: filename.to_string(),
        content_hash: String::new(),
        status: crate::types::FileParseStatus::Error,
        error_message: Some(message.to_string()),
        symbol_count: 0,
        chunk_count: 0,
        indexed_at: Utc::now(),
    };
    storage.upsert_parse_result(index_name, &result).await
}

/// Run chunking and symbol extraction on the global `rayon` pool, bridging
/// the result back into the async pipeline through a one-shot channel so
/// the calling tokio worker thread is never blocked on CPU work.
async fn compute_chunks_and_symbols(
    filename: String,
    text: String,
    resolution: crate::handlers::Resolution<'static>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> (Vec<Chunk>, ExtractionResult) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    rayon::spawn(move || {
        let language = resolution.language();
        let chunks = chunker::chunk_file(&filename, &text, language, &resolution, chunk_size, chunk_overlap);
        let extraction = match Registry::global().handler_for(language) {
            Some(handler) if language != Language::PlainText => {
                let ts_language = handler.ts_language();
                symbols::extract_symbols(&text, &ts_language, handler.symbol_query(), handler.qualifier_separator())
            }
            _ => symbols::unsupported(),
        };
        let _ = tx.send((chunks, extraction));
    });

    rx.await.unwrap_or_else(|_| (Vec::new(), symbols::unsupported()))
}

/// Attach the smallest enclosing symbol to each chunk it falls within, so
/// search results can report a definition name/kind without a second pass
/// over the file.
fn associate_symbols(chunks: &mut [Chunk], symbols: &[Symbol]) {
    for chunk in chunks.iter_mut() {
        let enclosing = symbols
            .iter()
            .filter(|s| s.range.start <= chunk.location.start && s.range.end >= chunk.location.end)
            .min_by_key(|s| s.range.end - s.range.start);

        if let Some(symbol) = enclosing {
            chunk.symbol_type = Some(symbol.kind);
            chunk.symbol_name = Some(symbol.qualified_name.clone());
            chunk.symbol_signature = Some(symbol.signature.clone());
        }
    }
}

/// Walk `root`, honoring `.gitignore` (if `respect_gitignore`), symlink
/// policy, size limits, and the resolved include/exclude glob sets.
fn discover_files(
    root: &Path,
    respect_gitignore: bool,
    follow_symlinks: bool,
    max_file_size: u64,
    exclude_set: &GlobSet,
    include_set: Option<&GlobSet>,
) -> Vec<PathBuf> {
    let mut walker = ignore::WalkBuilder::new(root);
    walker.git_ignore(respect_gitignore).git_exclude(respect_gitignore).follow_links(follow_symlinks).hidden(false);

    let mut paths = Vec::new();
    for entry in walker.build() {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel) {
            continue;
        }
        if let Some(include_set) = include_set {
            if !include_set.is_match(&rel) {
                continue;
            }
        }
        if let Ok(metadata) = entry.metadata() {
            if metadata.len() > max_file_size {
                continue;
            }
        }

        paths.push(path.to_path_buf());
    }
    paths
}

fn build_globset(patterns: &[&str]) -> CocoResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|err| CocoError::Config { details: format!("invalid glob pattern '{pattern}': {err}") })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| CocoError::Config { details: format!("failed to build glob set: {err}") })
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_options_default_respects_gitignore() {
        assert!(IndexOptions::new().respect_gitignore);
    }

    #[test]
    fn content_hash_is_stable_and_sensitive_to_changes() {
        let a = content_hash("fn main() {}");
        let b = content_hash("fn main() {}");
        let c = content_hash("fn main() { }");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn build_globset_matches_expected_patterns() {
        let set = build_globset(&["*.rs", "target/**"]).unwrap();
        assert!(set.is_match("src/lib.rs"));
        assert!(set.is_match("target/debug/build"));
        assert!(!set.is_match("README.md"));
    }

    #[test]
    fn build_globset_rejects_invalid_patterns() {
        assert!(build_globset(&["["]).is_err());
    }

    #[test]
    fn discover_files_respects_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("keep.rs"), "fn main() {}").unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/drop.rs"), "fn main() {}").unwrap();

        let exclude = build_globset(&["target/**"]).unwrap();
        let found = discover_files(dir.path(), false, false, 5 * 1024 * 1024, &exclude, None);
        let names: Vec<String> =
            found.iter().map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/")).collect();

        assert!(names.contains(&"keep.rs".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("target/")));
    }

    #[test]
    fn discover_files_skips_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.rs"), "x".repeat(100)).unwrap();
        let exclude = build_globset(&[]).unwrap();
        let found = discover_files(dir.path(), false, false, 10, &exclude, None);
        assert!(found.is_empty());
    }

    #[test]
    fn associate_symbols_picks_smallest_enclosing_range() {
        use crate::types::{BlockType, ByteRange};

        let mut chunks = vec![Chunk {
            filename: "lib.rs".into(),
            location: ByteRange { start: 10, end: 20, start_line: 1, end_line: 1 },
            content: "let x = 1;".into(),
            embedding: None,
            block_type: BlockType::Fragment,
            hierarchy: Vec::new(),
            language: Language::Rust,
            symbol_type: None,
            symbol_name: None,
            symbol_signature: None,
        }];

        let symbols = vec![
            Symbol {
                kind: BlockType::Module,
                name: "outer".into(),
                qualified_name: "outer".into(),
                signature: "mod outer".into(),
                range: ByteRange { start: 0, end: 100, start_line: 1, end_line: 10 },
            },
            Symbol {
                kind: BlockType::Function,
                name: "inner".into(),
                qualified_name: "outer::inner".into(),
                signature: "fn inner()".into(),
                range: ByteRange { start: 5, end: 25, start_line: 1, end_line: 2 },
            },
        ];

        associate_symbols(&mut chunks, &symbols);
        assert_eq!(chunks[0].symbol_name.as_deref(), Some("outer::inner"));
        assert_eq!(chunks[0].symbol_type, Some(BlockType::Function));
    }

    #[test]
    #[ignore = "requires a running Postgres instance; see crates/core/tests for the DB-backed suite"]
    fn engine_round_trips_index_and_search() {
        // Grounded on crates/core/tests: DB-dependent scenarios are written
        // against a real pool and gated behind #[ignore] rather than mocked.
    }
}
