//! Postgres/pgvector storage layer.
//!
//! Every index gets its own pair of tables (`<name>_chunks`,
//! `<name>_parse_results`) plus two query-cache tables; a single
//! `index_metadata` table tracks the registry across indexes. Table names
//! are interpolated (sqlx has no way to bind an identifier), so every
//! `index_name` is validated against [`is_safe_identifier`] before it ever
//! reaches a format string -- this is the one place in the crate that builds
//! SQL text instead of a parameterized query, and it stays that way
//! deliberately narrow.
//!
//! `sqlx::query!`/`query_as!` aren't used here: those macros need a live
//! `DATABASE_URL` (or a `.sqlx` offline cache) at compile time, which this
//! workspace doesn't provision. Every statement below goes through the
//! runtime `query`/`query_as` API instead.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use crate::error::{CocoError, CocoResult};
use crate::types::{
    BlockType, ByteRange, Chunk, FileParseStatus, Filters, IndexStats, LanguageStats, MatchType, ParseResult,
    PathRegistryEntry,
};

/// A connected Postgres pool plus the operations every index's tables
/// expose. Cheap to clone (wraps an `Arc` internally via `PgPool`).
#[derive(Clone)]
pub struct Storage {
    pool: PgPool,
}

const MAX_CONNECT_ATTEMPTS: u32 = 5;

impl Storage {
    /// Connect to `database_url`, retrying pool creation with bounded
    /// backoff (spec §4.1's "connection errors are retried with bounded
    /// backoff at pool creation"). Also exports `database_url` into the
    /// `DATABASE_URL` environment variable, since some embedded tooling
    /// (migration runners invoked as subprocesses) only reads that name.
    pub async fn connect(database_url: &str, max_connections: u32) -> CocoResult<Self> {
        std::env::set_var("DATABASE_URL", database_url);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match PgPoolOptions::new().max_connections(max_connections).connect(database_url).await {
                Ok(pool) => return Ok(Self { pool }),
                Err(err) if attempt < MAX_CONNECT_ATTEMPTS => {
                    let backoff = Duration::from_millis(200 * u64::from(attempt));
                    tracing::warn!(attempt, ?backoff, error = %err, "postgres connection attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(CocoError::Database(err)),
            }
        }
    }

    /// Access the underlying pool for callers (e.g. the registry) that need
    /// to run queries against `index_metadata` or cache tables directly.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create `<name>_chunks`, `<name>_parse_results`, their indexes, and
    /// register `index_name` in `index_metadata` if not already present.
    /// Idempotent: reruns only add columns/indexes that are missing.
    pub async fn provision(&self, index_name: &str, dimensions: usize) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;

        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector").execute(&self.pool).await?;

        let create_chunks = format!(
            "CREATE TABLE IF NOT EXISTS {name}_chunks (
                filename TEXT NOT NULL,
                location INT4RANGE NOT NULL,
                text TEXT NOT NULL,
                embedding VECTOR({dimensions}),
                block_type TEXT NOT NULL DEFAULT '',
                hierarchy TEXT NOT NULL DEFAULT '',
                language_id TEXT NOT NULL DEFAULT '',
                symbol_type TEXT NOT NULL DEFAULT '',
                symbol_name TEXT NOT NULL DEFAULT '',
                symbol_signature TEXT NOT NULL DEFAULT '',
                content_tsv TSVECTOR,
                PRIMARY KEY (filename, location)
            )"
        );
        sqlx::query(&create_chunks).execute(&self.pool).await?;

        let create_parse_results = format!(
            "CREATE TABLE IF NOT EXISTS {name}_parse_results (
                filename TEXT PRIMARY KEY,
                content_hash TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                error TEXT,
                language_id TEXT NOT NULL DEFAULT '',
                symbol_count BIGINT NOT NULL DEFAULT 0,
                chunk_count BIGINT NOT NULL DEFAULT 0,
                indexed_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"
        );
        sqlx::query(&create_parse_results).execute(&self.pool).await?;

        for stmt in [
            format!("CREATE INDEX IF NOT EXISTS {name}_chunks_embedding_idx ON {name}_chunks USING ivfflat (embedding vector_cosine_ops)"),
            format!("CREATE INDEX IF NOT EXISTS {name}_chunks_tsv_idx ON {name}_chunks USING gin (content_tsv)"),
            format!("CREATE INDEX IF NOT EXISTS {name}_chunks_symbol_type_idx ON {name}_chunks (symbol_type)"),
            format!("CREATE INDEX IF NOT EXISTS {name}_chunks_symbol_name_idx ON {name}_chunks (symbol_name)"),
            format!("CREATE INDEX IF NOT EXISTS {name}_chunks_language_idx ON {name}_chunks (language_id)"),
        ] {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }

        self.provision_cache_tables(&name).await?;
        self.provision_metadata_table().await?;

        Ok(())
    }

    async fn provision_cache_tables(&self, name: &str) -> CocoResult<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {name}_query_cache (
                query_hash TEXT NOT NULL,
                filter_sig TEXT NOT NULL,
                result_blob JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (query_hash, filter_sig)
            )"
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {name}_semantic_cache (
                id BIGSERIAL PRIMARY KEY,
                query_embedding VECTOR NOT NULL,
                filter_sig TEXT NOT NULL,
                result_blob JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn provision_metadata_table(&self) -> CocoResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS index_metadata (
                index_name TEXT PRIMARY KEY,
                canonical_path TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                last_updated_at TIMESTAMPTZ
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Register `(index_name, canonical_path)` in `index_metadata`.
    /// Returns a [`CocoError::Resolution`] if the name is already mapped to
    /// a different path (spec §4.8's collision handling).
    pub async fn register_index(&self, index_name: &str, canonical_path: &str) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        self.provision_metadata_table().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT canonical_path FROM index_metadata WHERE index_name = $1")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await?;

        match existing {
            Some(path) if path != canonical_path => Err(CocoError::Resolution {
                details: format!(
                    "index '{name}' is already registered for '{path}'; this request is for '{canonical_path}'. \
                     Set an explicit indexName in cocosearch.yaml or pass --index-name to disambiguate."
                ),
            }),
            Some(_) => Ok(()),
            None => {
                sqlx::query("INSERT INTO index_metadata (index_name, canonical_path) VALUES ($1, $2)")
                    .bind(&name)
                    .bind(canonical_path)
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }
        }
    }

    /// Look up a registered index's path-registry entry.
    pub async fn get_index_metadata(&self, index_name: &str) -> CocoResult<Option<PathRegistryEntry>> {
        let name = validate_identifier(index_name)?;
        let row = sqlx::query("SELECT canonical_path, created_at, last_updated_at FROM index_metadata WHERE index_name = $1")
            .bind(&name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r: PgRow| PathRegistryEntry {
            index_name: name.clone(),
            canonical_path: r.get::<String, _>("canonical_path").into(),
            git_root: None,
            created_at: r.get("created_at"),
            last_indexed_at: r.get("last_updated_at"),
        }))
    }

    /// List every registered index with its stats, for the `list_indexes` operation.
    pub async fn list_indexes(&self) -> CocoResult<Vec<(PathRegistryEntry, IndexStats)>> {
        let rows = sqlx::query("SELECT index_name, canonical_path, created_at, last_updated_at FROM index_metadata")
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let index_name: String = row.get("index_name");
            let entry = PathRegistryEntry {
                index_name: index_name.clone(),
                canonical_path: row.get::<String, _>("canonical_path").into(),
                git_root: None,
                created_at: row.get("created_at"),
                last_indexed_at: row.get("last_updated_at"),
            };
            let stats = self.stats(&index_name).await.unwrap_or_default();
            out.push((entry, stats));
        }
        Ok(out)
    }

    /// Bump `last_updated_at` for an index; called after a successful
    /// ingestion run completes.
    pub async fn touch_index(&self, index_name: &str) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        sqlx::query("UPDATE index_metadata SET last_updated_at = now() WHERE index_name = $1")
            .bind(&name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert or replace one chunk row, computing its `content_tsv` from
    /// the identifier/body split (spec §4.6).
    pub async fn upsert_chunk(&self, index_name: &str, chunk: &Chunk, weight_identifier: char, weight_body: char) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;

        let mut identifiers: Vec<&str> = chunk.hierarchy.iter().map(String::as_str).collect();
        if let Some(symbol) = chunk.symbol_name.as_deref() {
            identifiers.push(symbol);
        }
        let (ident_text, body_text) = crate::tokenize::build_tsvector_inputs(&identifiers, &chunk.content);

        let embedding_literal = chunk.embedding.as_ref().map(|v| vector_literal(v));
        let hierarchy_text = chunk.hierarchy.join(".");

        let sql = format!(
            "INSERT INTO {name}_chunks
                (filename, location, text, embedding, block_type, hierarchy, language_id,
                 symbol_type, symbol_name, symbol_signature, content_tsv)
             VALUES
                ($1, int4range($2, $3), $4, $5::vector, $6, $7, $8, $9, $10, $11,
                 setweight(to_tsvector('simple', $12), '{weight_identifier}') ||
                 setweight(to_tsvector('simple', $13), '{weight_body}'))
             ON CONFLICT (filename, location) DO UPDATE SET
                text = EXCLUDED.text,
                embedding = EXCLUDED.embedding,
                block_type = EXCLUDED.block_type,
                hierarchy = EXCLUDED.hierarchy,
                language_id = EXCLUDED.language_id,
                symbol_type = EXCLUDED.symbol_type,
                symbol_name = EXCLUDED.symbol_name,
                symbol_signature = EXCLUDED.symbol_signature,
                content_tsv = EXCLUDED.content_tsv"
        );

        #[allow(clippy::cast_possible_wrap)]
        sqlx::query(&sql)
            .bind(&chunk.filename)
            .bind(chunk.location.start as i32)
            .bind(chunk.location.end as i32)
            .bind(&chunk.content)
            .bind(embedding_literal)
            .bind(block_type_str(chunk.block_type))
            .bind(&hierarchy_text)
            .bind(chunk.language.id())
            .bind(chunk.symbol_type.map(block_type_str).unwrap_or_default())
            .bind(chunk.symbol_name.clone().unwrap_or_default())
            .bind(chunk.symbol_signature.clone().unwrap_or_default())
            .bind(&ident_text)
            .bind(&body_text)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Look up the last recorded parse outcome for `filename`, used to skip
    /// re-chunking/re-embedding a file whose content hash hasn't changed
    /// since the last run (spec §4.7's incremental reindex).
    pub async fn get_parse_result(&self, index_name: &str, filename: &str) -> CocoResult<Option<ParseResult>> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "SELECT filename, content_hash, status, error, symbol_count, chunk_count, indexed_at
             FROM {name}_parse_results WHERE filename = $1"
        );
        let row = sqlx::query(&sql).bind(filename).fetch_optional(&self.pool).await?;
        Ok(row.map(|r: PgRow| ParseResult {
            filename: r.get("filename"),
            content_hash: r.get("content_hash"),
            status: parse_status_from_str(&r.get::<String, _>("status")),
            error_message: r.get("error"),
            #[allow(clippy::cast_sign_loss)]
            symbol_count: r.get::<i64, _>("symbol_count") as usize,
            #[allow(clippy::cast_sign_loss)]
            chunk_count: r.get::<i64, _>("chunk_count") as usize,
            indexed_at: r.get("indexed_at"),
        }))
    }

    /// List every filename with a recorded parse result, for the orphan
    /// sweep's "surviving" set and for `index_stats`'s file enumeration.
    pub async fn list_known_files(&self, index_name: &str) -> CocoResult<Vec<String>> {
        let name = validate_identifier(index_name)?;
        let rows: Vec<(String,)> = sqlx::query_as(&format!("SELECT filename FROM {name}_parse_results"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(f,)| f).collect())
    }

    /// Record a file's parse outcome.
    pub async fn upsert_parse_result(&self, index_name: &str, result: &ParseResult) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "INSERT INTO {name}_parse_results
                (filename, content_hash, status, error, symbol_count, chunk_count, indexed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (filename) DO UPDATE SET
                content_hash = EXCLUDED.content_hash,
                status = EXCLUDED.status,
                error = EXCLUDED.error,
                symbol_count = EXCLUDED.symbol_count,
                chunk_count = EXCLUDED.chunk_count,
                indexed_at = EXCLUDED.indexed_at"
        );

        #[allow(clippy::cast_possible_wrap)]
        sqlx::query(&sql)
            .bind(&result.filename)
            .bind(&result.content_hash)
            .bind(parse_status_str(result.status))
            .bind(&result.error_message)
            .bind(result.symbol_count as i64)
            .bind(result.chunk_count as i64)
            .bind(result.indexed_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every chunk row for `filename` (used before rewriting a
    /// file's chunks during reindex, spec §4.7 step 6/7).
    pub async fn delete_chunks_for_file(&self, index_name: &str, filename: &str) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        sqlx::query(&format!("DELETE FROM {name}_chunks WHERE filename = $1")).bind(filename).execute(&self.pool).await?;
        Ok(())
    }

    /// Delete every chunk and parse-result row whose filename is not in
    /// `surviving_filenames` -- the post-run orphan sweep (spec §4.7,
    /// §5's ordering guarantee).
    pub async fn delete_orphaned_files(&self, index_name: &str, surviving_filenames: &[String]) -> CocoResult<u64> {
        let name = validate_identifier(index_name)?;
        let chunks_deleted = sqlx::query(&format!("DELETE FROM {name}_chunks WHERE NOT (filename = ANY($1))"))
            .bind(surviving_filenames)
            .execute(&self.pool)
            .await?
            .rows_affected();
        sqlx::query(&format!("DELETE FROM {name}_parse_results WHERE NOT (filename = ANY($1))"))
            .bind(surviving_filenames)
            .execute(&self.pool)
            .await?;
        Ok(chunks_deleted)
    }

    /// Cosine-ANN vector search, ordered nearest-first.
    pub async fn vector_search(
        &self,
        index_name: &str,
        query_vector: &[f32],
        limit: usize,
        filters: &Filters,
    ) -> CocoResult<Vec<(String, ByteRange, f32)>> {
        let name = validate_identifier(index_name)?;
        let (filter_sql, _) = filter_clause(filters);
        let sql = format!(
            "SELECT filename, lower(location) AS loc_start, upper(location) AS loc_end,
                    1 - (embedding <=> $1::vector) AS score
             FROM {name}_chunks
             WHERE embedding IS NOT NULL {filter_sql}
             ORDER BY embedding <=> $1::vector
             LIMIT $2"
        );

        let mut query = sqlx::query(&sql).bind(vector_literal(query_vector));
        #[allow(clippy::cast_possible_wrap)]
        {
            query = query.bind(limit as i64);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(row_to_match).collect())
    }

    /// `ts_rank_cd`-scored keyword search over `content_tsv`.
    pub async fn keyword_search(
        &self,
        index_name: &str,
        tsquery_text: &str,
        limit: usize,
        filters: &Filters,
    ) -> CocoResult<Vec<(String, ByteRange, f32)>> {
        let name = validate_identifier(index_name)?;
        let (filter_sql, _) = filter_clause(filters);
        let sql = format!(
            "SELECT filename, lower(location) AS loc_start, upper(location) AS loc_end,
                    ts_rank_cd(content_tsv, plainto_tsquery('simple', $1)) AS score
             FROM {name}_chunks
             WHERE content_tsv @@ plainto_tsquery('simple', $1) {filter_sql}
             ORDER BY score DESC
             LIMIT $2"
        );

        let mut query = sqlx::query(&sql).bind(tsquery_text);
        #[allow(clippy::cast_possible_wrap)]
        {
            query = query.bind(limit as i64);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(row_to_match).collect())
    }

    /// Materialise full chunk rows for a set of `(filename, location)` keys,
    /// for result hydration.
    pub async fn fetch_chunks(&self, index_name: &str, keys: &[(String, ByteRange)]) -> CocoResult<Vec<Chunk>> {
        let name = validate_identifier(index_name)?;
        let mut chunks = Vec::with_capacity(keys.len());
        for (filename, range) in keys {
            let sql = format!(
                "SELECT filename, lower(location) AS loc_start, upper(location) AS loc_end,
                        text, block_type, hierarchy, language_id, symbol_type, symbol_name, symbol_signature
                 FROM {name}_chunks WHERE filename = $1 AND location = int4range($2, $3)"
            );
            #[allow(clippy::cast_possible_wrap)]
            let row = sqlx::query(&sql)
                .bind(filename)
                .bind(range.start as i32)
                .bind(range.end as i32)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(row) = row {
                chunks.push(row_to_chunk(&row));
            }
        }
        Ok(chunks)
    }

    /// List every file whose last parse attempt ended in `Error`, with its
    /// diagnostic message, for `index_stats(include_failures: true)`.
    pub async fn list_parse_failures(&self, index_name: &str) -> CocoResult<Vec<ParseResult>> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "SELECT filename, content_hash, status, error, symbol_count, chunk_count, indexed_at
             FROM {name}_parse_results WHERE status = 'error'"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|r: PgRow| ParseResult {
                filename: r.get("filename"),
                content_hash: r.get("content_hash"),
                status: FileParseStatus::Error,
                error_message: r.get("error"),
                #[allow(clippy::cast_sign_loss)]
                symbol_count: r.get::<i64, _>("symbol_count") as usize,
                #[allow(clippy::cast_sign_loss)]
                chunk_count: r.get::<i64, _>("chunk_count") as usize,
                indexed_at: r.get("indexed_at"),
            })
            .collect())
    }

    /// Aggregate file/chunk counts, per-language parse health, and
    /// last-updated timestamp for `index_stats`.
    pub async fn stats(&self, index_name: &str) -> CocoResult<IndexStats> {
        let name = validate_identifier(index_name)?;

        let chunk_count: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM {name}_chunks")).fetch_one(&self.pool).await?;
        let symbol_count: i64 = sqlx::query_scalar(&format!(
            "SELECT count(*) FROM {name}_chunks WHERE symbol_type <> ''"
        ))
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!("SELECT language_id, status FROM {name}_parse_results")).fetch_all(&self.pool).await?;

        let mut by_language: std::collections::BTreeMap<String, LanguageStats> = std::collections::BTreeMap::new();
        let mut file_count = 0usize;
        let mut healthy = 0usize;
        for row in &rows {
            file_count += 1;
            let language_id: String = row.get("language_id");
            let status: String = row.get("status");
            let entry = by_language.entry(language_id).or_default();
            match status.as_str() {
                "ok" => {
                    entry.ok += 1;
                    healthy += 1;
                }
                "partial" => {
                    entry.partial += 1;
                    healthy += 1;
                }
                "error" => entry.error += 1,
                _ => entry.unsupported += 1,
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let parse_health_pct = if file_count == 0 { 100.0 } else { (healthy as f32 / file_count as f32) * 100.0 };

        let last_updated_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT last_updated_at FROM index_metadata WHERE index_name = $1")
                .bind(&name)
                .fetch_optional(&self.pool)
                .await?
                .flatten();

        Ok(IndexStats {
            file_count,
            #[allow(clippy::cast_sign_loss)]
            chunk_count: chunk_count as usize,
            #[allow(clippy::cast_sign_loss)]
            symbol_count: symbol_count as usize,
            parse_health_pct,
            by_language,
            last_indexed_at: last_updated_at,
        })
    }

    /// Drop every table for `index_name` and remove its metadata row.
    pub async fn clear_index(&self, index_name: &str) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        for suffix in ["chunks", "parse_results", "query_cache", "semantic_cache"] {
            sqlx::query(&format!("DROP TABLE IF EXISTS {name}_{suffix}")).execute(&self.pool).await?;
        }
        sqlx::query("DELETE FROM index_metadata WHERE index_name = $1").bind(&name).execute(&self.pool).await?;
        Ok(())
    }

    /// Exact-hash cache lookup.
    pub async fn cache_get_exact(&self, index_name: &str, query_hash: &str, filter_sig: &str) -> CocoResult<Option<serde_json::Value>> {
        let name = validate_identifier(index_name)?;
        let sql = format!("SELECT result_blob FROM {name}_query_cache WHERE query_hash = $1 AND filter_sig = $2");
        let row: Option<serde_json::Value> =
            sqlx::query_scalar(&sql).bind(query_hash).bind(filter_sig).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    /// Populate the exact-hash cache tier.
    pub async fn cache_put_exact(&self, index_name: &str, query_hash: &str, filter_sig: &str, result: &serde_json::Value) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "INSERT INTO {name}_query_cache (query_hash, filter_sig, result_blob) VALUES ($1, $2, $3)
             ON CONFLICT (query_hash, filter_sig) DO UPDATE SET result_blob = EXCLUDED.result_blob, created_at = now()"
        );
        sqlx::query(&sql).bind(query_hash).bind(filter_sig).bind(result).execute(&self.pool).await?;
        Ok(())
    }

    /// Semantic-cache probe: nearest cached query embedding above
    /// `similarity_threshold` within the same filter signature.
    pub async fn cache_get_semantic(
        &self,
        index_name: &str,
        query_embedding: &[f32],
        filter_sig: &str,
        similarity_threshold: f32,
    ) -> CocoResult<Option<serde_json::Value>> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "SELECT result_blob, 1 - (query_embedding <=> $1::vector) AS similarity
             FROM {name}_semantic_cache
             WHERE filter_sig = $2
             ORDER BY query_embedding <=> $1::vector
             LIMIT 1"
        );
        let row = sqlx::query(&sql).bind(vector_literal(query_embedding)).bind(filter_sig).fetch_optional(&self.pool).await?;
        Ok(row.and_then(|r: PgRow| {
            let similarity: f32 = r.get("similarity");
            (similarity >= similarity_threshold).then(|| r.get("result_blob"))
        }))
    }

    /// Populate the semantic-cache tier.
    pub async fn cache_put_semantic(
        &self,
        index_name: &str,
        query_embedding: &[f32],
        filter_sig: &str,
        result: &serde_json::Value,
    ) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        let sql = format!(
            "INSERT INTO {name}_semantic_cache (query_embedding, filter_sig, result_blob) VALUES ($1::vector, $2, $3)"
        );
        sqlx::query(&sql).bind(vector_literal(query_embedding)).bind(filter_sig).bind(result).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop all cache rows for an index -- called after a reindex run
    /// completes (spec §4.7's "invalidate all cache entries for this
    /// index") and by the TTL sweep in [`crate::search::cache`].
    pub async fn invalidate_cache(&self, index_name: &str) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        sqlx::query(&format!("TRUNCATE {name}_query_cache")).execute(&self.pool).await?;
        sqlx::query(&format!("TRUNCATE {name}_semantic_cache")).execute(&self.pool).await?;
        Ok(())
    }

    /// Garbage-collect cache rows older than `cutoff`, per index's
    /// `ttl_secs` configuration.
    pub async fn sweep_expired_cache(&self, index_name: &str, cutoff: DateTime<Utc>) -> CocoResult<()> {
        let name = validate_identifier(index_name)?;
        sqlx::query(&format!("DELETE FROM {name}_query_cache WHERE created_at < $1")).bind(cutoff).execute(&self.pool).await?;
        sqlx::query(&format!("DELETE FROM {name}_semantic_cache WHERE created_at < $1")).bind(cutoff).execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_match(row: PgRow) -> (String, ByteRange, f32) {
    let filename: String = row.get("filename");
    let start: i32 = row.get("loc_start");
    let end: i32 = row.get("loc_end");
    let score: f32 = row.get("score");
    #[allow(clippy::cast_sign_loss)]
    let range = ByteRange { start: start as usize, end: end as usize, start_line: 0, end_line: 0 };
    (filename, range, score)
}

fn row_to_chunk(row: &PgRow) -> Chunk {
    let start: i32 = row.get("loc_start");
    let end: i32 = row.get("loc_end");
    let block_type: String = row.get("block_type");
    let hierarchy: String = row.get("hierarchy");
    let language_id: String = row.get("language_id");
    let symbol_type: String = row.get("symbol_type");
    let symbol_name: String = row.get("symbol_name");
    let symbol_signature: String = row.get("symbol_signature");

    #[allow(clippy::cast_sign_loss)]
    let location = ByteRange { start: start as usize, end: end as usize, start_line: 0, end_line: 0 };

    Chunk {
        filename: row.get("filename"),
        location,
        content: row.get("text"),
        embedding: None,
        block_type: block_type_from_str(&block_type),
        hierarchy: hierarchy.split('.').filter(|s| !s.is_empty()).map(String::from).collect(),
        language: crate::types::Language::from_id(&language_id),
        symbol_type: (!symbol_type.is_empty()).then(|| block_type_from_str(&symbol_type)),
        symbol_name: (!symbol_name.is_empty()).then_some(symbol_name),
        symbol_signature: (!symbol_signature.is_empty()).then_some(symbol_signature),
    }
}

/// Build a `[v1,v2,...]` pgvector text literal, cast with `::vector` at
/// every call site.
fn vector_literal(v: &[f32]) -> String {
    let mut s = String::with_capacity(v.len() * 8 + 2);
    s.push('[');
    for (i, x) in v.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        s.push_str(&x.to_string());
    }
    s.push(']');
    s
}

fn block_type_str(bt: BlockType) -> String {
    match bt {
        BlockType::Function => "function",
        BlockType::Method => "method",
        BlockType::Class => "class",
        BlockType::Interface => "interface",
        BlockType::Struct => "struct",
        BlockType::Trait => "trait",
        BlockType::Enum => "enum",
        BlockType::Module => "module",
        BlockType::Fragment => "fragment",
    }
    .to_string()
}

fn block_type_from_str(s: &str) -> BlockType {
    match s {
        "function" => BlockType::Function,
        "method" => BlockType::Method,
        "class" => BlockType::Class,
        "interface" => BlockType::Interface,
        "struct" => BlockType::Struct,
        "trait" => BlockType::Trait,
        "enum" => BlockType::Enum,
        "module" => BlockType::Module,
        _ => BlockType::Fragment,
    }
}

fn parse_status_str(status: FileParseStatus) -> &'static str {
    match status {
        FileParseStatus::Ok => "ok",
        FileParseStatus::Partial => "partial",
        FileParseStatus::Error => "error",
        FileParseStatus::Unsupported => "unsupported",
    }
}

fn parse_status_from_str(s: &str) -> FileParseStatus {
    match s {
        "ok" => FileParseStatus::Ok,
        "partial" => FileParseStatus::Partial,
        "error" => FileParseStatus::Error,
        _ => FileParseStatus::Unsupported,
    }
}

/// Translate structured [`Filters`] into a `AND ...` SQL fragment. Values
/// are inlined after being checked against a strict allow-list
/// (alphanumeric/underscore/dot/slash/asterisk) since they can't be bound
/// as parameters alongside a dynamically-built table name without
/// reshuffling every placeholder index; this is acceptable because the
/// allow-list rejects anything that could break out of a string literal.
fn filter_clause(filters: &Filters) -> (String, ()) {
    let mut clauses = Vec::new();
    if let Some(language) = &filters.language {
        if is_safe_value(language) {
            clauses.push(format!("AND language_id = '{language}'"));
        }
    }
    if let Some(block_type) = filters.block_type {
        clauses.push(format!("AND block_type = '{}'", block_type_str(block_type)));
    }
    if let Some(symbol_name) = &filters.symbol_name {
        if is_safe_value(symbol_name) {
            clauses.push(format!("AND symbol_name = '{symbol_name}'"));
        }
    }
    if let Some(glob) = &filters.path_glob {
        if is_safe_value(glob) {
            let like = glob.replace('*', "%").replace('?', "_");
            clauses.push(format!("AND filename LIKE '{like}'"));
        }
    }
    (clauses.join(" "), ())
}

fn is_safe_value(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '/' | '-' | '*' | '?'))
}

/// Validate and lower-case an index name before it's interpolated into a
/// table-name format string. Only `[a-z0-9_]` is allowed -- this is the
/// guard that makes the raw-SQL-identifier pattern in this module safe.
fn validate_identifier(index_name: &str) -> CocoResult<String> {
    let lowered = index_name.to_lowercase();
    let valid = !lowered.is_empty()
        && lowered.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && lowered.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(lowered)
    } else {
        Err(CocoError::Query { details: format!("invalid index name '{index_name}': must match [a-z_][a-z0-9_]*") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsafe_index_names() {
        assert!(validate_identifier("my-index; DROP TABLE").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("9leadingdigit").is_err());
    }

    #[test]
    fn accepts_normal_index_names() {
        assert_eq!(validate_identifier("MyProject").unwrap(), "myproject");
        assert!(validate_identifier("my_project_2").is_ok());
    }

    #[test]
    fn vector_literal_format() {
        assert_eq!(vector_literal(&[0.1, 0.2, -1.0]), "[0.1,0.2,-1]");
    }

    #[test]
    fn filter_clause_rejects_injection_attempt() {
        let filters = Filters { language: Some("rust'; DROP TABLE x; --".into()), ..Filters::default() };
        let (clause, ()) = filter_clause(&filters);
        assert!(clause.is_empty());
    }
}
