//! Project resolution: turning "what am I indexing, and under what name"
//! into a canonical path and a stable index name, and guarding against two
//! different projects colliding on the same name.
//!
//! Root discovery tries, in order: an explicit root passed by the caller
//! (e.g. an MCP client's `roots/list`), walking upward from the current
//! directory for a `.git` entry, the `COCOSEARCH_PROJECT_PATH` environment
//! variable, and finally the current working directory itself.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CocoError, CocoResult};
use crate::storage::Storage;
use crate::types::PathRegistryEntry;

/// Where a resolved project root came from, surfaced for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSource {
    /// Supplied directly by the caller (MCP `roots/list`, or an explicit path argument).
    Explicit,
    /// Found by walking upward from the current directory looking for `.git`.
    GitRootWalk,
    /// `COCOSEARCH_PROJECT_PATH` environment variable.
    EnvOverride,
    /// Fell back to the current working directory.
    Cwd,
}

/// A resolved project: its canonical root, the index name it should use,
/// and where the name came from.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    /// Symlink-resolved absolute project root.
    pub canonical_path: PathBuf,
    /// `.git` root discovered while walking upward from `canonical_path`, if any.
    pub git_root: Option<PathBuf>,
    /// Final index name this project should use.
    pub index_name: String,
    /// Which discovery path found the root.
    pub root_source: RootSource,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectIdentityFile {
    #[serde(rename = "indexName")]
    index_name: Option<String>,
}

/// Find the project root to index, given an optional explicit path (MCP
/// Roots or a CLI argument) and whether the caller asked to walk upward
/// from the current directory for a `.git` root (`--project-from-cwd`).
pub fn discover_root(explicit: Option<&Path>, project_from_cwd: bool) -> CocoResult<(PathBuf, RootSource)> {
    if let Some(path) = explicit {
        return Ok((canonicalize(path)?, RootSource::Explicit));
    }

    if project_from_cwd {
        let cwd = std::env::current_dir().map_err(CocoError::Io)?;
        if let Some(git_root) = walk_up_for_git_root(&cwd) {
            return Ok((canonicalize(&git_root)?, RootSource::GitRootWalk));
        }
    }

    if let Ok(path) = std::env::var("COCOSEARCH_PROJECT_PATH") {
        return Ok((canonicalize(Path::new(&path))?, RootSource::EnvOverride));
    }

    let cwd = std::env::current_dir().map_err(CocoError::Io)?;
    Ok((canonicalize(&cwd)?, RootSource::Cwd))
}

/// Resolve the index name for `canonical_path`: `cocosearch.yaml`'s
/// `indexName` takes priority, then the `.git` root's directory basename,
/// then `canonical_path`'s own basename. Falls back to a content hash of
/// the path if neither yields a usable name (e.g. the root is `/`).
#[must_use]
pub fn resolve_index_name(canonical_path: &Path, git_root: Option<&Path>) -> String {
    if let Some(name) = read_configured_index_name(canonical_path) {
        return sanitize(&name);
    }

    let basename_source = git_root.unwrap_or(canonical_path);
    match basename_source.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => sanitize(name),
        _ => {
            let hash = crate::config::Config::defaults(canonical_path).repo_hash();
            format!("project_{hash}")
        }
    }
}

fn read_configured_index_name(canonical_path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(canonical_path.join("cocosearch.yaml")).ok()?;
    let parsed: ProjectIdentityFile = serde_yaml::from_str(&contents).ok()?;
    parsed.index_name.filter(|n| !n.trim().is_empty())
}

/// Lower-case and replace anything outside `[a-z0-9_]` with `_`, collapsing
/// runs, so the name is always safe to use as a Postgres table-name prefix
/// (see [`crate::storage`]'s identifier validation).
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() || !trimmed.chars().next().is_some_and(|c| c.is_alphabetic()) {
        format!("p_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

fn walk_up_for_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

fn canonicalize(path: &Path) -> CocoResult<PathBuf> {
    std::fs::canonicalize(path).map_err(|err| CocoError::Resolution {
        details: format!("could not canonicalize project path {}: {err}", path.display()),
    })
}

/// Resolve a project end-to-end: discover the root, compute its index name,
/// and register it with storage, surfacing a collision as
/// [`CocoError::Resolution`] rather than silently overwriting a different
/// project's index.
pub async fn resolve(
    storage: &Storage,
    explicit: Option<&Path>,
    project_from_cwd: bool,
    index_name_override: Option<&str>,
) -> CocoResult<ResolvedProject> {
    let (canonical_path, root_source) = discover_root(explicit, project_from_cwd)?;
    let git_root = walk_up_for_git_root(&canonical_path);

    let index_name = match index_name_override {
        Some(name) => sanitize(name),
        None => resolve_index_name(&canonical_path, git_root.as_deref()),
    };

    storage.register_index(&index_name, &canonical_path.to_string_lossy()).await?;

    Ok(ResolvedProject { canonical_path, git_root, index_name, root_source })
}

/// Fetch the registry entry for an already-resolved index, used by
/// `list_indexes`/`index_stats` to report staleness.
pub async fn lookup(storage: &Storage, index_name: &str) -> CocoResult<PathRegistryEntry> {
    storage
        .get_index_metadata(index_name)
        .await?
        .ok_or_else(|| CocoError::NotFound { entity: format!("index '{index_name}'") })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_lowercases_and_collapses_separators() {
        assert_eq!(sanitize("My Cool--Project"), "my_cool_project");
    }

    #[test]
    fn sanitize_prefixes_names_starting_with_digit() {
        assert_eq!(sanitize("9lives"), "p_9lives");
    }

    #[test]
    fn resolve_index_name_uses_directory_basename_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("my_repo");
        std::fs::create_dir(&project).unwrap();
        assert_eq!(resolve_index_name(&project, None), "my_repo");
    }

    #[test]
    fn resolve_index_name_prefers_configured_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cocosearch.yaml"), "indexName: custom_name\n").unwrap();
        assert_eq!(resolve_index_name(dir.path(), None), "custom_name");
    }

    #[test]
    fn walk_up_for_git_root_finds_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(walk_up_for_git_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn walk_up_for_git_root_returns_none_without_git() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(walk_up_for_git_root(dir.path()), None);
    }
}
