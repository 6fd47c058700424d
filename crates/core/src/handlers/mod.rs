//! Two-tier language/grammar handler registry.
//!
//! Tier one dispatches by file extension -- the common case, and the one
//! every file with a recognised suffix hits. Tier two is a small set of
//! grammar handlers that are consulted first and match on a (path, content)
//! pair rather than an extension; they exist so files that share an
//! extension with a generic language but need different chunking (a GitHub
//! Actions workflow is still `.yml`, but its separators and metadata differ
//! from an arbitrary YAML file) get their own treatment. A grammar handler
//! names a `base_language` so symbol extraction still runs the right
//! tree-sitter grammar even though chunking took a different path.
//!
//! The registry is a process-wide singleton behind a [`OnceLock`], built
//! once and shared by every worker thread -- it and the tree-sitter grammars
//! it holds are immutable after startup (spec §5, §9 "Global state").

mod go;
mod java;
mod javascript;
mod python;
mod rust;
mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::types::{BlockType, Language};

/// An ordered list of regex patterns, coarsest (block-level) to finest
/// (line-level), driving the recursive chunker for one language. Patterns
/// must be expressible without lookaround (spec §4.3) since the chunker
/// uses `regex::Regex`, which doesn't support it.
#[derive(Debug, Clone, Copy)]
pub struct CustomLanguageSpec {
    /// Human-readable language name, used only for diagnostics.
    pub language_name: &'static str,
    /// Separator regexes, coarsest first. The chunker falls back to
    /// whitespace/newline splitting once this list is exhausted.
    pub separators_regex: &'static [&'static str],
}

/// Metadata a handler derives from a chunk's text, independent of symbol
/// extraction. Non-matching fields default to empty strings, never `None`,
/// matching the "empty metadata" contract of the plain-text fallback.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    /// Structural kind of the chunk (`"function"`, `"block"`, ...).
    pub block_type: String,
    /// Dotted enclosing-scope path, outermost first.
    pub hierarchy: String,
}

/// A registered language's tree-sitter grammar, symbol query, and chunking
/// separators, matched by file extension.
pub trait LanguageHandler: Send + Sync {
    /// File extensions (without the dot) this handler claims, e.g. `["py", "pyi"]`.
    fn extensions(&self) -> &'static [&'static str];

    /// The [`Language`] this handler produces chunks and symbols for.
    fn language(&self) -> Language;

    /// The tree-sitter grammar to parse source with.
    fn ts_language(&self) -> tree_sitter::Language;

    /// A tree-sitter query with `@definition.<kind>` / `@name` captures,
    /// run once per file to extract symbols. `<kind>` must be one of
    /// `function`, `method`, `class`, `interface`, `struct`, `trait`,
    /// `enum`, `module`.
    fn symbol_query(&self) -> &'static str;

    /// Separator used when joining an enclosing scope's name with a
    /// nested definition's name to build a qualified name
    /// (`"."` for most languages, `"::"` for Rust).
    fn qualifier_separator(&self) -> &'static str {
        "."
    }

    /// The recursive chunker's separator spec for this language.
    fn separator_spec(&self) -> CustomLanguageSpec;

    /// Derive block-type/hierarchy metadata for one chunk of text.
    fn extract_metadata(&self, text: &str) -> ExtractedMetadata;
}

/// A handler that claims files by sniffing their path or leading bytes
/// rather than their extension -- used for extension-less scripts
/// (`#!/usr/bin/env python3`) or a generic extension that needs different
/// treatment for a specific kind of file (a path glob plus a content
/// marker, per spec §4.3).
pub trait GrammarHandler: Send + Sync {
    /// Whether this handler claims `path`/`content`.
    fn matches(&self, path: &Path, content: &[u8]) -> bool;

    /// The language symbol extraction should run under if `matches` returns
    /// true; chunking still uses this handler's own separator spec.
    fn base_language(&self) -> Language;

    /// The recursive chunker's separator spec for files this grammar claims.
    fn separator_spec(&self) -> CustomLanguageSpec;

    /// Derive block-type/hierarchy metadata for one chunk of text.
    fn extract_metadata(&self, text: &str) -> ExtractedMetadata;
}

struct ShebangHandler {
    marker: &'static str,
    language: Language,
}

impl GrammarHandler for ShebangHandler {
    fn matches(&self, path: &Path, content: &[u8]) -> bool {
        if path.extension().is_some() {
            return false;
        }
        let Ok(first_line) = std::str::from_utf8(&content[..content.len().min(128)]) else {
            return false;
        };
        first_line.starts_with("#!") && first_line.contains(self.marker)
    }

    fn base_language(&self) -> Language {
        self.language
    }

    fn separator_spec(&self) -> CustomLanguageSpec {
        Registry::global()
            .handler_for(self.language)
            .map_or(PLAIN_TEXT_SPEC, |h| h.separator_spec())
    }

    fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        Registry::global()
            .handler_for(self.language)
            .map_or_else(ExtractedMetadata::default, |h| h.extract_metadata(text))
    }
}

/// A GitHub Actions workflow manifest is YAML (no dedicated language
/// handler here, so it would otherwise fall back to plain text), but its
/// `jobs:`/`steps:` structure chunks more usefully at the step boundary
/// than at arbitrary indentation changes -- the canonical example spec §4.3
/// gives for "grammars get their own chunking even though the extension is
/// shared with a generic language".
struct GithubActionsHandler;

const GITHUB_ACTIONS_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "github-actions",
    separators_regex: &[r"(?m)^  [a-zA-Z0-9_-]+:\n", r"(?m)^    - name:", r"\n\n", r"\n"],
};

impl GrammarHandler for GithubActionsHandler {
    fn matches(&self, path: &Path, content: &[u8]) -> bool {
        let is_workflow_path = path
            .to_str()
            .is_some_and(|p| p.contains(".github/workflows/") && (p.ends_with(".yml") || p.ends_with(".yaml")));
        if !is_workflow_path {
            return false;
        }
        let Ok(text) = std::str::from_utf8(content) else { return false };
        text.contains("\non:") || text.starts_with("on:") || text.contains("\njobs:") || text.contains("runs-on:")
    }

    fn base_language(&self) -> Language {
        Language::PlainText
    }

    fn separator_spec(&self) -> CustomLanguageSpec {
        GITHUB_ACTIONS_SPEC
    }

    fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        let hierarchy = text
            .lines()
            .find(|l| l.trim_start().starts_with("name:"))
            .map(|l| l.trim_start_matches("name:").trim().trim_matches('"').to_string())
            .unwrap_or_default();
        ExtractedMetadata { block_type: "workflow_step".into(), hierarchy }
    }
}

const PLAIN_TEXT_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "plaintext",
    separators_regex: &[r"\n\n", r"\n"],
};

/// The process-wide handler registry.
pub struct Registry {
    by_extension: HashMap<&'static str, Box<dyn LanguageHandler>>,
    grammar_handlers: Vec<Box<dyn GrammarHandler>>,
}

/// What the registry resolved a file to: which separator spec and metadata
/// extractor chunking should use, and which language (if any) symbol
/// extraction should run under.
pub enum Resolution<'a> {
    /// A grammar handler claimed this file; `symbol_language` is the
    /// grammar's declared base language (possibly [`Language::PlainText`]).
    Grammar { handler: &'a dyn GrammarHandler, symbol_language: Language },
    /// The extension map claimed this file.
    Language(&'a dyn LanguageHandler),
    /// Nothing claimed it; plain-text fallback, empty metadata.
    PlainText,
}

impl Resolution<'_> {
    /// The language symbol extraction (and `chunks.language_id`) should use.
    #[must_use]
    pub fn language(&self) -> Language {
        match self {
            Resolution::Grammar { symbol_language, .. } => *symbol_language,
            Resolution::Language(h) => h.language(),
            Resolution::PlainText => Language::PlainText,
        }
    }

    /// The chunker's separator spec for this file.
    #[must_use]
    pub fn separator_spec(&self) -> CustomLanguageSpec {
        match self {
            Resolution::Grammar { handler, .. } => handler.separator_spec(),
            Resolution::Language(h) => h.separator_spec(),
            Resolution::PlainText => PLAIN_TEXT_SPEC,
        }
    }

    /// Derive metadata for one chunk's text via whichever handler matched.
    #[must_use]
    pub fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        match self {
            Resolution::Grammar { handler, .. } => handler.extract_metadata(text),
            Resolution::Language(h) => h.extract_metadata(text),
            Resolution::PlainText => ExtractedMetadata::default(),
        }
    }
}

impl Registry {
    fn build() -> Self {
        let language_handlers: Vec<Box<dyn LanguageHandler>> = vec![
            Box::new(python::PythonHandler),
            Box::new(rust::RustHandler),
            Box::new(typescript::TypeScriptHandler),
            Box::new(javascript::JavaScriptHandler),
            Box::new(go::GoHandler),
            Box::new(java::JavaHandler),
        ];

        let mut by_extension: HashMap<&'static str, Box<dyn LanguageHandler>> = HashMap::new();
        for handler in language_handlers {
            register_handler(&mut by_extension, handler);
        }

        let grammar_handlers: Vec<Box<dyn GrammarHandler>> = vec![
            Box::new(GithubActionsHandler),
            Box::new(ShebangHandler { marker: "python", language: Language::Python }),
            Box::new(ShebangHandler { marker: "node", language: Language::JavaScript }),
        ];

        Self { by_extension, grammar_handlers }
    }

    /// The global registry, built on first access. Extension conflicts
    /// between language handlers would be a startup-abort condition per
    /// spec §4.3; this registration order is fixed and conflict-free so
    /// none can arise here, but [`register_handler`] still logs if a future
    /// addition collides rather than silently dropping one.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::build)
    }

    /// Resolve which handler `path`/`content` should go through: grammar
    /// handlers first (in registration order), then the extension map,
    /// then [`Resolution::PlainText`].
    #[must_use]
    pub fn resolve(&self, path: &Path, content: &[u8]) -> Resolution<'_> {
        for handler in &self.grammar_handlers {
            if handler.matches(path, content) {
                return Resolution::Grammar { handler: handler.as_ref(), symbol_language: handler.base_language() };
            }
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match self.by_extension.get(ext) {
            Some(h) => Resolution::Language(h.as_ref()),
            None => Resolution::PlainText,
        }
    }

    /// Resolve which language `path` should be parsed as; a thin
    /// convenience over [`Registry::resolve`] for callers that only need
    /// the language, not the full chunking resolution.
    #[must_use]
    pub fn resolve_language(&self, path: &Path, content: &[u8]) -> Language {
        self.resolve(path, content).language()
    }

    /// Look up the language handler for a given language, if registered.
    #[must_use]
    pub fn handler_for(&self, language: Language) -> Option<&dyn LanguageHandler> {
        self.by_extension.values().find(|h| h.language() == language).map(std::convert::AsRef::as_ref)
    }
}

fn register_handler(map: &mut HashMap<&'static str, Box<dyn LanguageHandler>>, handler: Box<dyn LanguageHandler>) {
    let extensions = handler.extensions();
    let Some((first, rest)) = extensions.split_first() else { return };
    map.insert(first, handler);
    for &ext in rest {
        // `Box<dyn LanguageHandler>` isn't `Clone`; every concrete handler
        // in this registry is a zero-sized unit struct, so constructing
        // another instance for a second extension is free.
        if let Some(again) = clone_unit_handler(map.get(first)) {
            if map.contains_key(ext) {
                tracing::warn!(extension = ext, "extension already claimed by another language handler; keeping the first registration");
                continue;
            }
            map.insert(ext, again);
        }
    }
}

fn clone_unit_handler(handler: Option<&Box<dyn LanguageHandler>>) -> Option<Box<dyn LanguageHandler>> {
    let handler = handler?;
    match handler.language() {
        Language::Python => Some(Box::new(python::PythonHandler)),
        Language::Rust => Some(Box::new(rust::RustHandler)),
        Language::TypeScript => Some(Box::new(typescript::TypeScriptHandler)),
        Language::JavaScript => Some(Box::new(javascript::JavaScriptHandler)),
        Language::Go => Some(Box::new(go::GoHandler)),
        Language::Java => Some(Box::new(java::JavaHandler)),
        Language::PlainText => None,
    }
}

/// Map a tree-sitter query capture name (`"definition.function"`) to a
/// [`BlockType`].
#[must_use]
pub fn block_type_from_capture(capture: &str) -> Option<BlockType> {
    match capture.strip_prefix("definition.")? {
        "function" => Some(BlockType::Function),
        "method" => Some(BlockType::Method),
        "class" => Some(BlockType::Class),
        "interface" => Some(BlockType::Interface),
        "struct" => Some(BlockType::Struct),
        "trait" => Some(BlockType::Trait),
        "enum" => Some(BlockType::Enum),
        "module" => Some(BlockType::Module),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_extension() {
        let registry = Registry::global();
        assert_eq!(registry.resolve_language(Path::new("main.rs"), b""), Language::Rust);
        assert_eq!(registry.resolve_language(Path::new("app.py"), b""), Language::Python);
        assert_eq!(registry.resolve_language(Path::new("readme.txt"), b""), Language::PlainText);
    }

    #[test]
    fn resolves_shebang_without_extension() {
        let registry = Registry::global();
        let content = b"#!/usr/bin/env python3\nprint('hi')\n";
        assert_eq!(registry.resolve_language(Path::new("script"), content), Language::Python);
    }

    #[test]
    fn extension_variants_share_a_language() {
        let registry = Registry::global();
        assert_eq!(registry.resolve_language(Path::new("a.ts"), b""), Language::TypeScript);
        assert_eq!(registry.resolve_language(Path::new("a.tsx"), b""), Language::TypeScript);
        assert_eq!(registry.resolve_language(Path::new("a.jsx"), b""), Language::JavaScript);
    }

    #[test]
    fn github_actions_grammar_overrides_plaintext_yaml() {
        let registry = Registry::global();
        let path = Path::new(".github/workflows/ci.yml");
        let content = b"name: CI\non:\n  push:\njobs:\n  build:\n    runs-on: ubuntu-latest\n";
        let resolution = registry.resolve(path, content);
        assert!(matches!(resolution, Resolution::Grammar { .. }));
        assert_eq!(resolution.extract_metadata(std::str::from_utf8(content).unwrap()).hierarchy, "CI");
    }

    #[test]
    fn plain_yaml_outside_workflows_stays_plaintext() {
        let registry = Registry::global();
        let path = Path::new("config/app.yml");
        let content = b"on: true\njobs: none\n";
        assert!(matches!(registry.resolve(path, content), Resolution::PlainText));
    }
}
