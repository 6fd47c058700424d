use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct RustHandler;

const SYMBOL_QUERY: &str = r#"
(function_item
  name: (identifier) @name) @definition.function

(struct_item
  name: (type_identifier) @name) @definition.struct

(enum_item
  name: (type_identifier) @name) @definition.enum

(trait_item
  name: (type_identifier) @name) @definition.trait

(impl_item
  type: (type_identifier) @name) @definition.class

(mod_item
  name: (identifier) @name) @definition.module
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "rust",
    separators_regex: &[
        r"(?m)^(?:pub(?:\([\w:]+\))? )?(?:async )?fn \w",
        r"(?m)^(?:pub(?:\([\w:]+\))? )?(?:struct|enum|trait|impl) \w",
        r"\n\n",
        r"\n",
    ],
};

impl LanguageHandler for RustHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn language(&self) -> Language {
        Language::Rust
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn symbol_query(&self) -> &'static str {
        SYMBOL_QUERY
    }

    fn qualifier_separator(&self) -> &'static str {
        "::"
    }

    fn separator_spec(&self) -> CustomLanguageSpec {
        SEPARATOR_SPEC
    }

    fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
            return ExtractedMetadata::default();
        };
        let trimmed = first_line.trim_start().trim_start_matches("pub(crate) ").trim_start_matches("pub ");
        for (prefix, kind) in [("struct ", "struct"), ("enum ", "enum"), ("trait ", "trait"), ("impl ", "impl")] {
            if let Some(rest) = trimmed.strip_prefix(prefix) {
                let name = rest
                    .split(|c: char| c == '<' || c == '{' || c == ':' || c.is_whitespace())
                    .find(|s| !s.is_empty())
                    .unwrap_or(rest);
                return ExtractedMetadata { block_type: kind.into(), hierarchy: name.into() };
            }
        }
        let fn_rest = trimmed.strip_prefix("fn ").or_else(|| trimmed.strip_prefix("async fn "));
        if let Some(rest) = fn_rest {
            let name = rest.split(|c: char| c == '(' || c == '<').next().unwrap_or(rest).trim();
            return ExtractedMetadata { block_type: "function".into(), hierarchy: name.into() };
        }
        ExtractedMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_metadata() {
        let meta = RustHandler.extract_metadata("pub fn new(x: u32) -> Self {\n}\n");
        assert_eq!(meta.block_type, "function");
        assert_eq!(meta.hierarchy, "new");
    }

    #[test]
    fn extracts_struct_metadata() {
        let meta = RustHandler.extract_metadata("pub struct Config {\n    pub x: u32,\n}\n");
        assert_eq!(meta.block_type, "struct");
        assert_eq!(meta.hierarchy, "Config");
    }

    #[test]
    fn qualifier_separator_is_double_colon() {
        assert_eq!(RustHandler.qualifier_separator(), "::");
    }
}
