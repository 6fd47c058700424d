use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct TypeScriptHandler;

const SYMBOL_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @definition.function

(method_definition
  name: (property_identifier) @name) @definition.method

(class_declaration
  name: (type_identifier) @name) @definition.class

(interface_declaration
  name: (type_identifier) @name) @definition.interface
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "typescript",
    separators_regex: &[
        r"(?m)^export (?:default )?(?:abstract )?class \w",
        r"(?m)^(?:export )?(?:default )?(?:async )?function \w",
        r"\n\n",
        r"\n",
    ],
};

impl LanguageHandler for TypeScriptHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn symbol_query(&self) -> &'static str {
        SYMBOL_QUERY
    }

    fn separator_spec(&self) -> CustomLanguageSpec {
        SEPARATOR_SPEC
    }

    fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        extract_js_family_metadata(text)
    }
}

/// Shared by TypeScript and JavaScript: both chunk on the same rough
/// `class`/`function` vocabulary, just with different tree-sitter grammars.
pub(super) fn extract_js_family_metadata(text: &str) -> ExtractedMetadata {
    let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return ExtractedMetadata::default();
    };
    let trimmed = first_line.trim_start().trim_start_matches("export default ").trim_start_matches("export ");
    if let Some(rest) = trimmed.strip_prefix("abstract class ").or_else(|| trimmed.strip_prefix("class ")) {
        let name = rest.split(|c: char| c == '{' || c.is_whitespace()).next().unwrap_or(rest);
        return ExtractedMetadata { block_type: "class".into(), hierarchy: name.into() };
    }
    let fn_rest = trimmed.strip_prefix("async function ").or_else(|| trimmed.strip_prefix("function "));
    if let Some(rest) = fn_rest {
        let name = rest.split(|c: char| c == '(' || c == '<').next().unwrap_or(rest).trim();
        return ExtractedMetadata { block_type: "function".into(), hierarchy: name.into() };
    }
    ExtractedMetadata::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_exported_function() {
        let meta = TypeScriptHandler.extract_metadata("export function getUser(id: string) {\n}\n");
        assert_eq!(meta.block_type, "function");
        assert_eq!(meta.hierarchy, "getUser");
    }

    #[test]
    fn extracts_exported_class() {
        let meta = TypeScriptHandler.extract_metadata("export class UserService {\n}\n");
        assert_eq!(meta.block_type, "class");
        assert_eq!(meta.hierarchy, "UserService");
    }
}
