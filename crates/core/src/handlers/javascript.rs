use super::typescript::extract_js_family_metadata;
use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct JavaScriptHandler;

const SYMBOL_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @definition.function

(method_definition
  name: (property_identifier) @name) @definition.method

(class_declaration
  name: (identifier) @name) @definition.class
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "javascript",
    separators_regex: &[
        r"(?m)^export (?:default )?class \w",
        r"(?m)^(?:export )?(?:default )?(?:async )?function \w",
        r"\n\n",
        r"\n",
    ],
};

impl LanguageHandler for JavaScriptHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs"]
    }

    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_metadata() {
        let meta = JavaScriptHandler.extract_metadata("function handleClick(event) {\n}\n");
        assert_eq!(meta.block_type, "function");
        assert_eq!(meta.hierarchy, "handleClick");
    }

    #[test]
    fn extension_variants_covered() {
        assert_eq!(JavaScriptHandler.extensions(), &["js", "jsx", "mjs", "cjs"]);
    }
}
