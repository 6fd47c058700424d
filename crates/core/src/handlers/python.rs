use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct PythonHandler;

const SYMBOL_QUERY: &str = r#"
(function_definition
  name: (identifier) @name) @definition.function

(class_definition
  name: (identifier) @name) @definition.class
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "python",
    separators_regex: &[r"(?m)^class \w", r"(?m)^(?:async )?def \w", r"\n\n", r"\n"],
};

impl LanguageHandler for PythonHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn language(&self) -> Language {
        Language::Python
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn symbol_query(&self) -> &'static str {
        SYMBOL_QUERY
    }

    fn separator_spec(&self) -> CustomLanguageSpec {
        SEPARATOR_SPEC
    }

    fn extract_metadata(&self, text: &str) -> ExtractedMetadata {
        let Some(first_line) = text.lines().find(|l| !l.trim().is_empty()) else {
            return ExtractedMetadata::default();
        };
        let trimmed = first_line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("class ") {
            let name = rest.split(|c: char| c == '(' || c == ':').next().unwrap_or(rest).trim();
            return ExtractedMetadata { block_type: "class".into(), hierarchy: name.into() };
        }
        let def_rest = trimmed.strip_prefix("def ").or_else(|| trimmed.strip_prefix("async def "));
        if let Some(rest) = def_rest {
            let name = rest.split('(').next().unwrap_or(rest).trim();
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
        let meta = PythonHandler.extract_metadata("def get_user_by_id(uid):\n    pass\n");
        assert_eq!(meta.block_type, "function");
        assert_eq!(meta.hierarchy, "get_user_by_id");
    }

    #[test]
    fn extracts_class_metadata() {
        let meta = PythonHandler.extract_metadata("class UserService:\n    pass\n");
        assert_eq!(meta.block_type, "class");
        assert_eq!(meta.hierarchy, "UserService");
    }

    #[test]
    fn plain_text_has_empty_metadata() {
        let meta = PythonHandler.extract_metadata("x = 1\ny = 2\n");
        assert_eq!(meta.block_type, "");
        assert_eq!(meta.hierarchy, "");
    }
}
