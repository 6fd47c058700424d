use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct JavaHandler;

const SYMBOL_QUERY: &str = r#"
(method_declaration
  name: (identifier) @name) @definition.method

(class_declaration
  name: (identifier) @name) @definition.class

(interface_declaration
  name: (identifier) @name) @definition.interface

(enum_declaration
  name: (identifier) @name) @definition.enum
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "java",
    separators_regex: &[
        r"(?m)^\s*(?:public|private|protected)?\s*(?:static\s+)?(?:final\s+)?(?:class|interface|enum) \w",
        r"(?m)^\s*(?:public|private|protected)\s+.*\(.*\)\s*\{?\s*$",
        r"\n\n",
        r"\n",
    ],
};

impl LanguageHandler for JavaHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn language(&self) -> Language {
        Language::Java
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
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
        let trimmed = first_line.trim();
        for (kind, marker) in [("class", "class "), ("interface", "interface "), ("enum", "enum ")] {
            if let Some(idx) = trimmed.find(marker) {
                let rest = &trimmed[idx + marker.len()..];
                let name = rest
                    .split(|c: char| c == '<' || c == '{' || c.is_whitespace())
                    .find(|s| !s.is_empty())
                    .unwrap_or(rest);
                return ExtractedMetadata { block_type: kind.into(), hierarchy: name.into() };
            }
        }
        if trimmed.contains('(') && trimmed.ends_with(['{', ')'].as_slice()) {
            if let Some(before_paren) = trimmed.split('(').next() {
                let name = before_paren.split_whitespace().last().unwrap_or("").trim();
                if !name.is_empty() {
                    return ExtractedMetadata { block_type: "method".into(), hierarchy: name.into() };
                }
            }
        }
        ExtractedMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_metadata() {
        let meta = JavaHandler.extract_metadata("public class UserService {\n}\n");
        assert_eq!(meta.block_type, "class");
        assert_eq!(meta.hierarchy, "UserService");
    }

    #[test]
    fn extracts_interface_metadata() {
        let meta = JavaHandler.extract_metadata("public interface Repository<T> {\n}\n");
        assert_eq!(meta.block_type, "interface");
        assert_eq!(meta.hierarchy, "Repository");
    }

    #[test]
    fn extracts_method_metadata() {
        let meta = JavaHandler.extract_metadata("public User getUserById(String id) {\n}\n");
        assert_eq!(meta.block_type, "method");
        assert_eq!(meta.hierarchy, "getUserById");
    }
}
