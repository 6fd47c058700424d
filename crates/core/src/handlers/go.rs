use super::{CustomLanguageSpec, ExtractedMetadata, LanguageHandler};
use crate::types::Language;

pub struct GoHandler;

const SYMBOL_QUERY: &str = r#"
(function_declaration
  name: (identifier) @name) @definition.function

(method_declaration
  name: (field_identifier) @name) @definition.method

(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (struct_type))) @definition.struct

(type_declaration
  (type_spec
    name: (type_identifier) @name
    type: (interface_type))) @definition.interface
"#;

const SEPARATOR_SPEC: CustomLanguageSpec = CustomLanguageSpec {
    language_name: "go",
    separators_regex: &[r"(?m)^func ", r"(?m)^type \w+ (?:struct|interface)", r"\n\n", r"\n"],
};

impl LanguageHandler for GoHandler {
    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn language(&self) -> Language {
        Language::Go
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
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
        if let Some(rest) = trimmed.strip_prefix("type ") {
            let kind = if rest.contains("struct") {
                Some("struct")
            } else if rest.contains("interface") {
                Some("interface")
            } else {
                None
            };
            if let Some(kind) = kind {
                let name = rest.split_whitespace().next().unwrap_or(rest);
                return ExtractedMetadata { block_type: kind.into(), hierarchy: name.into() };
            }
        }
        if let Some(rest) = trimmed.strip_prefix("func ") {
            // Method: `func (r *Receiver) Name(...)`. Function: `func Name(...)`.
            if let Some(after_receiver) = rest.strip_prefix('(').and_then(|s| s.split_once(')').map(|(_, tail)| tail.trim_start())) {
                let name = after_receiver.split('(').next().unwrap_or(after_receiver).trim();
                return ExtractedMetadata { block_type: "method".into(), hierarchy: name.into() };
            }
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
        let meta = GoHandler.extract_metadata("func GetUserByID(id string) (*User, error) {\n}\n");
        assert_eq!(meta.block_type, "function");
        assert_eq!(meta.hierarchy, "GetUserByID");
    }

    #[test]
    fn extracts_method_metadata() {
        let meta = GoHandler.extract_metadata("func (s *Server) Handle(w http.ResponseWriter) {\n}\n");
        assert_eq!(meta.block_type, "method");
        assert_eq!(meta.hierarchy, "Handle");
    }

    #[test]
    fn extracts_struct_metadata() {
        let meta = GoHandler.extract_metadata("type User struct {\n\tID string\n}\n");
        assert_eq!(meta.block_type, "struct");
        assert_eq!(meta.hierarchy, "User");
    }

    #[test]
    fn extracts_interface_metadata() {
        let meta = GoHandler.extract_metadata("type Repository interface {\n\tFind(id string) (*User, error)\n}\n");
        assert_eq!(meta.block_type, "interface");
        assert_eq!(meta.hierarchy, "Repository");
    }
}
