//! Context expansion for a matched chunk: either grow it out to its
//! smallest enclosing definition (smart context) or pad it with a fixed
//! number of raw lines before/after (fixed context), so a result that
//! landed mid-function isn't shown as an arbitrary chunk boundary.

use crate::handlers::Registry;
use crate::symbols;
use crate::types::{ByteRange, Symbol};

/// Expand `content`/`location` to the smallest symbol in `file_text` whose
/// range encloses `location`, provided that symbol's line span is at most
/// `context_line_cap`. When there's no handler, no enclosing symbol, or the
/// enclosing symbol is too large, falls back to a plain line-based window
/// centred on the original match and capped at `context_line_cap` lines
/// total, so the caller still gets useful surrounding context instead of
/// the bare chunk.
#[must_use]
pub fn expand(filename: &str, file_text: &str, location: ByteRange, content: &str, context_line_cap: usize) -> (String, ByteRange) {
    let language = Registry::global().resolve_language(std::path::Path::new(filename), file_text.as_bytes());
    if let Some(handler) = Registry::global().handler_for(language) {
        let ts_language = handler.ts_language();
        let result = symbols::extract_symbols(file_text, &ts_language, handler.symbol_query(), handler.qualifier_separator());

        if let Some(enclosing) = smallest_enclosing(&result.symbols, location) {
            let span = enclosing.range.end_line.saturating_sub(enclosing.range.start_line) + 1;
            if span <= context_line_cap {
                let expanded_text = file_text.get(enclosing.range.start..enclosing.range.end).unwrap_or(content).to_string();
                return (expanded_text, enclosing.range);
            }
        }
    }

    centered_window(file_text, location, content, context_line_cap)
}

/// Expand `content`/`location` by a fixed number of raw lines before and
/// after, without trying to resolve an enclosing definition. Used when a
/// caller asks for `context_before`/`context_after` explicitly instead of
/// `smart_context`.
#[must_use]
pub fn expand_fixed(file_text: &str, location: ByteRange, content: &str, lines_before: usize, lines_after: usize) -> (String, ByteRange) {
    if lines_before == 0 && lines_after == 0 {
        return (content.to_string(), location);
    }

    let lines: Vec<&str> = file_text.lines().collect();
    if lines.is_empty() || location.start_line == 0 || location.start_line > lines.len() {
        return (content.to_string(), location);
    }

    let start_line = location.start_line.saturating_sub(1).saturating_sub(lines_before);
    let end_line = (location.end_line.saturating_sub(1) + lines_after).min(lines.len().saturating_sub(1));

    let expanded_text = lines[start_line..=end_line].join("\n");
    let byte_start = line_byte_offset(file_text, start_line).unwrap_or(location.start);
    let byte_end = line_byte_offset(file_text, end_line + 1).unwrap_or(file_text.len());

    (expanded_text, ByteRange { start: byte_start, end: byte_end, start_line: start_line + 1, end_line: end_line + 1 })
}

/// Fall back to a plain window of `file_text` lines centred on `location`,
/// capped at `context_line_cap` lines total (half before, half after).
fn centered_window(file_text: &str, location: ByteRange, content: &str, context_line_cap: usize) -> (String, ByteRange) {
    if context_line_cap == 0 {
        return (content.to_string(), location);
    }

    let lines: Vec<&str> = file_text.lines().collect();
    if lines.is_empty() || location.start_line == 0 || location.start_line > lines.len() {
        return (content.to_string(), location);
    }

    let match_span = location.end_line.saturating_sub(location.start_line) + 1;
    if match_span >= context_line_cap {
        return (content.to_string(), location);
    }

    let slack = context_line_cap - match_span;
    let half = slack / 2;

    let start_line = location.start_line.saturating_sub(1).saturating_sub(half);
    let end_line = (location.end_line.saturating_sub(1) + (slack - half)).min(lines.len().saturating_sub(1));

    let expanded_text = lines[start_line..=end_line].join("\n");
    let byte_start = line_byte_offset(file_text, start_line).unwrap_or(location.start);
    let byte_end = line_byte_offset(file_text, end_line + 1).unwrap_or(file_text.len());

    (expanded_text, ByteRange { start: byte_start, end: byte_end, start_line: start_line + 1, end_line: end_line + 1 })
}

/// Byte offset of the start of the `line_index`-th line (0-based), or the
/// end of the text if `line_index` is past the last line.
fn line_byte_offset(file_text: &str, line_index: usize) -> Option<usize> {
    if line_index == 0 {
        return Some(0);
    }
    file_text.match_indices('\n').nth(line_index - 1).map(|(i, _)| i + 1)
}

fn smallest_enclosing(symbols: &[Symbol], location: ByteRange) -> Option<&Symbol> {
    symbols
        .iter()
        .filter(|s| s.range.start <= location.start && s.range.end >= location.end)
        .min_by_key(|s| s.range.end - s.range.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_to_enclosing_function() {
        let text = "fn helper() {\n    let x = 1;\n    let y = 2;\n    x + y\n}\n";
        let inner_start = text.find("let x").unwrap();
        let location = ByteRange { start: inner_start, end: inner_start + 5, start_line: 2, end_line: 2 };
        let (expanded, range) = expand("lib.rs", text, location, "let x", 50);
        assert!(expanded.starts_with("fn helper"));
        assert_eq!(range.start, 0);
    }

    #[test]
    fn oversized_enclosing_symbol_falls_back_to_centered_window() {
        let body = "    let x = 1;\n".repeat(200);
        let text = format!("fn huge() {{\n{body}}}\n");
        let inner_start = text.find("let x").unwrap();
        let location = ByteRange { start: inner_start, end: inner_start + 5, start_line: 2, end_line: 2 };
        let (expanded, _) = expand("lib.rs", &text, location, "let x", 10);
        assert_ne!(expanded, "let x");
        assert!(expanded.contains("let x"));
        assert!(expanded.lines().count() <= 10);
    }

    #[test]
    fn unsupported_language_falls_back_to_centered_window() {
        let text = "line one\nline two\nhello world\nline four\nline five\n";
        let location = ByteRange { start: text.find("hello").unwrap(), end: text.find("hello").unwrap() + 5, start_line: 3, end_line: 3 };
        let (expanded, _) = expand("readme.txt", text, location, "hello", 3);
        assert!(expanded.contains("hello world"));
        assert!(expanded.lines().count() <= 3);
    }

    #[test]
    fn centered_window_is_centred_on_the_match() {
        let text: String = (1..=21).map(|n| format!("line{n}\n")).collect();
        let match_line = 11;
        let start = line_byte_offset(&text, match_line - 1).unwrap();
        let location = ByteRange { start, end: start + 6, start_line: match_line, end_line: match_line };
        let (expanded, range) = centered_window(&text, location, "line11", 5);
        assert_eq!(range.start_line, 9);
        assert_eq!(range.end_line, 13);
        assert!(expanded.contains("line11"));
    }

    #[test]
    fn expand_fixed_pads_with_requested_line_counts() {
        let text: String = (1..=10).map(|n| format!("line{n}\n")).collect();
        let start = line_byte_offset(&text, 4).unwrap();
        let location = ByteRange { start, end: start + 6, start_line: 5, end_line: 5 };
        let (expanded, range) = expand_fixed(&text, location, "line5", 2, 1);
        assert_eq!(range.start_line, 3);
        assert_eq!(range.end_line, 6);
        assert_eq!(expanded, "line3\nline4\nline5\nline6");
    }

    #[test]
    fn expand_fixed_is_noop_when_both_counts_are_zero() {
        let location = ByteRange { start: 0, end: 5, start_line: 1, end_line: 1 };
        let (expanded, range) = expand_fixed("hello world", location, "hello", 0, 0);
        assert_eq!(expanded, "hello");
        assert_eq!(range, location);
    }
}
