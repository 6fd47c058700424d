//! Recursive hierarchical chunker.
//!
//! Splits a file's text using its resolved handler's ordered separator
//! regexes -- coarsest (block-level) first, finest (line-level) last --
//! recursing into any piece that still exceeds `chunk_size` bytes. Adjacent
//! small pieces are merged back up to `chunk_size`, and `chunk_overlap`
//! bytes are carried from the tail of one chunk into the head of the next
//! so embeddings don't lose cross-boundary context.

use regex::Regex;

use crate::handlers::Resolution;
#[cfg(test)]
use crate::handlers::CustomLanguageSpec;
use crate::types::{BlockType, ByteRange, Chunk, Language};

/// Split `text` into chunks according to `resolution`'s separator spec,
/// then run its metadata extractor over each piece.
///
/// `filename` and `language` are stamped onto every produced [`Chunk`];
/// `embedding`/`symbol_*` fields are left empty for later stages
/// (embedding client, symbol association) to fill in.
#[must_use]
pub fn chunk_file(
    filename: &str,
    text: &str,
    language: Language,
    resolution: &Resolution<'_>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<Chunk> {
    let pieces = split_recursive(text, resolution.separator_spec().separators_regex, chunk_size);
    let merged = merge_and_overlap(&pieces, chunk_size, chunk_overlap);

    merged
        .into_iter()
        .filter(|piece| !piece.text.trim().is_empty())
        .map(|piece| {
            let meta = resolution.extract_metadata(&piece.text);
            let block_type = block_type_from_str(&meta.block_type);
            let hierarchy: Vec<String> =
                meta.hierarchy.split('.').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect();

            Chunk {
                filename: filename.to_string(),
                location: piece.range,
                content: piece.text,
                embedding: None,
                block_type,
                hierarchy,
                language,
                symbol_type: None,
                symbol_name: None,
                symbol_signature: None,
            }
        })
        .collect()
}

/// One unmerged piece of text carved out by [`split_recursive`], still
/// tagged with its byte/line range in the original file.
struct Piece {
    text: String,
    range: ByteRange,
}

/// Recursively split `text` by the first separator in `separators`; any
/// resulting piece still longer than `chunk_size` bytes is split again by
/// the remaining separators. Once `separators` is exhausted, falls back to
/// whitespace/newline splitting (spec §4.4's final fallback).
fn split_recursive(text: &str, separators: &[&str], chunk_size: usize) -> Vec<Piece> {
    split_recursive_at(text, separators, chunk_size, 0, 1)
}

fn split_recursive_at(text: &str, separators: &[&str], chunk_size: usize, base_offset: usize, base_line: usize) -> Vec<Piece> {
    let Some(pattern) = separators.first() else {
        return split_by_lines_if_oversized(text, chunk_size, base_offset, base_line);
    };
    let Ok(re) = Regex::new(pattern) else {
        return split_recursive_at(text, &separators[1..], chunk_size, base_offset, base_line);
    };

    let mut boundaries: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    boundaries.retain(|&b| b > 0);
    if boundaries.is_empty() {
        return split_recursive_at(text, &separators[1..], chunk_size, base_offset, base_line);
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut bounds = boundaries;
    bounds.push(text.len());
    for end in bounds {
        if end <= start {
            continue;
        }
        let segment = &text[start..end];
        let segment_line = base_line + count_newlines(&text[..start]);
        if segment.len() > chunk_size {
            pieces.extend(split_recursive_at(segment, &separators[1..], chunk_size, base_offset + start, segment_line));
        } else {
            pieces.push(make_piece(segment, base_offset + start, segment_line));
        }
        start = end;
    }
    pieces
}

fn split_by_lines_if_oversized(text: &str, chunk_size: usize, base_offset: usize, base_line: usize) -> Vec<Piece> {
    if text.len() <= chunk_size {
        return vec![make_piece(text, base_offset, base_line)];
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut line = base_line;
    let mut cursor = 0usize;
    for segment in text.split_inclusive('\n') {
        if cursor - start >= chunk_size && cursor > start {
            pieces.push(make_piece(&text[start..cursor], base_offset + start, line));
            line += count_newlines(&text[start..cursor]);
            start = cursor;
        }
        cursor += segment.len();
    }
    if start < text.len() {
        pieces.push(make_piece(&text[start..], base_offset + start, line));
    }
    pieces
}

fn make_piece(text: &str, offset: usize, start_line: usize) -> Piece {
    let end_line = start_line + count_newlines(text);
    Piece {
        text: text.to_string(),
        range: ByteRange { start: offset, end: offset + text.len(), start_line, end_line },
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Merge adjacent small pieces up to `chunk_size` and prepend `chunk_overlap`
/// bytes from the previous chunk's tail onto the next chunk's head.
fn merge_and_overlap(pieces: &[Piece], chunk_size: usize, chunk_overlap: usize) -> Vec<Piece> {
    if pieces.is_empty() {
        return Vec::new();
    }

    let mut merged: Vec<Piece> = Vec::new();
    for piece in pieces {
        match merged.last_mut() {
            Some(prev) if prev.text.len() + piece.text.len() <= chunk_size => {
                prev.text.push_str(&piece.text);
                prev.range.end = piece.range.end;
                prev.range.end_line = piece.range.end_line;
            }
            _ => merged.push(Piece { text: piece.text.clone(), range: piece.range }),
        }
    }

    if chunk_overlap == 0 || merged.len() < 2 {
        return merged;
    }

    let mut result = Vec::with_capacity(merged.len());
    for (i, piece) in merged.into_iter().enumerate() {
        if i == 0 {
            result.push(piece);
            continue;
        }
        let prev: &Piece = &result[i - 1];
        let tail_start = prev.text.len().saturating_sub(chunk_overlap);
        let tail = floor_char_boundary(&prev.text, tail_start);
        let overlap_text = &prev.text[tail..];
        let mut text = String::with_capacity(overlap_text.len() + piece.text.len());
        text.push_str(overlap_text);
        text.push_str(&piece.text);
        let start = piece.range.start.saturating_sub(overlap_text.len());
        result.push(Piece { text, range: ByteRange { start, end: piece.range.end, start_line: piece.range.start_line, end_line: piece.range.end_line } });
    }
    result
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn block_type_from_str(s: &str) -> BlockType {
    match s {
        "function" => BlockType::Function,
        "method" => BlockType::Method,
        "class" | "impl" => BlockType::Class,
        "interface" => BlockType::Interface,
        "struct" => BlockType::Struct,
        "trait" => BlockType::Trait,
        "enum" => BlockType::Enum,
        "module" | "workflow_step" => BlockType::Module,
        _ => BlockType::Fragment,
    }
}

/// Production-size separator spec used only by unit tests below; a real
/// caller always goes through [`Resolution::separator_spec`].
#[cfg(test)]
const TEST_SPEC: CustomLanguageSpec =
    CustomLanguageSpec { language_name: "test", separators_regex: &[r"(?m)^fn \w", r"\n\n", r"\n"] };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_function_boundaries() {
        let text = "fn a() {\n    1\n}\n\nfn b() {\n    2\n}\n";
        let pieces = split_recursive(text, TEST_SPEC.separators_regex, 1000);
        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].text.starts_with("fn a"));
        assert!(pieces[1].text.starts_with("fn b"));
    }

    #[test]
    fn merges_small_adjacent_pieces() {
        let pieces = vec![
            make_piece("fn a() {}\n", 0, 1),
            make_piece("fn b() {}\n", 10, 2),
        ];
        let merged = merge_and_overlap(&pieces, 1000, 0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "fn a() {}\nfn b() {}\n");
    }

    #[test]
    fn recurses_when_piece_exceeds_chunk_size() {
        let big_fn_body = "    x = 1\n".repeat(50);
        let text = format!("fn huge() {{\n{big_fn_body}}}\n");
        let pieces = split_recursive(&text, TEST_SPEC.separators_regex, 100);
        assert!(pieces.len() > 1);
        assert!(pieces.iter().all(|p| p.text.len() <= 100 || !p.text.contains('\n')));
    }

    #[test]
    fn overlap_carries_tail_into_next_chunk() {
        let pieces = vec![make_piece("aaaaaaaaaa", 0, 1), make_piece("bbbbbbbbbb", 10, 2)];
        let merged = merge_and_overlap(&pieces, 5, 4);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].text.starts_with("aaaa"));
        assert!(merged[1].text.ends_with("bbbbbbbbbb"));
    }

    #[test]
    fn whole_file_falls_back_to_line_splitting() {
        let text = "a".repeat(50) + "\n" + &"b".repeat(50) + "\n";
        let pieces = split_recursive(&text, &[], 40);
        assert!(pieces.len() >= 2);
    }
}
