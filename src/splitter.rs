//! Recursive character text splitting.
//!
//! Splits documents into chunks of at most `chunk_size` characters, cutting
//! at the highest-priority separator available and falling back to lower
//! priorities, then to a hard character cut. Every piece keeps its trailing
//! separator, so with zero overlap the chunks of a document concatenate back
//! to the original text.

use crate::document::Document;

/// Configuration controlling how documents are split into chunks.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters carried from the end of one chunk into the next.
    pub chunk_overlap: usize,
    /// Separators in priority order.
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
            separators: vec![" ".to_string(), ",".to_string(), "\n".to_string()],
        }
    }
}

/// Split each document into bounded chunks, copying its metadata onto every
/// chunk. Chunk order within a document follows text order.
pub fn split_documents(documents: &[Document], config: &SplitterConfig) -> Vec<Document> {
    documents
        .iter()
        .flat_map(|doc| {
            split_text(&doc.text, config)
                .into_iter()
                .map(|text| Document::new(text, doc.metadata.clone()))
        })
        .collect()
}

/// Split raw text into chunks of at most `chunk_size` characters.
pub fn split_text(text: &str, config: &SplitterConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let pieces = split_pieces(text, &config.separators, config.chunk_size);
    merge_pieces(pieces, config.chunk_size, config.chunk_overlap)
}

/// Break `text` into pieces no longer than `chunk_size` characters, trying
/// each separator in priority order and hard-cutting as a last resort.
fn split_pieces(text: &str, separators: &[String], chunk_size: usize) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }

    for (rank, sep) in separators.iter().enumerate() {
        if !sep.is_empty() && text.contains(sep.as_str()) {
            let mut pieces = Vec::new();
            for piece in split_keep_separator(text, sep) {
                if char_len(piece) <= chunk_size {
                    pieces.push(piece.to_string());
                } else {
                    // Oversized piece: retry with lower-priority separators.
                    pieces.extend(split_pieces(piece, &separators[rank + 1..], chunk_size));
                }
            }
            return pieces;
        }
    }

    hard_cut(text, chunk_size)
}

/// Split on `sep`, keeping the separator attached to the preceding piece.
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, matched) in text.match_indices(sep) {
        pieces.push(&text[start..pos + matched.len()]);
        start = pos + matched.len();
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Cut `text` into slices of exactly `chunk_size` characters (the last one
/// shorter), respecting char boundaries.
fn hard_cut(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut pieces = Vec::new();
    let mut current = String::with_capacity(chunk_size);
    for ch in text.chars() {
        current.push(ch);
        if current.chars().count() == chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Greedily pack pieces into chunks of at most `chunk_size` characters,
/// carrying trailing pieces totaling at most `overlap` characters into the
/// next chunk.
fn merge_pieces(pieces: Vec<String>, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        if current_len + piece_len > chunk_size && current_len > 0 {
            chunks.push(current.concat());

            // Carry trailing pieces into the next chunk for overlap.
            let mut carried: Vec<String> = Vec::new();
            let mut carried_len = 0;
            while let Some(last) = current.pop() {
                let last_len = char_len(&last);
                if carried_len + last_len > overlap {
                    break;
                }
                carried_len += last_len;
                carried.insert(0, last);
            }
            current = carried;
            current_len = carried_len;
        }
        current_len += piece_len;
        current.push(piece);
    }

    if !current.is_empty() {
        chunks.push(current.concat());
    }
    chunks
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
