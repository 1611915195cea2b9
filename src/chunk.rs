//! Recursive separator-boundary text chunker.
//!
//! Splits cleaned document text into [`Chunk`]s bounded by a target
//! size, descending through a fixed separator priority (paragraph
//! break, line break, sentence-ending period, space, character
//! fallback) whenever a unit is still too large. Adjacent small units
//! are merged back together, and each chunk after the first is
//! prefixed with the tail of the previous chunk so local context
//! survives the boundary.
//!
//! Separators stay attached to the unit they end, so the unit stream
//! concatenates losslessly back to the input text; removing each
//! chunk's overlap prefix reconstructs the original document.

use crate::error::PipelineError;
use crate::models::{Chunk, ChunkMetadata};

/// Separator priority; the empty-string fallback is handled as a
/// character-level hard split.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ".", " "];

/// Split cleaned text into overlapping chunks with positional
/// metadata. Indices are contiguous from 0 in split order.
///
/// Fails only on invalid parameters: `chunk_size` of zero or an
/// overlap that is not strictly smaller than the chunk size.
pub fn chunk_text(
    text: &str,
    source: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, PipelineError> {
    if chunk_size == 0 {
        return Err(PipelineError::Chunking(
            "chunk_size must be greater than zero".to_string(),
        ));
    }
    if chunk_overlap >= chunk_size {
        return Err(PipelineError::Chunking(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut units = Vec::new();
    split_units(text, 0, chunk_size, &mut units);
    let merged = merge_units(&units, chunk_size, chunk_overlap);

    let chunks = merged
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| Chunk {
            metadata: ChunkMetadata {
                source: source.to_string(),
                chunk_index,
                chunk_size,
                chunk_overlap,
                text: text.clone(),
            },
            text,
        })
        .collect();

    Ok(chunks)
}

/// Recursively cut `text` into units of at most `chunk_size`
/// characters, preferring the highest-priority separator that applies.
fn split_units(text: &str, level: usize, chunk_size: usize, out: &mut Vec<String>) {
    if text.chars().count() <= chunk_size {
        out.push(text.to_string());
        return;
    }

    let Some(&separator) = SEPARATORS.get(level) else {
        split_chars(text, chunk_size, out);
        return;
    };

    if !text.contains(separator) {
        split_units(text, level + 1, chunk_size, out);
        return;
    }

    for piece in split_keep_separator(text, separator) {
        if piece.chars().count() <= chunk_size {
            out.push(piece);
        } else {
            split_units(&piece, level + 1, chunk_size, out);
        }
    }
}

/// Split on `separator`, leaving the separator attached to the piece
/// it terminates, so pieces concatenate back to `text`.
fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(separator) {
        let end = pos + separator.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Last-resort hard split into `chunk_size`-character slices.
fn split_chars(text: &str, chunk_size: usize, out: &mut Vec<String>) {
    let mut buf = String::new();
    let mut count = 0;
    for ch in text.chars() {
        buf.push(ch);
        count += 1;
        if count == chunk_size {
            out.push(std::mem::take(&mut buf));
            count = 0;
        }
    }
    if !buf.is_empty() {
        out.push(buf);
    }
}

/// Pack consecutive units into chunks of at most `chunk_size` new
/// characters, prefixing each chunk after the first with the final
/// `chunk_overlap` characters of its predecessor. A chunk therefore
/// never exceeds `chunk_size + chunk_overlap` characters in total.
fn merge_units(units: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut new_chars = 0usize;

    for unit in units {
        let unit_chars = unit.chars().count();
        if new_chars > 0 && new_chars + unit_chars > chunk_size {
            let tail = char_tail(&current, chunk_overlap);
            chunks.push(std::mem::replace(&mut current, tail));
            new_chars = 0;
        }
        current.push_str(unit);
        new_chars += unit_chars;
    }

    if new_chars > 0 {
        chunks.push(current);
    }
    chunks
}

/// The final `n` characters of `s` (char-boundary safe), or all of `s`
/// when it is shorter.
fn char_tail(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let count = s.chars().count();
    if count <= n {
        return s.to_string();
    }
    s.chars().skip(count - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap prefixes and rejoin: must give back the input.
    fn reconstruct(chunks: &[Chunk], chunk_overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.text);
            } else {
                let prev_chars = chunks[i - 1].text.chars().count();
                let prefix = chunk_overlap.min(prev_chars);
                out.extend(chunk.text.chars().skip(prefix));
            }
        }
        out
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = chunk_text("What is a mutual fund?", "funds.txt", 1000, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.chunk_index, 0);
        assert_eq!(chunks[0].text, "What is a mutual fund?");
        assert_eq!(chunks[0].metadata.source, "funds.txt");
        assert_eq!(chunks[0].metadata.text, chunks[0].text);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text("", "empty.txt", 1000, 200).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn zero_size_rejected() {
        let err = chunk_text("abc", "a.txt", 0, 0).unwrap_err();
        assert!(matches!(err, PipelineError::Chunking(_)));
    }

    #[test]
    fn overlap_not_smaller_than_size_rejected() {
        assert!(chunk_text("abc", "a.txt", 10, 10).is_err());
        assert!(chunk_text("abc", "a.txt", 10, 11).is_err());
    }

    #[test]
    fn indices_contiguous_from_zero() {
        let text = (0..40)
            .map(|i| format!("Sentence number {} about deposit accounts.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, "deposits.txt", 120, 30).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
        }
    }

    #[test]
    fn reconstruction_with_overlap_removed() {
        let text = (0..30)
            .map(|i| format!("Clause {} covers interest accrual and fees.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, "t.txt", 90, 20).unwrap();
        assert_eq!(reconstruct(&chunks, 20), text);
    }

    #[test]
    fn reconstruction_without_overlap() {
        let text = "One. Two. Three. Four. Five. Six. Seven. Eight. Nine. Ten.";
        let chunks = chunk_text(text, "t.txt", 15, 0).unwrap();
        assert_eq!(reconstruct(&chunks, 0), text);
    }

    #[test]
    fn chunks_respect_size_bound() {
        let text = (0..50)
            .map(|i| format!("Item {} in the ledger.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, "t.txt", 80, 20).unwrap();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 80 + 20, "chunk too large");
        }
    }

    #[test]
    fn overlap_repeats_previous_tail() {
        let text = (0..20)
            .map(|i| format!("Row {} of the statement.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_text(&text, "t.txt", 60, 15).unwrap();
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail: String = {
                let prev = &pair[0].text;
                let count = prev.chars().count();
                prev.chars().skip(count.saturating_sub(15)).collect()
            };
            assert!(pair[1].text.starts_with(&tail));
        }
    }

    #[test]
    fn long_unbroken_run_falls_back_to_char_split() {
        let text = "x".repeat(250);
        let chunks = chunk_text(&text, "t.txt", 100, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(reconstruct(&chunks, 0), text);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let text = "First paragraph about loans.\n\nSecond paragraph about bonds.";
        let chunks = chunk_text(text, "t.txt", 40, 10).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("First paragraph"));
        assert!(chunks[1].text.ends_with("Second paragraph about bonds."));
    }

    #[test]
    fn deterministic() {
        let text = "Alpha. Beta. Gamma. Delta. Epsilon. Zeta. Eta. Theta.";
        let a = chunk_text(text, "t.txt", 20, 5).unwrap();
        let b = chunk_text(text, "t.txt", 20, 5).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.metadata, y.metadata);
        }
    }
}
