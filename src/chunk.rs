//! Overlapping sliding-window text chunker.
//!
//! Splits the combined document text into [`Chunk`]s of at most
//! `chunk_size` bytes, with consecutive chunks overlapping by `overlap`
//! bytes. Cuts prefer natural boundaries (paragraph, sentence end,
//! newline, word) and fall back to a hard cut. All offsets are clamped to
//! UTF-8 character boundaries.
//!
//! Each chunk records its `[start, end)` byte range in the source text, so
//! concatenating the non-overlapping remainder of each chunk reproduces
//! the input exactly. Chunks also receive a UUID and a SHA-256 hash of
//! their text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A chunk of the combined document text.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Chunk {
    pub id: String,
    pub chunk_index: i64,
    pub text: String,
    /// Byte offset of the chunk's first byte in the source text.
    pub start: usize,
    /// Byte offset one past the chunk's last byte.
    pub end: usize,
    pub hash: String,
}

/// Split `text` into overlapping chunks. Returns chunks with contiguous
/// indices starting at 0; empty input yields no chunks.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    debug_assert!(overlap < chunk_size);

    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index: i64 = 0;

    while start < len {
        let mut hard_end = floor_char_boundary(text, (start + chunk_size).min(len));
        if hard_end <= start {
            // chunk_size smaller than the next character; take the character whole
            hard_end = next_char_boundary(text, start);
        }

        let end = if hard_end < len {
            natural_break(text, start, hard_end).unwrap_or(hard_end)
        } else {
            len
        };

        chunks.push(make_chunk(text, index, start, end));
        index += 1;

        if end >= len {
            break;
        }

        let step = end - start;
        let mut next = if step <= overlap {
            end
        } else {
            floor_char_boundary(text, end - overlap)
        };
        if next <= start {
            next = end;
        }
        start = next;
    }

    chunks
}

/// Find a cut inside `(start, hard_end]` on a natural boundary, searching
/// backwards: paragraph break, sentence end, newline, word boundary.
/// Cuts landing in the first third of the window are rejected so chunks
/// don't degenerate.
fn natural_break(text: &str, start: usize, hard_end: usize) -> Option<usize> {
    let window = &text[start..hard_end];
    let min_pos = window.len() / 3;

    if let Some(pos) = window.rfind("\n\n") {
        if pos > min_pos {
            return Some(start + pos + 2);
        }
    }
    for pat in [". ", "! ", "? ", ".\n", "!\n", "?\n"] {
        if let Some(pos) = window.rfind(pat) {
            if pos > min_pos {
                return Some(start + pos + pat.len());
            }
        }
    }
    if let Some(pos) = window.rfind('\n') {
        if pos > min_pos {
            return Some(start + pos + 1);
        }
    }
    if let Some(pos) = window.rfind(' ') {
        if pos > min_pos {
            return Some(start + pos + 1);
        }
    }
    None
}

fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn next_char_boundary(text: &str, mut i: usize) -> usize {
    i += 1;
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}

fn make_chunk(text: &str, index: i64, start: usize, end: usize) -> Chunk {
    let slice = &text[start..end];
    let mut hasher = Sha256::new();
    hasher.update(slice.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        chunk_index: index,
        text: slice.to_string(),
        start,
        end,
        hash,
    }
}
