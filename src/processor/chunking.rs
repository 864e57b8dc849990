//! # Text Chunking
//!
//! Splits cleaned page text into chunks small enough to embed. Page text
//! arrives with its whitespace already collapsed, so the wrap strategy works
//! on words: it fills each chunk greedily, never exceeds `chunk_size`
//! characters and only breaks inside a word when the word alone is longer
//! than a chunk.

use std::mem;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::processor::error::ProcessError;
use crate::processor::{ChunkOptions, ChunkStrategy};

/// A chunk of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    /// `{document id}_chunk_{position}`
    pub id: String,

    /// The text of the chunk
    pub text: String,

    /// The position of the chunk in the original document
    pub position: usize,
}

/// Id of the chunk at `position` of document `document_id`
pub fn chunk_id(document_id: &str, position: usize) -> String {
    format!("{}_chunk_{}", document_id, position)
}

/// Split a document into chunks
///
/// # Errors
///
/// Returns [`ProcessError::InvalidOptions`] when `options.chunk_size` is 0.
/// Blank text yields no chunks rather than an error.
#[instrument(skip(text), fields(len = text.len()))]
pub fn chunk_document(
    document_id: &str,
    text: &str,
    options: &ChunkOptions,
) -> Result<Vec<TextChunk>, ProcessError> {
    if options.chunk_size == 0 {
        return Err(ProcessError::InvalidOptions(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    let pieces = match options.strategy {
        ChunkStrategy::Wrap => wrap_text(text, options.chunk_size),
        ChunkStrategy::WholeDocument => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    };

    debug!("Split {} into {} chunks", document_id, pieces.len());

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(position, text)| TextChunk {
            id: chunk_id(document_id, position),
            text,
            position,
        })
        .collect())
}

/// Greedily wrap words into lines of at most `width` characters
///
/// Words are separated by single spaces in the output. A word longer than
/// `width` first fills the rest of the current line, then is broken into
/// `width`-sized pieces. Lengths are counted in characters. `width` must be
/// non-zero.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > width {
            let chars: Vec<char> = word.chars().collect();
            let mut rest = chars.as_slice();
            if !current.is_empty() {
                // The head of the word fills whatever room the line has left
                let room = width.saturating_sub(current_len + 1);
                if room > 0 {
                    current.push(' ');
                    current.extend(&rest[..room]);
                    rest = &rest[room..];
                }
                lines.push(mem::take(&mut current));
            }
            let mut pieces = rest.chunks(width).peekable();
            while let Some(piece) = pieces.next() {
                let piece: String = piece.iter().collect();
                if pieces.peek().is_some() {
                    lines.push(piece);
                } else {
                    // The tail may still share a line with following words
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
