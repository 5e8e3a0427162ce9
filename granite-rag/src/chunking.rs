//! Document chunking.
//!
//! [`RecursiveChunker`] walks a document in windows of at most `chunk_size`
//! characters. Inside each window it cuts after the most preferred separator
//! (paragraph, line, sentence, word) that still leaves the chunk at least half
//! full, and only falls back to a hard cut when none does. The next window starts `chunk_overlap` characters before
//! the cut, so neighbouring chunks always share exactly that many characters.

use crate::config::ChunkingConfig;
use crate::document::{Chunk, Document};
use crate::error::Result;

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the index builder.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no non-whitespace text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text on the largest available boundary with a fixed overlap.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`. Each chunk inherits
/// the parent document's metadata plus `chunk_index` and `start_char` fields.
///
/// # Example
///
/// ```rust,ignore
/// use granite_rag::{ChunkingConfig, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(ChunkingConfig::new(1000, 50))?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if the
    /// config fails [`ChunkingConfig::validate`].
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Return the chunking parameters.
    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split raw text into `(start_char, text)` pieces.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // bounds[i] is the byte offset of character i; the last entry is text.len().
        let bounds: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
        let total = bounds.len() - 1;
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut pieces = Vec::new();
        let mut start = 0;
        loop {
            let limit = (start + size).min(total);
            if limit == total {
                pieces.push((start, &text[bounds[start]..]));
                break;
            }
            let end = self.find_cut(text, &bounds, start, limit).unwrap_or(limit);
            pieces.push((start, &text[bounds[start]..bounds[end]]));
            // end > start + overlap, so every iteration advances.
            start = end - overlap;
        }
        pieces
    }

    /// Find the character index just past the last preferred separator in
    /// `start..limit`.
    ///
    /// A cut must keep more than `chunk_overlap` characters and at least half
    /// of `chunk_size`; a separator whose last occurrence falls earlier is
    /// skipped in favour of the next one, so a short heading is merged with
    /// the prose after it instead of becoming a chunk of its own.
    fn find_cut(&self, text: &str, bounds: &[usize], start: usize, limit: usize) -> Option<usize> {
        let window = &text[bounds[start]..bounds[limit]];
        let min_len = (self.config.chunk_overlap + 1).max(self.config.chunk_size / 2);

        self.config.separators.iter().find_map(|separator| {
            let pos = window.rfind(separator.as_str())?;
            let end_byte = bounds[start] + pos + separator.len();
            let end = bounds.binary_search(&end_byte).ok()?;
            (end - start >= min_len).then_some(end)
        })
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, (start_char, text))| {
                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), i.to_string());
                metadata.insert("start_char".to_string(), start_char.to_string());
                Chunk {
                    id: format!("{}_{i}", document.id),
                    text: text.to_string(),
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                }
            })
            .collect()
    }
}
