use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Where a document came from: one table row, or one row of a custom query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub table: Option<String>,
    pub row: usize,
}

impl DocumentSource {
    pub fn table(table: impl Into<String>, row: usize) -> Self {
        Self {
            table: Some(table.into()),
            row,
        }
    }

    pub fn query(row: usize) -> Self {
        Self { table: None, row }
    }

    /// `key: value` lines prepended to text sent to the embedding model and the LLM.
    pub fn header(&self) -> String {
        match &self.table {
            Some(table) => format!("table: {}\nrow: {}", table, self.row),
            None => format!("source: query\nrow: {}", self.row),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}#{}", table, self.row),
            None => write!(f, "query#{}", self.row),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub text: String,
    pub source: DocumentSource,
}

impl Document {
    pub fn new(text: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub content: String,
    pub chunk_index: usize,
    pub source: DocumentSource,
}

impl DocumentChunk {
    pub fn new(document: &Document, body: &str, chunk_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: document.id,
            content: format!("{}\n\n{}", document.source.header(), body),
            chunk_index,
            source: document.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Splits a document into chunks by paragraph boundaries.
///
/// Paragraphs are joined until they exceed `chunk_size` characters, then a new
/// chunk starts. A paragraph that alone exceeds `chunk_size` is split on
/// whitespace, and a single word longer than `chunk_size` on char boundaries.
/// Every chunk carries the document's provenance header.
pub fn chunk_document(document: &Document, chunk_size: usize) -> Vec<DocumentChunk> {
    let chunk_size = chunk_size.max(1);
    let pieces: Vec<String> = document
        .text
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .flat_map(|p| split_oversized(p, chunk_size))
        .collect();

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    for piece in pieces {
        let would_exceed = !current_chunk.is_empty()
            && current_chunk.chars().count() + piece.chars().count() + 2 > chunk_size;

        if would_exceed {
            chunks.push(DocumentChunk::new(document, &current_chunk, chunks.len()));
            current_chunk.clear();
        }

        if !current_chunk.is_empty() {
            current_chunk.push_str("\n\n");
        }
        current_chunk.push_str(&piece);
    }

    if !current_chunk.is_empty() {
        chunks.push(DocumentChunk::new(document, &current_chunk, chunks.len()));
    }

    chunks
}

fn split_oversized(paragraph: &str, chunk_size: usize) -> Vec<String> {
    if paragraph.chars().count() <= chunk_size {
        return vec![paragraph.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > chunk_size {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            parts.extend(chars.chunks(chunk_size).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current_len > 0 && current_len + 1 + word_len > chunk_size {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
