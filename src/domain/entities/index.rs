use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{DocumentChunk, Embedding, SearchResult};

/// Immutable semantic index over the loaded documents.
///
/// Built once from every chunk and its embedding; search is a cosine scan over
/// all entries. There is no update path: a new snapshot means a new index.
#[derive(Debug)]
pub struct VectorIndex {
    id: Uuid,
    entries: Vec<(DocumentChunk, Embedding)>,
    document_count: usize,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub id: Uuid,
    pub documents: usize,
    pub chunks: usize,
    pub built_at: DateTime<Utc>,
}

impl VectorIndex {
    pub fn new(entries: Vec<(DocumentChunk, Embedding)>, document_count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            entries,
            document_count,
            built_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            id: self.id,
            documents: self.document_count,
            chunks: self.entries.len(),
            built_at: self.built_at,
        }
    }

    pub fn search(&self, query: &Embedding, top_k: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }
}
