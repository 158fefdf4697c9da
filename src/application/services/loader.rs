use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::domain::{
    ports::{DatabaseReader, RagEngine},
    DomainError, VectorIndex,
};

/// Builds the index from the database on first use and hands out the same
/// `Arc` afterwards. A failed build is not cached.
pub struct IndexLoader {
    reader: Arc<dyn DatabaseReader>,
    rag: Arc<dyn RagEngine>,
    index: OnceCell<Arc<VectorIndex>>,
}

impl IndexLoader {
    pub fn new(reader: Arc<dyn DatabaseReader>, rag: Arc<dyn RagEngine>) -> Self {
        Self {
            reader,
            rag,
            index: OnceCell::new(),
        }
    }

    pub async fn load(&self) -> Result<Arc<VectorIndex>, DomainError> {
        self.index
            .get_or_try_init(|| self.build())
            .await
            .map(Arc::clone)
    }

    pub fn get(&self) -> Option<Arc<VectorIndex>> {
        self.index.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.index.initialized()
    }

    #[instrument(skip(self))]
    async fn build(&self) -> Result<Arc<VectorIndex>, DomainError> {
        let documents = self.reader.load_documents().await?;
        if documents.is_empty() {
            return Err(DomainError::validation("the database has no rows to index"));
        }

        let index = self.rag.build_index(&documents).await?;
        tracing::info!(
            index_id = %index.id(),
            documents = documents.len(),
            chunks = index.len(),
            "index ready"
        );
        Ok(Arc::new(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRag, StaticReader};

    #[tokio::test]
    async fn test_load_is_cached() {
        let reader = Arc::new(StaticReader::rows(&["id: 1", "id: 2"]));
        let rag = Arc::new(FakeRag::new());
        let loader = IndexLoader::new(reader.clone(), rag.clone());

        assert!(!loader.is_loaded());
        let first = loader.load().await.unwrap();
        let second = loader.load().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), second.id());
        assert_eq!(reader.loads(), 1);
        assert_eq!(rag.builds(), 1);
        assert!(loader.is_loaded());
    }

    #[tokio::test]
    async fn test_concurrent_loads_build_once() {
        let reader = Arc::new(StaticReader::rows(&["id: 1"]));
        let rag = Arc::new(FakeRag::new());
        let loader = Arc::new(IndexLoader::new(reader.clone(), rag.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                tokio::spawn(async move { loader.load().await.map(|i| i.id()) })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(reader.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let reader = Arc::new(StaticReader::failing());
        let rag = Arc::new(FakeRag::new());
        let loader = IndexLoader::new(reader.clone(), rag.clone());

        assert!(matches!(loader.load().await, Err(DomainError::Database(_))));
        assert!(loader.load().await.is_err());

        assert_eq!(reader.loads(), 2);
        assert_eq!(rag.builds(), 0);
        assert!(loader.get().is_none());
    }

    #[tokio::test]
    async fn test_empty_database_is_rejected() {
        let loader = IndexLoader::new(
            Arc::new(StaticReader::rows(&[])),
            Arc::new(FakeRag::new()),
        );

        assert!(matches!(loader.load().await, Err(DomainError::Validation(_))));
    }
}
