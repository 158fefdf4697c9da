use async_trait::async_trait;

use crate::domain::{errors::DomainError, Document};

/// Source of the rows the index is built from.
#[async_trait]
pub trait DatabaseReader: Send + Sync {
    async fn load_documents(&self) -> Result<Vec<Document>, DomainError>;
}
