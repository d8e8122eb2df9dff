use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::RwLock;

use async_trait::async_trait;

use super::r#trait::{DocPath, DocumentStore, Precondition, StoreError, StoredDocument, WriteOp};

/// In-memory versioned document store.
///
/// Intended for tests/dev. Commits take the write lock for their whole
/// check-then-apply section, which is what makes them atomic.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocPath, StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<StoredDocument>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        Ok(documents.get(path).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        Ok(documents
            .values()
            .filter(|doc| doc.path.collection() == collection)
            .cloned()
            .collect())
    }

    async fn commit(
        &self,
        preconditions: Vec<(DocPath, Precondition)>,
        writes: Vec<WriteOp>,
    ) -> Result<(), StoreError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))?;

        // All checks before any write: a failed precondition applies nothing.
        for (path, precondition) in &preconditions {
            let current = documents.get(path).map(|doc| doc.version);
            if !precondition.matches(current) {
                return Err(StoreError::Conflict(format!(
                    "{path}: expected {precondition:?}, found {current:?}"
                )));
            }
        }

        for write in writes {
            match documents.entry(write.path) {
                Entry::Occupied(mut entry) => {
                    let doc = entry.get_mut();
                    doc.version += 1;
                    doc.data = write.data;
                }
                Entry::Vacant(entry) => {
                    let path = entry.key().clone();
                    entry.insert(StoredDocument {
                        path,
                        version: 1,
                        data: write.data,
                    });
                }
            }
        }

        Ok(())
    }
}
