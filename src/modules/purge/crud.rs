use crate::modules::purge::model::{CollectionRef, DocumentSnapshot};
use crate::services::firestore::{FirestoreClient, FirestoreError};

pub struct PurgeCrud<'a> {
    db: &'a FirestoreClient,
    collection: CollectionRef,
}

impl<'a> PurgeCrud<'a> {
    pub fn new(db: &'a FirestoreClient, collection_name: &str) -> Self {
        Self {
            db,
            collection: db.collection(collection_name),
        }
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub async fn find_all(&self) -> Result<Vec<DocumentSnapshot>, FirestoreError> {
        self.db.list_documents(&self.collection).await
    }

    /// Deletes every given document in one atomic batch. An empty slice commits nothing.
    pub async fn delete_all(&self, docs: &[DocumentSnapshot]) -> Result<usize, FirestoreError> {
        let mut batch = self.db.batch();
        for doc in docs {
            tracing::debug!(
                collection = self.collection.id(),
                id = doc.id(),
                fields = doc.data().len(),
                updated = ?doc.update_time(),
                "Queued delete"
            );
            batch.delete(doc);
        }

        if batch.is_empty() {
            return Ok(0);
        }

        tracing::debug!(collection = self.collection.id(), deletes = batch.len(), "Committing batch");
        batch.commit().await
    }
}
