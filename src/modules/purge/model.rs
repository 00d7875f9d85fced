use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::services::firestore::{FirestoreClient, FirestoreError};

/// Named pointer to a top-level collection. Carries no state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    id: String,
    path: String,
}

impl CollectionRef {
    pub fn new(database_path: &str, id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: format!("{}/documents/{}", database_path, id),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Full resource path, `projects/{p}/databases/{d}/documents/{id}`.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Read-only view of a document at fetch time.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    name: String,
    data: Map<String, Value>,
    update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// An unparseable `update_time` is dropped; it never blocks a delete.
    pub(crate) fn from_parts(name: String, data: Map<String, Value>, update_time: Option<&str>) -> Self {
        let update_time = update_time
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Self {
            name,
            data,
            update_time,
        }
    }

    /// Full resource name; this is the reference a delete targets.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.update_time
    }
}

/// Pending deletes applied together by a single commit.
///
/// `commit` takes the batch by value, so a committed batch can never be
/// appended to or committed again.
pub struct WriteBatch<'a> {
    db: &'a FirestoreClient,
    deletes: Vec<String>,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(db: &'a FirestoreClient) -> Self {
        Self {
            db,
            deletes: Vec::new(),
        }
    }

    pub fn delete(&mut self, doc: &DocumentSnapshot) -> &mut Self {
        self.deletes.push(doc.name().to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty()
    }

    pub async fn commit(self) -> Result<usize, FirestoreError> {
        self.db.commit_deletes(&self.deletes).await
    }
}
