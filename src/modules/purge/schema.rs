use std::fmt;
use thiserror::Error;

use crate::services::firestore::FirestoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    Empty { collection: String },
    Deleted { collection: String, count: usize },
}

impl PurgeOutcome {
    pub fn collection(&self) -> &str {
        match self {
            PurgeOutcome::Empty { collection } | PurgeOutcome::Deleted { collection, .. } => {
                collection
            }
        }
    }

    pub fn deleted(&self) -> usize {
        match self {
            PurgeOutcome::Empty { .. } => 0,
            PurgeOutcome::Deleted { count, .. } => *count,
        }
    }
}

impl fmt::Display for PurgeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgeOutcome::Empty { .. } => write!(f, "No documents to delete."),
            PurgeOutcome::Deleted { collection, count } => {
                write!(f, "Deleted {} documents in the collection {}", count, collection)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error(transparent)]
    Firestore(#[from] FirestoreError),
    #[error("Purge task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct CollectionResult {
    pub collection: String,
    pub result: Result<PurgeOutcome, PurgeError>,
}

/// Results of one run, in the order the collections were configured.
#[derive(Debug, Default)]
pub struct PurgeReport {
    pub results: Vec<CollectionResult>,
}

impl PurgeReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &PurgeOutcome> {
        self.results.iter().filter_map(|r| r.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PurgeError)> {
        self.results
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.collection.as_str(), e)))
    }

    pub fn total_deleted(&self) -> usize {
        self.succeeded().map(PurgeOutcome::deleted).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}
