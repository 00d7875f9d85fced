use futures::future::join_all;

use crate::modules::purge::{
    crud::PurgeCrud,
    schema::{CollectionResult, PurgeError, PurgeOutcome, PurgeReport},
};
use crate::services::firestore::{FirestoreClient, FirestoreError};
use crate::AppState;

/// Deletes every document currently in `collection_name`.
///
/// Documents written after the read are left in place. A failed read never
/// reaches the commit, and the commit itself is all-or-nothing.
pub async fn purge(db: &FirestoreClient, collection_name: &str) -> Result<PurgeOutcome, FirestoreError> {
    let crud = PurgeCrud::new(db, collection_name);

    let docs = crud.find_all().await?;

    if docs.is_empty() {
        let outcome = PurgeOutcome::Empty {
            collection: collection_name.to_string(),
        };
        tracing::info!(collection = outcome.collection(), "{}", outcome);
        return Ok(outcome);
    }

    let applied = crud.delete_all(&docs).await?;
    if applied != docs.len() {
        tracing::warn!(
            collection = collection_name,
            fetched = docs.len(),
            applied,
            "Commit reported a different number of writes"
        );
    }

    let outcome = PurgeOutcome::Deleted {
        collection: collection_name.to_string(),
        count: docs.len(),
    };
    tracing::info!(collection = outcome.collection(), "{}", outcome);

    Ok(outcome)
}

/// Purges each collection in its own task and waits for all of them.
///
/// Failures are logged per collection and never stop the others.
pub async fn purge_all(state: &AppState, collection_names: &[String]) -> PurgeReport {
    let handles = collection_names.iter().map(|name| {
        let db = state.db.clone();
        let name = name.clone();
        tokio::spawn(async move { purge(&db, &name).await })
    });

    let joined = join_all(handles.collect::<Vec<_>>()).await;

    let results = collection_names
        .iter()
        .zip(joined)
        .map(|(name, joined)| {
            let result: Result<PurgeOutcome, PurgeError> = match joined {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => Err(e.into()),
                Err(e) => Err(e.into()),
            };

            if let Err(e) = &result {
                tracing::error!(collection = %name, error = %e, "Failed to purge collection");
            }

            CollectionResult {
                collection: name.clone(),
                result,
            }
        })
        .collect();

    PurgeReport { results }
}
