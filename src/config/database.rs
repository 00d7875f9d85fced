use reqwest::Client;
use std::sync::Arc;

use crate::config::credentials::{CredentialError, ServiceAccountKey};
use crate::config::settings::{Settings, DEFAULT_EMULATOR_PROJECT};
use crate::services::auth::{Authenticator, TokenProvider};
use crate::services::firestore::{FirestoreClient, FIRESTORE_BASE_URL};

/// Builds the database handle. With an emulator host set, no credential is read.
pub fn connect(settings: &Settings) -> Result<FirestoreClient, CredentialError> {
    let http = Client::new();

    if let Some(host) = &settings.emulator_host {
        let project_id = settings
            .project_id
            .as_deref()
            .unwrap_or(DEFAULT_EMULATOR_PROJECT);

        tracing::info!(host = %host, project_id, "Using Firestore emulator");

        return Ok(FirestoreClient::new(
            http,
            format!("http://{}", host),
            project_id,
            &settings.database_id,
            Authenticator::Emulator,
        ));
    }

    let key = ServiceAccountKey::from_file(&settings.credential_path)?;
    let provider = TokenProvider::new(http.clone(), key)?;
    let project_id = settings
        .project_id
        .clone()
        .unwrap_or_else(|| provider.project_id().to_string());

    tracing::info!(project_id = %project_id, database = %settings.database_id, "Connecting to Firestore");

    Ok(FirestoreClient::new(
        http,
        FIRESTORE_BASE_URL,
        &project_id,
        &settings.database_id,
        Authenticator::ServiceAccount(Arc::new(provider)),
    ))
}
