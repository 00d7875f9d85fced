//! Deletes every document in the configured Firestore collections.
//!
//! Run with: cargo run --bin purge [COLLECTION ...]
//!
//! Reads `PURGE_COLLECTIONS`, `GOOGLE_APPLICATION_CREDENTIALS`, `FIRESTORE_PROJECT_ID`,
//! `FIRESTORE_DATABASE` and `FIRESTORE_EMULATOR_HOST` from the environment or `.env`.

use anyhow::{bail, Context};
use firestore_purge::{
    config::{self, settings::Settings},
    modules::purge::controller,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::logging::init();

    let settings = Settings::from_env()?;
    let db = config::database::connect(&settings)
        .with_context(|| format!("Failed to initialize database from {}", settings.credential_path))?;

    let state = AppState { db };
    let report = controller::purge_all(&state, &settings.collection_names).await;

    tracing::info!(
        collections = report.results.len(),
        deleted = report.total_deleted(),
        "Purge finished"
    );

    if !report.is_success() {
        let failed: Vec<&str> = report.failed().map(|(name, _)| name).collect();
        bail!("Failed to purge {}", failed.join(", "));
    }

    Ok(())
}
