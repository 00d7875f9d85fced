use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

pub const DEFAULT_COLLECTIONS: &str = "events,event_prices";
pub const DEFAULT_CREDENTIAL_PATH: &str = "service-account.json";
pub const DEFAULT_DATABASE_ID: &str = "(default)";
pub const DEFAULT_EMULATOR_PROJECT: &str = "demo-project";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, Validate)]
pub struct Settings {
    #[validate(
        length(min = 1, message = "At least one collection is required"),
        custom(function = validate_collection_names)
    )]
    pub collection_names: Vec<String>,
    #[validate(length(min = 1, message = "Credential path cannot be empty"))]
    pub credential_path: String,
    pub project_id: Option<String>,
    #[validate(length(min = 1, message = "Database id cannot be empty"))]
    pub database_id: String,
    pub emulator_host: Option<String>,
}

#[allow(clippy::ptr_arg)]
fn validate_collection_names(names: &Vec<String>) -> Result<(), ValidationError> {
    if names.iter().any(|name| name.trim().is_empty()) {
        let mut err = ValidationError::new("blank_collection");
        err.message = Some("Collection names cannot be blank".into());
        return Err(err);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Settings {
    /// Reads the process environment; positional arguments replace `PURGE_COLLECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), env::args().skip(1).collect())
    }

    pub fn from_lookup<F>(lookup: F, args: Vec<String>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let collection_names = if args.is_empty() {
            lookup("PURGE_COLLECTIONS")
                .unwrap_or_else(|| DEFAULT_COLLECTIONS.to_string())
                .split(',')
                .map(|name| name.trim().to_string())
                .collect()
        } else {
            args.iter().map(|name| name.trim().to_string()).collect()
        };

        let settings = Self {
            collection_names,
            credential_path: lookup("GOOGLE_APPLICATION_CREDENTIALS")
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_PATH.to_string()),
            project_id: non_empty(lookup("FIRESTORE_PROJECT_ID")),
            database_id: lookup("FIRESTORE_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
            emulator_host: non_empty(lookup("FIRESTORE_EMULATOR_HOST")),
        };

        settings.validate()?;
        Ok(settings)
    }
}
