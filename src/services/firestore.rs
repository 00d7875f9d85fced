use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::modules::purge::model::{CollectionRef, DocumentSnapshot, WriteBatch};
use crate::services::auth::{AuthError, Authenticator};

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Authentication failed: {0}")]
    AuthError(#[from] AuthError),
    /// `status` is the HTTP status, or the RPC code of an error carried inside a stream.
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    structured_query: StructuredQuery<'a>,
}

#[derive(Debug, Serialize)]
struct StructuredQuery<'a> {
    from: Vec<CollectionSelector<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector<'a> {
    collection_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<RawDocument>,
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
    update_time: Option<String>,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    writes: Vec<DeleteWrite<'a>>,
}

#[derive(Debug, Serialize)]
struct DeleteWrite<'a> {
    delete: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
    #[serde(default)]
    write_results: Vec<serde_json::Value>,
    commit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<u16>,
    message: String,
}

impl ApiErrorDetail {
    fn into_error(self, status: u16) -> FirestoreError {
        FirestoreError::ApiError {
            status,
            message: self.message,
        }
    }
}

/// Error bodies come as an object, or as a one-element array from streaming methods.
fn parse_error_body(status: u16, body: &str) -> FirestoreError {
    if let Ok(error_response) = serde_json::from_str::<ApiErrorResponse>(body) {
        return error_response.error.into_error(status);
    }
    if let Ok(mut responses) = serde_json::from_str::<Vec<ApiErrorResponse>>(body) {
        if !responses.is_empty() {
            return responses.remove(0).error.into_error(status);
        }
    }
    FirestoreError::ApiError {
        status,
        message: body.to_string(),
    }
}

/// Handle to one Firestore database, talking to the REST API.
///
/// Cloning is cheap: clones share the HTTP connection pool and the token cache.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    database_path: String,
    auth: Authenticator,
}

impl FirestoreClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        project_id: &str,
        database_id: &str,
        auth: Authenticator,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            database_path: format!("projects/{}/databases/{}", project_id, database_id),
            auth,
        }
    }

    /// `projects/{project}/databases/{database}`
    pub fn database_path(&self) -> &str {
        &self.database_path
    }

    pub fn collection(&self, name: &str) -> CollectionRef {
        CollectionRef::new(&self.database_path, name)
    }

    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch::new(self)
    }

    /// Reads every document of a collection in one unpaginated query.
    pub async fn list_documents(
        &self,
        collection: &CollectionRef,
    ) -> Result<Vec<DocumentSnapshot>, FirestoreError> {
        let request = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection.id(),
                }],
            },
        };

        let items: Vec<RunQueryItem> = self.post("runQuery", &request).await?;

        // A stream that fails part way still answers 200, with the error as an element.
        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            if let Some(error) = item.error {
                let code = error.code.unwrap_or(500);
                return Err(error.into_error(code));
            }
            if let Some(doc) = item.document {
                docs.push(DocumentSnapshot::from_parts(
                    doc.name,
                    doc.fields,
                    doc.update_time.as_deref(),
                ));
            }
        }

        Ok(docs)
    }

    /// Applies all deletes atomically. Returns the number of writes applied.
    pub(crate) async fn commit_deletes(&self, names: &[String]) -> Result<usize, FirestoreError> {
        let request = CommitRequest {
            writes: names
                .iter()
                .map(|name| DeleteWrite { delete: name })
                .collect(),
        };

        let response: CommitResponse = self.post("commit", &request).await?;

        tracing::debug!(
            writes = names.len(),
            commit_time = response.commit_time.as_deref().unwrap_or("unknown"),
            "Batch committed"
        );

        if response.write_results.is_empty() {
            Ok(names.len())
        } else {
            Ok(response.write_results.len())
        }
    }

    async fn post<T, R>(&self, action: &str, body: &T) -> Result<R, FirestoreError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let token = self.auth.bearer_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v1/{}/documents:{}",
                self.base_url, self.database_path, action
            ))
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(parse_error_body(status, &error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| FirestoreError::InvalidResponse(e.to_string()))
    }
}
