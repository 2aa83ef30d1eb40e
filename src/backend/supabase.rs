use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{ObjectStore, RecordStore};
use crate::domain::{UserRecord, UserUpdate};
use crate::error::BackendError;

/// Media type that makes the REST endpoint answer with a single object, or fail.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
/// Error code the REST endpoint uses when a single-object request matched 0 or 2+ rows.
const CARDINALITY_VIOLATION: &str = "PGRST116";

/// Where the hosted backend lives and which bucket/table the form uses.
#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
    pub table: String,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            bucket: "avatars".to_string(),
            table: "users".to_string(),
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn base(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base(), self.bucket, key)
    }

    fn public_object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base(), self.bucket, key)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.table)
    }
}

/// HTTP adapter for the hosted storage and REST APIs.
///
/// No timeout is configured: a hung call hangs the action that issued it.
#[derive(Clone)]
pub struct SupabaseBackend {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseBackend {
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.anon_key))
    }

    fn upload_request(&self, key: &str, bytes: Vec<u8>, content_type: &str, upsert: bool) -> RequestBuilder {
        self.request(Method::POST, &self.config.object_url(key))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes)
    }

    fn insert_request(&self, record: &UserRecord) -> RequestBuilder {
        self.request(Method::POST, &self.config.table_url())
            .header("Prefer", "return=minimal")
            .json(&[record])
    }

    fn update_request(&self, email: &str, update: &UserUpdate) -> RequestBuilder {
        self.request(Method::PATCH, &self.config.table_url())
            .query(&[("email", format!("eq.{}", email))])
            .header("Prefer", "return=minimal")
            .json(update)
    }

    fn select_request(&self, key: &str) -> RequestBuilder {
        let value = quote_filter_value(key);
        self.request(Method::GET, &self.config.table_url())
            .query(&[
                ("select", "*".to_string()),
                ("or", format!("(email.eq.{value},username.eq.{value})")),
            ])
            .header(ACCEPT, SINGLE_OBJECT)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = %status, error = %e, "Could not read error body");
                String::new()
            }
        };
        let error = classify_error(status, &body);
        warn!(status = %status, error = %error, "Backend rejected request");
        Err(error)
    }
}

#[async_trait]
impl ObjectStore for SupabaseBackend {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str, upsert: bool) -> Result<(), BackendError> {
        debug!("Sending request");
        self.send(self.upload_request(key, bytes, content_type, upsert)).await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.config.public_object_url(key)
    }
}

#[async_trait]
impl RecordStore for SupabaseBackend {
    #[instrument(skip(self, record), fields(email = %record.email))]
    async fn insert(&self, record: &UserRecord) -> Result<(), BackendError> {
        debug!("Sending request");
        self.send(self.insert_request(record)).await?;
        Ok(())
    }

    #[instrument(skip(self, update))]
    async fn update_by_email(&self, email: &str, update: &UserUpdate) -> Result<(), BackendError> {
        debug!("Sending request");
        self.send(self.update_request(email, update)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn select_one(&self, key: &str) -> Result<UserRecord, BackendError> {
        debug!("Sending request");
        let response = self.send(self.select_request(key)).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Failed to parse row: {}", e)))
    }
}

/// Wraps a filter value in double quotes so `,` `.` `(` `)` inside it stay literal.
fn quote_filter_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Error body shapes used by the storage and REST endpoints.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    code: Option<String>,
    details: Option<String>,
}

fn classify_error(status: StatusCode, body: &str) -> BackendError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    if let Some(parsed) = &parsed {
        let zero_rows = parsed.code.as_deref() == Some(CARDINALITY_VIOLATION)
            && parsed.details.as_deref().is_some_and(|d| d.contains(" 0 rows"));
        if zero_rows {
            return BackendError::NotFound(parsed.details.clone().unwrap_or_default());
        }
    }

    let message = parsed
        .and_then(|p| p.message.or(p.error).or(p.msg))
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        BackendError::Rejected(status.to_string())
    } else {
        BackendError::Rejected(message)
    }
}
