use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::{ObjectStore, RecordStore};
use crate::domain::{UserRecord, UserUpdate};
use crate::error::BackendError;

// =============================================================================
// 1. THE MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, BackendError>>;

/// An object held by the in-memory bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug)]
pub enum BackendRequest {
    Upload {
        key: String,
        object: StoredObject,
        upsert: bool,
        respond_to: Response<()>,
    },
    Insert {
        record: UserRecord,
        respond_to: Response<()>,
    },
    Update {
        email: String,
        update: UserUpdate,
        respond_to: Response<()>,
    },
    Select {
        key: String,
        respond_to: Response<UserRecord>,
    },
    #[cfg(test)]
    GetObject {
        key: String,
        respond_to: Response<Option<StoredObject>>,
    },
}

// =============================================================================
// 2. THE ACTOR
// =============================================================================

/// In-process stand-in for the managed backend.
///
/// Mirrors the server-side rules the form depends on: uploads with `upsert` replace
/// existing objects, `email` is unique, and single-row selects fail unless exactly one
/// row matches.
pub struct MemoryBackend {
    receiver: mpsc::Receiver<BackendRequest>,
    objects: HashMap<String, StoredObject>,
    rows: Vec<UserRecord>,
}

impl MemoryBackend {
    pub fn new(buffer_size: usize, bucket: impl Into<String>) -> (Self, BackendClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            objects: HashMap::new(),
            rows: Vec::new(),
        };
        (actor, BackendClient::new(sender, bucket))
    }

    #[instrument(name = "memory_backend", skip(self))]
    pub async fn run(mut self) {
        info!("MemoryBackend starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BackendRequest::Upload { key, object, upsert, respond_to } => {
                    let _ = respond_to.send(self.handle_upload(key, object, upsert));
                }
                BackendRequest::Insert { record, respond_to } => {
                    let _ = respond_to.send(self.handle_insert(record));
                }
                BackendRequest::Update { email, update, respond_to } => {
                    let _ = respond_to.send(self.handle_update(&email, &update));
                }
                BackendRequest::Select { key, respond_to } => {
                    let _ = respond_to.send(self.handle_select(&key));
                }
                #[cfg(test)]
                BackendRequest::GetObject { key, respond_to } => {
                    let _ = respond_to.send(Ok(self.objects.get(&key).cloned()));
                }
            }
        }
        info!("MemoryBackend stopped");
    }

    #[instrument(skip(self, object), fields(size = object.bytes.len()))]
    fn handle_upload(&mut self, key: String, object: StoredObject, upsert: bool) -> Result<(), BackendError> {
        if !upsert && self.objects.contains_key(&key) {
            warn!("Object already exists");
            return Err(BackendError::Rejected("The resource already exists".to_string()));
        }
        self.objects.insert(key, object);
        debug!("Object stored");
        Ok(())
    }

    #[instrument(skip(self, record), fields(email = %record.email))]
    fn handle_insert(&mut self, record: UserRecord) -> Result<(), BackendError> {
        if self.rows.iter().any(|row| row.email == record.email) {
            warn!("Duplicate email rejected");
            return Err(BackendError::Rejected(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }
        self.rows.push(record);
        info!(rows = self.rows.len(), "Row inserted");
        Ok(())
    }

    #[instrument(skip(self, update))]
    fn handle_update(&mut self, email: &str, update: &UserUpdate) -> Result<(), BackendError> {
        let mut matched = 0;
        for row in self.rows.iter_mut().filter(|row| row.email == email) {
            row.apply(update);
            matched += 1;
        }
        info!(matched, "Rows updated");
        Ok(())
    }

    #[instrument(skip(self))]
    fn handle_select(&self, key: &str) -> Result<UserRecord, BackendError> {
        let mut matches = self.rows.iter().filter(|row| row.matches_key(key));
        match (matches.next(), matches.next()) {
            (Some(row), None) => Ok(row.clone()),
            (None, _) => Err(BackendError::NotFound(key.to_string())),
            (Some(_), Some(_)) => Err(BackendError::Rejected(
                "JSON object requested, multiple (or no) rows returned".to_string(),
            )),
        }
    }
}

// =============================================================================
// 3. THE CLIENT
// =============================================================================

/// Cloneable handle to a [`MemoryBackend`]. The actor stops once every handle is dropped.
#[derive(Clone)]
pub struct BackendClient {
    sender: mpsc::Sender<BackendRequest>,
    bucket: String,
}

impl BackendClient {
    pub fn new(sender: mpsc::Sender<BackendRequest>, bucket: impl Into<String>) -> Self {
        Self { sender, bucket: bucket.into() }
    }

    async fn request<T>(&self, make: impl FnOnce(Response<T>) -> BackendRequest) -> Result<T, BackendError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| BackendError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| BackendError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    #[cfg(test)]
    pub async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, BackendError> {
        let key = key.to_string();
        self.request(|respond_to| BackendRequest::GetObject { key, respond_to }).await
    }
}

#[async_trait]
impl ObjectStore for BackendClient {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str, upsert: bool) -> Result<(), BackendError> {
        debug!("Sending request");
        let key = key.to_string();
        let object = StoredObject { bytes, content_type: content_type.to_string() };
        self.request(|respond_to| BackendRequest::Upload { key, object, upsert, respond_to }).await
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl RecordStore for BackendClient {
    #[instrument(skip(self, record), fields(email = %record.email))]
    async fn insert(&self, record: &UserRecord) -> Result<(), BackendError> {
        debug!("Sending request");
        let record = record.clone();
        self.request(|respond_to| BackendRequest::Insert { record, respond_to }).await
    }

    #[instrument(skip(self, update))]
    async fn update_by_email(&self, email: &str, update: &UserUpdate) -> Result<(), BackendError> {
        debug!("Sending request");
        let email = email.to_string();
        let update = update.clone();
        self.request(|respond_to| BackendRequest::Update { email, update, respond_to }).await
    }

    #[instrument(skip(self))]
    async fn select_one(&self, key: &str) -> Result<UserRecord, BackendError> {
        debug!("Sending request");
        let key = key.to_string();
        self.request(|respond_to| BackendRequest::Select { key, respond_to }).await
    }
}
