//! # Mock Framework
//!
//! Utilities for testing the uploader, repository and controller without a backend.
//!
//! Use [`create_mock_backend`] to get a [`BackendClient`] and the receiver its requests
//! land on. Then use helpers like [`expect_insert`] or [`expect_select`] to assert each
//! request and answer it through its responder.

use tokio::sync::mpsc;

use crate::backend::{BackendClient, BackendRequest, Response, StoredObject};
use crate::domain::{UserRecord, UserUpdate};

/// Creates a mock client and a receiver for asserting requests.
///
/// The client is the same handle the in-memory backend hands out, so code under test cannot
/// tell the difference. Nothing answers unless the test does, which makes ordering and
/// "no request was sent" both observable.
pub fn create_mock_backend(buffer_size: usize) -> (BackendClient, mpsc::Receiver<BackendRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (BackendClient::new(sender, "avatars"), receiver)
}

/// Helper to verify that the next message is an Upload request
pub async fn expect_upload(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(String, StoredObject, bool, Response<()>)> {
    match receiver.recv().await {
        Some(BackendRequest::Upload { key, object, upsert, respond_to }) => Some((key, object, upsert, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Insert request
pub async fn expect_insert(receiver: &mut mpsc::Receiver<BackendRequest>) -> Option<(UserRecord, Response<()>)> {
    match receiver.recv().await {
        Some(BackendRequest::Insert { record, respond_to }) => Some((record, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(String, UserUpdate, Response<()>)> {
    match receiver.recv().await {
        Some(BackendRequest::Update { email, update, respond_to }) => Some((email, update, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Select request
pub async fn expect_select(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(String, Response<UserRecord>)> {
    match receiver.recv().await {
        Some(BackendRequest::Select { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordStore;

    #[tokio::test]
    async fn test_mock_backend() {
        let (client, mut receiver) = create_mock_backend(10);

        let select_task = tokio::spawn(async move { client.select_one("alice").await });

        let (key, responder) = expect_select(&mut receiver).await.expect("Expected Select request");
        assert_eq!(key, "alice");
        let record = UserRecord::new("alice", "", "a@x.com");
        responder.send(Ok(record.clone())).unwrap();

        assert_eq!(select_task.await.unwrap(), Ok(record));
    }
}
