use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::backend::RecordStore;
use crate::domain::{UserRecord, UserUpdate};
use crate::error::BackendError;

/// Typed access to the `users` record store.
#[derive(Clone)]
pub struct UserRepository {
    inner: Arc<dyn RecordStore>,
}

impl UserRepository {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self { inner }
    }

    /// Writes a new row. No local duplicate check; the backend decides.
    #[instrument(skip(self, record), fields(username = %record.username, email = %record.email))]
    pub async fn insert(&self, record: &UserRecord) -> Result<(), BackendError> {
        debug!("Sending request");
        self.inner.insert(record).await?;
        info!("User inserted");
        Ok(())
    }

    /// Looks a user up by username or email. A miss is `Ok(None)`.
    #[instrument(skip(self))]
    pub async fn find_one(&self, key: &str) -> Result<Option<UserRecord>, BackendError> {
        debug!("Sending request");
        match self.inner.select_one(key).await {
            Ok(record) => Ok(Some(record)),
            Err(BackendError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces username, name, age and profile URL of the row keyed by `email`.
    /// Last writer wins.
    #[instrument(skip(self, update))]
    pub async fn update_by_email(&self, email: &str, update: &UserUpdate) -> Result<(), BackendError> {
        debug!("Sending request");
        self.inner.update_by_email(email, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::{create_mock_backend, expect_insert, expect_select, expect_update};

    #[tokio::test]
    async fn test_find_one_maps_not_found_to_none() {
        let (client, mut receiver) = create_mock_backend(10);
        let repo = UserRepository::new(Arc::new(client));

        let task = tokio::spawn(async move { repo.find_one("ghost").await });
        let (key, responder) = expect_select(&mut receiver).await.expect("Expected Select");
        assert_eq!(key, "ghost");
        responder.send(Err(BackendError::NotFound("ghost".to_string()))).unwrap();

        assert_eq!(task.await.unwrap(), Ok(None));
    }

    #[tokio::test]
    async fn test_find_one_passes_backend_errors_through() {
        let (client, mut receiver) = create_mock_backend(10);
        let repo = UserRepository::new(Arc::new(client));

        let task = tokio::spawn(async move { repo.find_one("bob").await });
        let (_, responder) = expect_select(&mut receiver).await.expect("Expected Select");
        responder.send(Err(BackendError::Network("connection reset".to_string()))).unwrap();

        assert_eq!(task.await.unwrap(), Err(BackendError::Network("connection reset".to_string())));
    }

    #[tokio::test]
    async fn test_insert_surfaces_rejection_verbatim() {
        let (client, mut receiver) = create_mock_backend(10);
        let repo = UserRepository::new(Arc::new(client));

        let task = tokio::spawn(async move {
            repo.insert(&UserRecord::new("alice", "", "a@x.com")).await
        });
        let (record, responder) = expect_insert(&mut receiver).await.expect("Expected Insert");
        assert_eq!(record.username, "alice");
        responder.send(Err(BackendError::Rejected("value too long".to_string()))).unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "value too long");
    }

    #[tokio::test]
    async fn test_update_by_email() {
        let (client, mut receiver) = create_mock_backend(10);
        let repo = UserRepository::new(Arc::new(client));

        let task = tokio::spawn(async move {
            let update = UserUpdate {
                username: "alice".to_string(),
                name: "Alice".to_string(),
                age: Some(31),
                profile_url: String::new(),
            };
            repo.update_by_email("a@x.com", &update).await
        });
        let (email, update, responder) = expect_update(&mut receiver).await.expect("Expected Update");
        assert_eq!(email, "a@x.com");
        assert_eq!(update.age, Some(31));
        responder.send(Ok(())).unwrap();

        assert_eq!(task.await.unwrap(), Ok(()));
    }
}
