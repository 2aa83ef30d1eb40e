//! The managed backend as seen from the form: an object store for images and a record
//! store for user rows.
//!
//! Both are black boxes. [`SupabaseBackend`] talks to the hosted service over HTTP,
//! [`MemoryBackend`] is an in-process actor used for offline runs and tests.

pub mod memory;
pub mod supabase;

pub use memory::*;
pub use supabase::*;

use async_trait::async_trait;

use crate::domain::{UserRecord, UserUpdate};
use crate::error::BackendError;

/// Bucket-style storage for uploaded images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`. With `upsert` an existing object is replaced instead of
    /// rejected.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError>;

    /// Publicly reachable URL of `key`. Always resolvable once uploaded.
    fn public_url(&self, key: &str) -> String;
}

/// The `users` table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: &UserRecord) -> Result<(), BackendError>;

    /// Updates every row whose email equals `email`. Matching nothing is not an error.
    async fn update_by_email(&self, email: &str, update: &UserUpdate) -> Result<(), BackendError>;

    /// Returns the single row whose username or email equals `key`.
    ///
    /// # Errors
    /// [`BackendError::NotFound`] when nothing matches; a backend error when more than one
    /// row matches.
    async fn select_one(&self, key: &str) -> Result<UserRecord, BackendError>;
}
