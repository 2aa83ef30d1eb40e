//! The form's state and the three user actions that drive it.
//!
//! Every action runs to completion before the next one starts (`&mut self`), and each
//! state change is published as a [`FormSnapshot`] for the presentation layer.

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::domain::{Field, FormSnapshot, FormState, LookupState, PendingFile, Phase, UserRecord, UserUpdate};
use crate::error::{BackendError, FormError};
use crate::repository::UserRepository;
use crate::uploader::{ImageUploader, UploadOutcome};

pub const FETCH_KEY_REQUIRED: &str = "Please enter username or email to fetch";
pub const FETCHING: &str = "Fetching...";
pub const EMAIL_REQUIRED_FOR_UPDATE: &str = "Email is required to update user";
pub const USER_CREATED: &str = "User created!";
pub const USER_UPDATED: &str = "User updated!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

/// A modal message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: AlertKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: AlertKind::Error, message: message.into() }
    }
}

impl From<FormError> for Alert {
    fn from(e: FormError) -> Self {
        Alert::error(e.to_string())
    }
}

pub struct FormController {
    uploader: ImageUploader,
    repository: UserRepository,
    form: FormState,
    lookup: LookupState,
    pending: Option<PendingFile>,
    phase: Phase,
    view: watch::Sender<FormSnapshot>,
}

impl FormController {
    pub fn new(uploader: ImageUploader, repository: UserRepository) -> Self {
        let (view, _) = watch::channel(FormSnapshot::default());
        Self {
            uploader,
            repository,
            form: FormState::default(),
            lookup: LookupState::default(),
            pending: None,
            phase: Phase::Idle,
            view,
        }
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            form: self.form.clone(),
            lookup: self.lookup.clone(),
            pending_file: self.pending.as_ref().map(|f| f.name.clone()),
            phase: self.phase,
        }
    }

    #[allow(dead_code)]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn lookup(&self) -> &LookupState {
        &self.lookup
    }

    #[allow(dead_code)]
    pub fn pending_file(&self) -> Option<&PendingFile> {
        self.pending.as_ref()
    }

    fn publish(&self) {
        self.view.send_replace(self.snapshot());
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.publish();
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.form.set(field, value);
        self.publish();
    }

    /// Replaces any previously selected file.
    pub fn select_file(&mut self, file: PendingFile) {
        self.pending = Some(file);
        self.publish();
    }

    pub fn clear_file(&mut self) {
        self.pending = None;
        self.publish();
    }

    pub fn set_lookup_key(&mut self, key: impl Into<String>) {
        self.lookup.key = key.into();
        self.publish();
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// "Create User": upload the pending image if any, then insert the row.
    ///
    /// On success the form, the pending file and the loaded record are cleared. On failure
    /// the form is left as the user typed it.
    #[instrument(skip(self))]
    pub async fn create(&mut self) -> Alert {
        let result = self.submit_new().await;
        self.set_phase(Phase::Idle);

        match result {
            Ok(()) => {
                info!(username = %self.form.username, email = %self.form.email, "User created");
                self.form = FormState::default();
                self.pending = None;
                self.lookup.record = None;
                self.publish();
                Alert::success(USER_CREATED)
            }
            Err(e) => {
                error!(error = %e, "Create failed");
                e.into()
            }
        }
    }

    async fn submit_new(&mut self) -> Result<(), FormError> {
        // Validation happens before anything leaves the process.
        let draft = self.form.to_new_record(String::new())?;
        self.set_phase(Phase::Submitting);

        let profile_url = self.resolve_profile_url().await.map_err(FormError::Upload)?;
        let record = UserRecord { profile_url, ..draft };
        self.repository.insert(&record).await.map_err(FormError::Insert)
    }

    /// "Fetch User": load the record whose username or email equals the lookup key.
    ///
    /// A miss and a read failure look the same to the user: "User not found", the loaded
    /// record dropped and the form cleared.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), FormError> {
        let key = self.lookup.key.trim().to_string();
        if key.is_empty() {
            self.lookup.message = FETCH_KEY_REQUIRED.to_string();
            self.publish();
            return Err(FormError::validation(FETCH_KEY_REQUIRED));
        }

        self.lookup.message = FETCHING.to_string();
        self.set_phase(Phase::Fetching);

        let found = match self.repository.find_one(&key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Lookup failed");
                None
            }
        };
        self.phase = Phase::Idle;

        let result = match found {
            Some(record) => {
                info!(username = %record.username, "User found");
                self.form = FormState::from_record(&record);
                self.lookup.record = Some(record);
                self.lookup.message.clear();
                self.pending = None;
                Ok(())
            }
            None => {
                info!("User not found");
                self.form = FormState::default();
                self.lookup.record = None;
                self.lookup.message = FormError::NotFound.to_string();
                self.pending = None;
                Err(FormError::NotFound)
            }
        };
        self.publish();
        result
    }

    /// "Update User": upload the pending image if any, write the row keyed by the form's
    /// email, then read it back through [`fetch`](Self::fetch).
    #[instrument(skip(self))]
    pub async fn update(&mut self) -> Alert {
        let result = self.submit_update().await;
        self.set_phase(Phase::Idle);

        match result {
            Ok(()) => {
                info!(email = %self.form.email, "User updated");
                // The write response does not echo the stored row.
                let _ = self.fetch().await;
                self.pending = None;
                self.publish();
                Alert::success(USER_UPDATED)
            }
            Err(e) => {
                error!(error = %e, "Update failed");
                e.into()
            }
        }
    }

    async fn submit_update(&mut self) -> Result<(), FormError> {
        if self.form.email.trim().is_empty() {
            return Err(FormError::validation(EMAIL_REQUIRED_FOR_UPDATE));
        }
        let draft = self.form.to_update(String::new())?;
        self.set_phase(Phase::Updating);

        let profile_url = self.resolve_profile_url().await.map_err(FormError::Upload)?;
        let update = UserUpdate { profile_url, ..draft };
        self.repository
            .update_by_email(self.form.email.trim(), &update)
            .await
            .map_err(FormError::Update)
    }

    async fn resolve_profile_url(&self) -> Result<String, BackendError> {
        match self.uploader.upload_image(self.pending.as_ref(), &self.form.profile_url).await {
            UploadOutcome::NoChange(url) | UploadOutcome::Uploaded(url) => Ok(url),
            UploadOutcome::Failed(e) => Err(e),
        }
    }
}
