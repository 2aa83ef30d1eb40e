use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::domain::{UserRecord, UserUpdate};
use crate::error::FormError;

/// Editable form fields, all kept as text for input binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub username: String,
    pub name: String,
    pub email: String,
    pub age: String,
    pub profile_url: String,
}

/// Fields the user can type into. `profile_url` is only ever set by an upload or a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Name,
    Email,
    Age,
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(Field::Username),
            "name" => Ok(Field::Name),
            "email" => Ok(Field::Email),
            "age" => Ok(Field::Age),
            other => Err(format!("Unknown field: {}", other)),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Name => "name",
            Field::Email => "email",
            Field::Age => "age",
        };
        f.write_str(name)
    }
}

impl FormState {
    /// Fills the form from a fetched record. Age becomes its decimal text, absent values "".
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            username: record.username.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            age: record.age.map(|age| age.to_string()).unwrap_or_default(),
            profile_url: record.profile_url.clone(),
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Username => self.username = value,
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::Age => self.age = value,
        }
    }

    /// Builds the row to insert, enforcing the required-field contract.
    ///
    /// # Errors
    /// Returns [`FormError::Validation`] when username or email is blank, the email is not
    /// shaped like an address, or the age is not a non-negative whole number.
    pub fn to_new_record(&self, profile_url: String) -> Result<UserRecord, FormError> {
        if self.username.trim().is_empty() {
            return Err(FormError::validation("Username is required"));
        }
        if self.email.trim().is_empty() {
            return Err(FormError::validation("Email is required"));
        }
        if !looks_like_email(&self.email) {
            return Err(FormError::validation(format!("'{}' is not a valid email address", self.email)));
        }
        Ok(UserRecord {
            username: self.username.trim().to_string(),
            name: self.name.clone(),
            email: self.email.trim().to_string(),
            age: parse_age(&self.age)?,
            profile_url,
        })
    }

    /// Builds the update payload for the record keyed by `self.email`.
    pub fn to_update(&self, profile_url: String) -> Result<UserUpdate, FormError> {
        Ok(UserUpdate {
            username: self.username.clone(),
            name: self.name.clone(),
            age: parse_age(&self.age)?,
            profile_url,
        })
    }
}

/// Converts the age text to a number at submission time. Blank means null.
pub fn parse_age(text: &str) -> Result<Option<u32>, FormError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<u32>()
        .map(Some)
        .map_err(|_| FormError::validation("Age must be a non-negative whole number"))
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// An image chosen by the user but not uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Extension of the original file name, if it has one.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name).extension().and_then(|ext| ext.to_str())
    }

    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

impl fmt::Debug for PendingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The lookup box: the key being typed, the record last fetched and the status line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupState {
    pub key: String,
    pub record: Option<UserRecord>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Fetching,
    Updating,
}

/// Everything the presentation layer needs to draw the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSnapshot {
    pub form: FormState,
    pub lookup: LookupState,
    pub pending_file: Option<String>,
    pub phase: Phase,
}
