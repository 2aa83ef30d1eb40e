use serde::{Deserialize, Deserializer, Serialize};

/// A user biodata row as stored by the backend.
///
/// The local copy is a snapshot: nothing keeps it in sync with the remote row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub profile_url: String,
}

/// Fields written by an update. `email` is the filter and never part of the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUpdate {
    pub username: String,
    pub name: String,
    pub age: Option<u32>,
    pub profile_url: String,
}

impl UserRecord {
    /// Creates a record with no age and no profile image.
    #[allow(dead_code)]
    pub fn new(username: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: name.into(),
            email: email.into(),
            age: None,
            profile_url: String::new(),
        }
    }

    #[allow(dead_code)]
    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    #[allow(dead_code)]
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = url.into();
        self
    }

    /// Applies an update the way the backend does: every field except `email` is replaced.
    pub fn apply(&mut self, update: &UserUpdate) {
        self.username = update.username.clone();
        self.name = update.name.clone();
        self.age = update.age;
        self.profile_url = update.profile_url.clone();
    }

    /// True when `key` equals either the username or the email.
    pub fn matches_key(&self, key: &str) -> bool {
        self.username == key || self.email == key
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
