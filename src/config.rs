use clap::Parser;

use crate::backend::SupabaseConfig;

/// User biodata form - create, look up and update user records
#[derive(Parser, Debug, Clone)]
#[command(name = "biodata_form", version, about, long_about = None)]
pub struct Cli {
    /// Project URL of the hosted backend (e.g., https://xyz.supabase.co)
    #[arg(long = "url", env = "SUPABASE_URL")]
    pub url: Option<String>,

    /// Public (anon) API key
    #[arg(long = "anon-key", env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Storage bucket for profile images
    #[arg(long = "bucket", env = "SUPABASE_BUCKET", default_value = "avatars")]
    pub bucket: String,

    /// Table holding user rows
    #[arg(long = "table", env = "SUPABASE_TABLE", default_value = "users")]
    pub table: String,

    /// Keep everything in memory instead of talking to the hosted backend (url and key are ignored)
    #[arg(long = "offline")]
    pub offline: bool,
}

/// Which backend the form talks to.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendChoice {
    Hosted(SupabaseConfig),
    Memory { bucket: String },
}

impl Cli {
    /// Resolves the backend, failing when the hosted backend is missing its credentials.
    pub fn backend(&self) -> Result<BackendChoice, String> {
        if self.offline {
            return Ok(BackendChoice::Memory { bucket: self.bucket.clone() });
        }
        let url = self
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or("Backend URL missing: pass --url or set SUPABASE_URL (or use --offline)")?;
        let anon_key = self
            .anon_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or("API key missing: pass --anon-key or set SUPABASE_ANON_KEY (or use --offline)")?;

        Ok(BackendChoice::Hosted(
            SupabaseConfig::new(url, anon_key)
                .with_bucket(self.bucket.clone())
                .with_table(self.table.clone()),
        ))
    }
}
