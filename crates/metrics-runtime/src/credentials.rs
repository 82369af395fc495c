//! Service account credential resolution.
//!
//! A key file in the working directory wins; otherwise the JSON key blob is
//! read from the first non-empty variable in [`KEY_ENV_VARS`].

use std::fmt;
use std::path::{Path, PathBuf};

use metrics_core::error::{MetricsError, Result};
use serde::Deserialize;
use tracing::debug;

/// Environment variables holding a JSON service account key, in lookup order.
pub const KEY_ENV_VARS: &[&str] = &["GOOGLE_SERVICE_KEY", "GOOGLE_SHEETS_API_KEY"];

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// ── ServiceAccountKey ─────────────────────────────────────────────────────────

/// The fields of a service account key file that the token exchange needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse and sanity-check a JSON key blob.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| MetricsError::InvalidCredentials(e.to_string()))?;
        if key.client_email.trim().is_empty() {
            return Err(MetricsError::InvalidCredentials(
                "client_email is empty".to_string(),
            ));
        }
        if !key.private_key.contains("PRIVATE KEY") {
            return Err(MetricsError::InvalidCredentials(
                "private_key is not a PEM key".to_string(),
            ));
        }
        Ok(key)
    }
}

// ── Credentials ───────────────────────────────────────────────────────────────

/// Where a key was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Env(&'static str),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => write!(f, "file {}", path.display()),
            CredentialSource::Env(name) => write!(f, "${}", name),
        }
    }
}

/// A resolved service account key and its origin.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key: ServiceAccountKey,
    pub source: CredentialSource,
}

/// Resolve credentials from `key_file` or the process environment.
pub fn resolve_credentials(key_file: &Path) -> Result<Credentials> {
    resolve_credentials_with(key_file, |name| std::env::var(name).ok())
}

/// Same as [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_credentials_with(
    key_file: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    if key_file.is_file() {
        let content =
            std::fs::read_to_string(key_file).map_err(|source| MetricsError::FileRead {
                path: key_file.to_path_buf(),
                source,
            })?;
        let key = ServiceAccountKey::from_json(&content)?;
        debug!("Using service account key from {}", key_file.display());
        return Ok(Credentials {
            key,
            source: CredentialSource::File(key_file.to_path_buf()),
        });
    }

    for &name in KEY_ENV_VARS {
        let Some(blob) = lookup(name).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let key = ServiceAccountKey::from_json(&blob)?;
        debug!("Using service account key from ${}", name);
        return Ok(Credentials {
            key,
            source: CredentialSource::Env(name),
        });
    }

    Err(MetricsError::CredentialsNotFound {
        path: key_file.to_path_buf(),
        env_vars: KEY_ENV_VARS.join(" / $"),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
