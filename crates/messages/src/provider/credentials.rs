//! Per-account credential files
//!
//! Providers persist their session secrets as a JSON file inside the
//! account directory and read them back in `initialize()`.

use anyhow::{Context, Result as AnyResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Credentials know whether they hold enough to open a session
pub trait Credentials: DeserializeOwned {
    fn is_complete(&self) -> bool;
}

/// Bearer-token credentials (desktop API style providers)
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
pub struct AccessTokenCredentials {
    #[serde(default)]
    pub access_token: String,
}

impl Credentials for AccessTokenCredentials {
    fn is_complete(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Homeserver credentials (Matrix style providers)
#[derive(Debug, Clone, Default, PartialEq, Serialize, serde::Deserialize)]
pub struct HomeserverCredentials {
    #[serde(default)]
    pub homeserver_url: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub access_token: String,
}

impl Credentials for HomeserverCredentials {
    fn is_complete(&self) -> bool {
        !self.homeserver_url.is_empty() && !self.user_id.is_empty() && !self.access_token.is_empty()
    }
}

/// A JSON credential file inside an account directory
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(account_dir: impl AsRef<Path>, filename: &str) -> Self {
        Self {
            path: account_dir.as_ref().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the credentials; `Ok(None)` when the file does not exist
    pub fn load<T: DeserializeOwned>(&self) -> AnyResult<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        config::load_json_file(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to load credentials from {}", self.path.display()))
    }

    /// Write the credentials, readable only by the owner on unix
    pub fn save<T: Serialize>(&self, credentials: &T) -> AnyResult<()> {
        if let Some(parent) = self.path.parent() {
            config::ensure_dir(parent)?;
        }
        let content =
            serde_json::to_string_pretty(credentials).context("Failed to serialize credentials")?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write credentials to {}", self.path.display()))?;
        Ok(())
    }

    /// Load credentials that must be present and complete
    pub fn require<T: Credentials>(&self) -> Result<T> {
        match self.load::<T>() {
            Ok(Some(creds)) if creds.is_complete() => Ok(creds),
            Ok(Some(_)) => Err(Error::NotConfigured(format!(
                "incomplete credentials in {}",
                self.path.display()
            ))),
            Ok(None) => Err(Error::NotConfigured(format!(
                "no credentials found at {}",
                self.path.display()
            ))),
            Err(e) => Err(Error::NotConfigured(format!("{e:#}"))),
        }
    }
}
