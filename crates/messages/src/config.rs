//! Account configuration
//!
//! Accounts are kept in `config.json` inside the messages config directory:
//!
//! ```json
//! {
//!   "default": "personal",
//!   "accounts": {
//!     "personal": { "provider": "beeper", "read": true, "write": false }
//!   }
//! }
//! ```
//!
//! Each account owns `accounts/<name>/` for its credentials and store file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::storage::DATABASE_FILE;

/// Accounts config filename in the messages config directory
pub const CONFIG_FILE: &str = "config.json";

/// Messaging provider an account is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Beeper,
    Matrix,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Beeper => "beeper",
            ProviderKind::Matrix => "matrix",
        }
    }

    /// Name of the credential file the provider keeps in its account directory
    pub fn credentials_file(&self) -> &'static str {
        match self {
            ProviderKind::Beeper => "beeper_credentials.json",
            ProviderKind::Matrix => "matrix_credentials.json",
        }
    }
}

/// One configured account and its permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub provider: ProviderKind,
    /// Allows syncing history into the local store
    #[serde(default)]
    pub read: bool,
    /// Allows sending messages through the provider
    #[serde(default)]
    pub write: bool,
}

impl AccountConfig {
    pub fn new(provider: ProviderKind, read: bool, write: bool) -> Self {
        Self {
            provider,
            read,
            write,
        }
    }
}

/// All configured accounts plus the default selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Base directory; not persisted
    #[serde(skip)]
    dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

impl AccountsConfig {
    /// Load from the shared config directory (honours `MESSAGES_DIR`)
    pub fn load_default() -> Result<Self> {
        let dir = config::config_dir().context("Could not determine config directory")?;
        Self::load(dir)
    }

    /// Load `config.json` from `dir`; a missing file yields an empty config
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(CONFIG_FILE);

        let mut cfg: AccountsConfig = if path.exists() {
            config::load_json_file(&path)?
        } else {
            AccountsConfig::default()
        };
        cfg.dir = dir;
        Ok(cfg)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Write `config.json`, creating the directory if needed
    pub fn save(&self) -> Result<()> {
        config::save_json_file(&self.config_path(), self)
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if let Some(default) = &self.default
            && !self.accounts.contains_key(default)
        {
            bail!("default account {:?} not found in accounts", default);
        }
        Ok(())
    }

    /// Resolve an account by name, falling back to the default account
    pub fn get_account(&self, name: Option<&str>) -> Result<(String, AccountConfig)> {
        let name = match name.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => self
                .default
                .as_deref()
                .context("no account specified and no default set")?,
        };

        let account = self
            .accounts
            .get(name)
            .with_context(|| format!("account {:?} not found", name))?;
        Ok((name.to_string(), account.clone()))
    }

    /// Add or replace an account; the first account becomes the default
    pub fn add_account(&mut self, name: impl Into<String>, account: AccountConfig) {
        let name = name.into();
        if self.default.is_none() {
            self.default = Some(name.clone());
        }
        self.accounts.insert(name, account);
    }

    /// Remove an account and delete its directory (credentials and store)
    pub fn remove_account(&mut self, name: &str) -> Result<AccountConfig> {
        let account = self
            .accounts
            .remove(name)
            .with_context(|| format!("account {:?} not found", name))?;

        if self.default.as_deref() == Some(name) {
            self.default = None;
        }

        let dir = self.account_dir(name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to remove account directory: {}", dir.display()))?;
        }
        log::info!("[CONFIG] Removed account {}", name);
        Ok(account)
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.accounts.contains_key(name) {
            bail!("account {:?} not found", name);
        }
        self.default = Some(name.to_string());
        Ok(())
    }

    /// Directory holding one account's credentials and store
    pub fn account_dir(&self, name: &str) -> PathBuf {
        self.dir.join("accounts").join(name)
    }

    /// Path of one account's store file
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.account_dir(name).join(DATABASE_FILE)
    }
}
