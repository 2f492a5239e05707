//! Error types for sync, send and storage operations

use thiserror::Error;

use crate::models::ConversationId;

/// Permission an account must hold for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Read => f.write_str("read"),
            Permission::Write => f.write_str("write"),
        }
    }
}

/// Errors surfaced by the manager, the sync engine and providers
#[derive(Debug, Error)]
pub enum Error {
    /// The account is not allowed to perform the operation
    #[error("account does not have {0} permission")]
    PermissionDenied(Permission),

    /// Provider credentials are missing or incomplete
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// The provider could not produce a full snapshot
    #[error("failed to fetch from provider")]
    FetchFailed(#[source] anyhow::Error),

    /// The provider rejected an outbound message
    #[error("failed to send message to conversation {conversation_id}")]
    SendFailed {
        conversation_id: ConversationId,
        #[source]
        source: anyhow::Error,
    },

    /// Persistence layer failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Wrap a provider transport error as a fetch failure
    pub fn fetch_failed(source: impl Into<anyhow::Error>) -> Self {
        Self::FetchFailed(source.into())
    }

    /// Wrap a provider rejection as a send failure
    pub fn send_failed(conversation_id: &ConversationId, source: impl Into<anyhow::Error>) -> Self {
        Self::SendFailed {
            conversation_id: conversation_id.clone(),
            source: source.into(),
        }
    }
}

/// Errors produced by the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error outside of a specific row write
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failure
    #[error("failed to run database migrations: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    /// A single row in a batch could not be written; the batch was rolled back
    #[error("failed to write {entity} {id}")]
    Write {
        entity: &'static str,
        id: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A structured field could not be encoded for storage
    #[error("failed to encode {field}")]
    Encode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A structured field read from storage could not be decoded
    #[error("failed to decode {field}")]
    Decode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value is outside the range the model accepts
    #[error("invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },

    /// A message references a conversation the store does not hold
    #[error("message {message_id} references unknown conversation {conversation_id}")]
    UnknownConversation {
        message_id: String,
        conversation_id: String,
    },

    /// A thread panicked while holding the store lock
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for manager, sync and provider operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
