//! Messages crate - Unified message store for chat platforms
//!
//! This crate provides the platform-independent core of a local message
//! archive:
//! - Canonical models (Conversation, Message, Attachment)
//! - The provider contract every messaging platform implements
//! - Storage trait abstractions with SQLite and in-memory backends
//! - Idempotent, permission-gated sync engine
//! - Query API over the local store
//! - Account configuration and provider credential files
//!
//! The crate never installs a logger; it reports through the `log` facade.

pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod provider;
pub mod query;
pub mod storage;
pub mod sync;

pub use config::{AccountConfig, AccountsConfig, ProviderKind};
pub use error::{Error, Permission, Result, StoreError, StoreResult};
pub use manager::MessageManager;
pub use models::{Attachment, Conversation, ConversationId, ConversationType, Message, MessageBuilder, MessageId};
pub use provider::{
    AccessTokenCredentials, CredentialFile, Credentials, HomeserverCredentials, MessageProvider, ProviderSnapshot,
};
pub use query::{
    ConversationDetail, get_conversation, get_conversation_detail, get_conversations_for_contact,
    get_last_contact_date, get_messages_for_contact, get_messages_for_conversation, list_all_conversations,
};
pub use storage::{DATABASE_FILE, InMemoryMessageStore, MessageStore, SqliteMessageStore};
pub use sync::{SyncStats, send_message, sync_account};
