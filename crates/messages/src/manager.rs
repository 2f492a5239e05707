//! Message manager
//!
//! Facade that owns one account's provider session and store, and routes
//! sync, send and query calls through the permission checks.

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::config::AccountConfig;
use crate::error::Result;
use crate::models::{Conversation, ConversationId, Message};
use crate::provider::MessageProvider;
use crate::query::{self, ConversationDetail};
use crate::storage::{MessageStore, SqliteMessageStore};
use crate::sync::{self, SyncStats};

/// Entry point for one account
///
/// Owns its store exclusively. Dropping the manager releases the store;
/// [`close`](Self::close) does the same and reports failures.
pub struct MessageManager {
    provider: Box<dyn MessageProvider>,
    account: AccountConfig,
    store: Box<dyn MessageStore>,
}

impl MessageManager {
    /// Create a manager over an already opened store
    pub fn new(provider: Box<dyn MessageProvider>, account: AccountConfig, store: Box<dyn MessageStore>) -> Self {
        Self {
            provider,
            account,
            store,
        }
    }

    /// Initialize the provider session and open `db_dir/messages.db`
    ///
    /// Fails before touching disk when the provider cannot initialize.
    pub fn open(mut provider: Box<dyn MessageProvider>, account: AccountConfig, db_dir: impl AsRef<Path>) -> Result<Self> {
        provider.initialize()?;
        let store = SqliteMessageStore::open_in_dir(db_dir.as_ref())?;
        log::info!("[STORE] Opened {} account store in {}", account.provider.as_str(), db_dir.as_ref().display());
        Ok(Self::new(provider, account, Box::new(store)))
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    /// Underlying store, for callers that need counts or direct access
    pub fn store(&self) -> &dyn MessageStore {
        self.store.as_ref()
    }

    /// Sync the account; requires read permission
    pub fn sync(&mut self) -> Result<SyncStats> {
        sync::sync_account(self.provider.as_mut(), self.store.as_ref(), &self.account)
    }

    /// Send a message; requires write permission
    pub fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<()> {
        sync::send_message(self.provider.as_ref(), &self.account, conversation_id, text)
    }

    pub fn list_all_conversations(&self) -> Result<Vec<Conversation>> {
        query::list_all_conversations(self.store.as_ref())
    }

    pub fn get_conversation(&self, id: &ConversationId) -> Result<Option<Conversation>> {
        query::get_conversation(self.store.as_ref(), id)
    }

    pub fn get_conversations_for_contact(&self, contact_uid: &str) -> Result<Vec<Conversation>> {
        query::get_conversations_for_contact(self.store.as_ref(), contact_uid)
    }

    pub fn get_conversation_detail(&self, id: &ConversationId) -> Result<Option<ConversationDetail>> {
        query::get_conversation_detail(self.store.as_ref(), id)
    }

    pub fn get_messages_for_conversation(&self, id: &ConversationId) -> Result<Vec<Message>> {
        query::get_messages_for_conversation(self.store.as_ref(), id)
    }

    pub fn get_messages_for_contact(&self, contact_uid: &str) -> Result<Vec<Message>> {
        query::get_messages_for_contact(self.store.as_ref(), contact_uid)
    }

    pub fn get_last_contact_date(&self, contact_uid: &str) -> Result<Option<DateTime<Utc>>> {
        query::get_last_contact_date(self.store.as_ref(), contact_uid)
    }

    /// Release the store
    pub fn close(self) -> Result<()> {
        self.store.close()?;
        Ok(())
    }
}
