//! Provider contract
//!
//! A provider translates one messaging platform into the canonical model.
//! The engine only needs three capabilities from it: establish a session,
//! fetch everything visible to the account, and send one message.

pub mod credentials;

use crate::error::Result;
use crate::models::{Conversation, ConversationId, Message};

pub use credentials::{AccessTokenCredentials, CredentialFile, Credentials, HomeserverCredentials};

/// Complete result of one provider fetch
#[derive(Debug, Clone, Default)]
pub struct ProviderSnapshot {
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
}

impl ProviderSnapshot {
    pub fn new(conversations: Vec<Conversation>, messages: Vec<Message>) -> Self {
        Self {
            conversations,
            messages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty() && self.messages.is_empty()
    }
}

/// Capabilities the sync engine requires of a messaging provider
///
/// Implementations must return a fully synced snapshot or fail outright;
/// the engine does not retry. Progress may be reported through `log`.
pub trait MessageProvider: Send {
    /// Establish a usable session from previously persisted credentials
    ///
    /// Fails with [`Error::NotConfigured`](crate::Error::NotConfigured) when
    /// credentials are missing or incomplete.
    fn initialize(&mut self) -> Result<()>;

    /// Fetch every conversation and message visible to the account
    ///
    /// Fails with [`Error::FetchFailed`](crate::Error::FetchFailed).
    fn sync(&mut self) -> Result<ProviderSnapshot>;

    /// Dispatch one outbound message
    ///
    /// Fails with [`Error::SendFailed`](crate::Error::SendFailed). No delivery
    /// confirmation is expected.
    fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_empty() {
        assert!(ProviderSnapshot::default().is_empty());

        let snapshot = ProviderSnapshot::new(vec![Conversation::new("c1", "acc", "sms")], Vec::new());
        assert!(!snapshot.is_empty());

        let snapshot = ProviderSnapshot::new(Vec::new(), vec![Message::builder("m1", "c1").build()]);
        assert!(!snapshot.is_empty());
    }
}
