//! Account sync and send orchestration

use std::time::Instant;

use crate::config::AccountConfig;
use crate::error::{Error, Permission, Result};
use crate::models::ConversationId;
use crate::provider::MessageProvider;
use crate::storage::MessageStore;

/// Statistics from a sync operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of conversations returned by the provider
    pub conversations_fetched: usize,
    /// Number of messages returned by the provider
    pub messages_fetched: usize,
    /// Number of messages newly stored
    pub messages_inserted: usize,
    /// Number of messages skipped (already stored or repeated in the batch)
    pub messages_skipped: usize,
    /// Duration of the sync operation
    pub duration_ms: u64,
}

/// Fetch everything visible to the account and persist it
///
/// Conversations are saved before messages so every message can reference
/// its conversation. If the conversation batch fails, messages are never
/// attempted. If the message batch fails, the conversations already
/// committed stay in place.
///
/// # Arguments
/// * `provider` - Provider with an initialized session
/// * `store` - Storage backend
/// * `account` - Account whose `read` permission gates the sync
pub fn sync_account(
    provider: &mut dyn MessageProvider,
    store: &dyn MessageStore,
    account: &AccountConfig,
) -> Result<SyncStats> {
    if !account.read {
        log::warn!("[SYNC] Refusing sync: account lacks read permission");
        return Err(Error::PermissionDenied(Permission::Read));
    }

    let start = Instant::now();
    let mut stats = SyncStats::default();

    // 1. Fetch the full snapshot
    let snapshot = provider.sync()?;
    stats.conversations_fetched = snapshot.conversations.len();
    stats.messages_fetched = snapshot.messages.len();
    log::info!(
        "[SYNC] Fetched {} conversations and {} messages from {}",
        stats.conversations_fetched,
        stats.messages_fetched,
        account.provider.as_str()
    );

    // 2. Conversations first
    store.save_conversations(&snapshot.conversations)?;

    // 3. Then messages
    stats.messages_inserted = store.save_messages(&snapshot.messages)?;
    stats.messages_skipped = stats.messages_fetched - stats.messages_inserted;

    stats.duration_ms = start.elapsed().as_millis() as u64;
    log::info!(
        "[SYNC] Stored {} new messages ({} skipped) in {}ms",
        stats.messages_inserted,
        stats.messages_skipped,
        stats.duration_ms
    );
    Ok(stats)
}

/// Send one message through the provider
///
/// Nothing is written locally; the message shows up in the store on the
/// next sync.
pub fn send_message(
    provider: &dyn MessageProvider,
    account: &AccountConfig,
    conversation_id: &ConversationId,
    text: &str,
) -> Result<()> {
    if !account.write {
        log::warn!("[SYNC] Refusing send: account lacks write permission");
        return Err(Error::PermissionDenied(Permission::Write));
    }

    provider.send(conversation_id, text)?;
    log::debug!("[SYNC] Sent message to {}", conversation_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::error::{StoreError, StoreResult};
    use crate::models::{Conversation, Message};
    use crate::provider::ProviderSnapshot;
    use crate::storage::InMemoryMessageStore;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockProvider {
        snapshot: ProviderSnapshot,
        fail_sync: bool,
        sync_calls: usize,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl MessageProvider for MockProvider {
        fn initialize(&mut self) -> Result<()> {
            Ok(())
        }

        fn sync(&mut self) -> Result<ProviderSnapshot> {
            self.sync_calls += 1;
            if self.fail_sync {
                return Err(Error::fetch_failed(anyhow::anyhow!("connection reset")));
            }
            Ok(self.snapshot.clone())
        }

        fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    /// Store whose conversation writes always fail
    #[derive(Default)]
    struct RejectingStore {
        message_saves: AtomicUsize,
    }

    impl MessageStore for RejectingStore {
        fn save_conversations(&self, _: &[Conversation]) -> StoreResult<usize> {
            Err(StoreError::LockPoisoned)
        }

        fn save_messages(&self, messages: &[Message]) -> StoreResult<usize> {
            self.message_saves.fetch_add(1, Ordering::SeqCst);
            Ok(messages.len())
        }

        fn get_conversation(&self, _: &ConversationId) -> StoreResult<Option<Conversation>> {
            Ok(None)
        }

        fn list_conversations(&self) -> StoreResult<Vec<Conversation>> {
            Ok(Vec::new())
        }

        fn list_conversations_for_contact(&self, _: &str) -> StoreResult<Vec<Conversation>> {
            Ok(Vec::new())
        }

        fn list_messages_for_conversation(&self, _: &ConversationId) -> StoreResult<Vec<Message>> {
            Ok(Vec::new())
        }

        fn list_messages_for_contact(&self, _: &str) -> StoreResult<Vec<Message>> {
            Ok(Vec::new())
        }

        fn last_contact_date(&self, _: &str) -> StoreResult<Option<DateTime<Utc>>> {
            Ok(None)
        }

        fn count_conversations(&self) -> StoreResult<usize> {
            Ok(0)
        }

        fn count_messages(&self) -> StoreResult<usize> {
            Ok(0)
        }

        fn close(self: Box<Self>) -> StoreResult<()> {
            Ok(())
        }
    }

    fn account(read: bool, write: bool) -> AccountConfig {
        AccountConfig::new(ProviderKind::Beeper, read, write)
    }

    fn snapshot() -> ProviderSnapshot {
        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        ProviderSnapshot::new(
            vec![
                Conversation::new("c1", "acc-1", "whatsapp")
                    .with_participants(["u1"])
                    .with_last_activity(at(200)),
            ],
            vec![
                Message::builder("m1", "c1").contact("u1").timestamp(at(100)).build(),
                Message::builder("m2", "c1").contact("u1").timestamp(at(200)).build(),
            ],
        )
    }

    #[test]
    fn test_sync_stores_snapshot() {
        let mut provider = MockProvider {
            snapshot: snapshot(),
            ..Default::default()
        };
        let store = InMemoryMessageStore::new();

        let stats = sync_account(&mut provider, &store, &account(true, false)).unwrap();

        assert_eq!(stats.conversations_fetched, 1);
        assert_eq!(stats.messages_fetched, 2);
        assert_eq!(stats.messages_inserted, 2);
        assert_eq!(stats.messages_skipped, 0);
        assert_eq!(store.count_conversations().unwrap(), 1);
        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_resync_is_idempotent() {
        let mut provider = MockProvider {
            snapshot: snapshot(),
            ..Default::default()
        };
        let store = InMemoryMessageStore::new();

        sync_account(&mut provider, &store, &account(true, false)).unwrap();
        let stats = sync_account(&mut provider, &store, &account(true, false)).unwrap();

        assert_eq!(stats.messages_inserted, 0);
        assert_eq!(stats.messages_skipped, 2);
        assert_eq!(store.count_messages().unwrap(), 2);
    }

    #[test]
    fn test_sync_without_read_permission() {
        let mut provider = MockProvider {
            snapshot: snapshot(),
            ..Default::default()
        };
        let store = InMemoryMessageStore::new();

        let err = sync_account(&mut provider, &store, &account(false, true)).unwrap_err();

        assert!(matches!(err, Error::PermissionDenied(Permission::Read)));
        assert_eq!(provider.sync_calls, 0);
        assert_eq!(store.count_conversations().unwrap(), 0);
    }

    #[test]
    fn test_fetch_failure_writes_nothing() {
        let mut provider = MockProvider {
            snapshot: snapshot(),
            fail_sync: true,
            ..Default::default()
        };
        let store = InMemoryMessageStore::new();

        let err = sync_account(&mut provider, &store, &account(true, false)).unwrap_err();

        assert!(matches!(err, Error::FetchFailed(_)));
        assert_eq!(store.count_conversations().unwrap(), 0);
        assert_eq!(store.count_messages().unwrap(), 0);
    }

    #[test]
    fn test_message_failure_keeps_conversations() {
        let mut snap = snapshot();
        snap.messages.push(Message::builder("m3", "missing").contact("u1").build());
        let mut provider = MockProvider {
            snapshot: snap,
            ..Default::default()
        };
        let store = InMemoryMessageStore::new();

        let err = sync_account(&mut provider, &store, &account(true, false)).unwrap_err();

        assert!(matches!(
            err,
            Error::Store(StoreError::UnknownConversation { .. })
        ));
        assert_eq!(store.count_conversations().unwrap(), 1);
        assert_eq!(store.count_messages().unwrap(), 0);
    }

    #[test]
    fn test_conversation_failure_skips_messages() {
        let mut provider = MockProvider {
            snapshot: snapshot(),
            ..Default::default()
        };
        let store = RejectingStore::default();

        let err = sync_account(&mut provider, &store, &account(true, false)).unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::LockPoisoned)));
        assert_eq!(store.message_saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_send_requires_write_permission() {
        let provider = MockProvider::default();
        let id = ConversationId::new("c1");

        let err = send_message(&provider, &account(true, false), &id, "hi").unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(Permission::Write)));
        assert!(provider.sent.lock().unwrap().is_empty());

        send_message(&provider, &account(false, true), &id, "hi").unwrap();
        assert_eq!(
            *provider.sent.lock().unwrap(),
            vec![("c1".to_string(), "hi".to_string())]
        );
    }
}
