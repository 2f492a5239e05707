//! SQLite-based message storage

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rusqlite_migration::{M, Migrations};

use super::traits::MessageStore;
use super::{from_epoch_seconds, to_epoch_seconds};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Conversation, ConversationId, ConversationType, Message, MessageId, decode_attachments,
    decode_participant_uids, encode_attachments, encode_participant_uids,
};

/// Database filename inside an account directory
pub const DATABASE_FILE: &str = "messages.db";

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied, so the file holds only the two model tables.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            CREATE TABLE conversations (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                title TEXT NOT NULL,
                type TEXT NOT NULL,
                participant_uids TEXT,
                participant_count INTEGER NOT NULL,
                unread_count INTEGER NOT NULL,
                last_activity INTEGER NOT NULL,
                is_archived INTEGER NOT NULL DEFAULT 0,
                is_muted INTEGER NOT NULL DEFAULT 0,
                is_pinned INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_conversations_last_activity
                ON conversations(last_activity DESC);

            CREATE TABLE messages (
                id TEXT PRIMARY KEY,
                contact_uid TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                sender_uid TEXT NOT NULL,
                sender_name TEXT NOT NULL,
                conversation_uid TEXT NOT NULL,
                chat_title TEXT NOT NULL,
                content TEXT NOT NULL,
                platform TEXT NOT NULL,
                platform_id TEXT NOT NULL,
                is_sent INTEGER NOT NULL,
                attachments TEXT,
                sort_key TEXT NOT NULL,
                FOREIGN KEY (conversation_uid) REFERENCES conversations(id)
            );

            CREATE INDEX idx_messages_conversation ON messages(conversation_uid);
            CREATE INDEX idx_messages_contact ON messages(contact_uid);
            CREATE INDEX idx_messages_sender ON messages(sender_uid);
            CREATE INDEX idx_messages_timestamp ON messages(timestamp DESC);
            "#,
        ),
    ])
}

const CONVERSATION_COLUMNS: &str = "c.id, c.account_id, c.platform, c.title, c.type,
    c.participant_uids, c.participant_count, c.unread_count, c.last_activity,
    c.is_archived, c.is_muted, c.is_pinned";

const MESSAGE_COLUMNS: &str = "id, contact_uid, timestamp, sender_uid, sender_name,
    conversation_uid, chat_title, content, platform, platform_id,
    is_sent, attachments, sort_key";

/// Raw conversation columns before structured fields are decoded
struct ConversationRow {
    id: String,
    account_id: String,
    platform: String,
    title: String,
    conversation_type: String,
    participant_uids: Option<String>,
    participant_count: u32,
    unread_count: u32,
    last_activity: i64,
    is_archived: bool,
    is_muted: bool,
    is_pinned: bool,
}

impl ConversationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            account_id: row.get(1)?,
            platform: row.get(2)?,
            title: row.get(3)?,
            conversation_type: row.get(4)?,
            participant_uids: row.get(5)?,
            participant_count: row.get(6)?,
            unread_count: row.get(7)?,
            last_activity: row.get(8)?,
            is_archived: row.get(9)?,
            is_muted: row.get(10)?,
            is_pinned: row.get(11)?,
        })
    }

    fn into_conversation(self) -> StoreResult<Conversation> {
        let conversation_type =
            ConversationType::parse(&self.conversation_type).ok_or_else(|| {
                StoreError::InvalidValue {
                    field: "type",
                    value: self.conversation_type.clone(),
                }
            })?;
        let participant_uids = decode_participant_uids(self.participant_uids.as_deref())
            .map_err(|source| StoreError::Decode {
                field: "participant_uids",
                source,
            })?;

        Ok(Conversation {
            id: ConversationId::new(self.id),
            account_id: self.account_id,
            platform: self.platform,
            title: self.title,
            conversation_type,
            participant_uids,
            participant_count: self.participant_count,
            unread_count: self.unread_count,
            last_activity: from_epoch_seconds("last_activity", self.last_activity)?,
            is_archived: self.is_archived,
            is_muted: self.is_muted,
            is_pinned: self.is_pinned,
        })
    }
}

/// Raw message columns before structured fields are decoded
struct MessageRow {
    id: String,
    contact_uid: String,
    timestamp: i64,
    sender_uid: String,
    sender_name: String,
    conversation_uid: String,
    chat_title: String,
    content: String,
    platform: String,
    platform_id: String,
    is_sent: bool,
    attachments: Option<String>,
    sort_key: String,
}

impl MessageRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            contact_uid: row.get(1)?,
            timestamp: row.get(2)?,
            sender_uid: row.get(3)?,
            sender_name: row.get(4)?,
            conversation_uid: row.get(5)?,
            chat_title: row.get(6)?,
            content: row.get(7)?,
            platform: row.get(8)?,
            platform_id: row.get(9)?,
            is_sent: row.get(10)?,
            attachments: row.get(11)?,
            sort_key: row.get(12)?,
        })
    }

    fn into_message(self) -> StoreResult<Message> {
        let attachments =
            decode_attachments(self.attachments.as_deref()).map_err(|source| StoreError::Decode {
                field: "attachments",
                source,
            })?;

        Ok(Message {
            id: MessageId::new(self.id),
            contact_uid: self.contact_uid,
            timestamp: from_epoch_seconds("timestamp", self.timestamp)?,
            sender_uid: self.sender_uid,
            sender_name: self.sender_name,
            conversation_uid: ConversationId::new(self.conversation_uid),
            chat_title: self.chat_title,
            text: self.content,
            platform: self.platform,
            platform_id: self.platform_id,
            is_sent: self.is_sent,
            attachments,
            sort_key: self.sort_key,
        })
    }
}

/// SQLite-based message storage
///
/// Owns one connection for its whole lifetime. Call [`MessageStore::close`]
/// to release it and observe close errors; dropping the store also releases it.
pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
}

impl SqliteMessageStore {
    /// Open (or create) the store at `db_path`, creating parent directories
    pub fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        log::debug!("[STORE] Opening database at {}", db_path.display());
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// Open the store file inside an account directory
    pub fn open_in_dir(dir: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(dir.as_ref().join(DATABASE_FILE))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        // foreign_keys is off by default in SQLite
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            "#,
        )?;

        migrations().to_latest(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn query_conversations(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StoreResult<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, ConversationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(ConversationRow::into_conversation)
            .collect()
    }

    fn query_messages(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, MessageRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }
}

impl MessageStore for SqliteMessageStore {
    fn save_conversations(&self, conversations: &[Conversation]) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            // Update in place; REPLACE would delete the row under the messages foreign key
            let mut stmt = tx.prepare(
                "INSERT INTO conversations
                 (id, account_id, platform, title, type, participant_uids, participant_count,
                  unread_count, last_activity, is_archived, is_muted, is_pinned)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    account_id = excluded.account_id,
                    platform = excluded.platform,
                    title = excluded.title,
                    type = excluded.type,
                    participant_uids = excluded.participant_uids,
                    participant_count = excluded.participant_count,
                    unread_count = excluded.unread_count,
                    last_activity = excluded.last_activity,
                    is_archived = excluded.is_archived,
                    is_muted = excluded.is_muted,
                    is_pinned = excluded.is_pinned",
            )?;

            for conv in conversations {
                let participant_uids = encode_participant_uids(&conv.participant_uids)
                    .map_err(|source| StoreError::Encode {
                        field: "participant_uids",
                        source,
                    })?;

                stmt.execute(params![
                    conv.id.as_str(),
                    conv.account_id,
                    conv.platform,
                    conv.title,
                    conv.conversation_type.as_str(),
                    participant_uids,
                    conv.participant_count,
                    conv.unread_count,
                    to_epoch_seconds(&conv.last_activity),
                    conv.is_archived,
                    conv.is_muted,
                    conv.is_pinned,
                ])
                .map_err(|source| StoreError::Write {
                    entity: "conversation",
                    id: conv.id.to_string(),
                    source,
                })?;
            }
        }

        tx.commit()?;
        Ok(conversations.len())
    }

    fn save_messages(&self, messages: &[Message]) -> StoreResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            // DO NOTHING only absorbs primary key conflicts; NOT NULL and
            // foreign key violations still fail the batch.
            let mut stmt = tx.prepare(
                "INSERT INTO messages
                 (id, contact_uid, timestamp, sender_uid, sender_name, conversation_uid,
                  chat_title, content, platform, platform_id, is_sent, attachments, sort_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                 ON CONFLICT(id) DO NOTHING",
            )?;

            for msg in messages {
                let attachments =
                    encode_attachments(&msg.attachments).map_err(|source| StoreError::Encode {
                        field: "attachments",
                        source,
                    })?;

                inserted += stmt
                    .execute(params![
                        msg.id.as_str(),
                        msg.contact_uid,
                        to_epoch_seconds(&msg.timestamp),
                        msg.sender_uid,
                        msg.sender_name,
                        msg.conversation_uid.as_str(),
                        msg.chat_title,
                        msg.text,
                        msg.platform,
                        msg.platform_id,
                        msg.is_sent,
                        attachments,
                        msg.sort_key,
                    ])
                    .map_err(|source| StoreError::Write {
                        entity: "message",
                        id: msg.id.to_string(),
                        source,
                    })?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn get_conversation(&self, id: &ConversationId) -> StoreResult<Option<Conversation>> {
        let row = {
            let conn = self.conn()?;
            conn.query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?1"),
                [id.as_str()],
                ConversationRow::from_row,
            )
            .optional()?
        };

        row.map(ConversationRow::into_conversation).transpose()
    }

    fn list_conversations(&self) -> StoreResult<Vec<Conversation>> {
        self.query_conversations(
            &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c ORDER BY c.last_activity DESC, c.id"),
            [],
        )
    }

    fn list_conversations_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Conversation>> {
        // Exact membership over the decoded JSON list, not a text match
        self.query_conversations(
            &format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations c
                 WHERE EXISTS (
                     SELECT 1 FROM json_each(c.participant_uids) p WHERE p.value = ?1
                 )
                 ORDER BY c.last_activity DESC, c.id"
            ),
            [contact_uid],
        )
    }

    fn list_messages_for_conversation(&self, id: &ConversationId) -> StoreResult<Vec<Message>> {
        self.query_messages(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_uid = ?1 ORDER BY timestamp DESC"
            ),
            [id.as_str()],
        )
    }

    fn list_messages_for_contact(&self, contact_uid: &str) -> StoreResult<Vec<Message>> {
        self.query_messages(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE contact_uid = ?1 ORDER BY timestamp DESC"
            ),
            [contact_uid],
        )
    }

    fn last_contact_date(&self, contact_uid: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;

        // MAX over zero rows is NULL, which is distinct from a stored 0
        let latest: Option<i64> = conn.query_row(
            "SELECT MAX(timestamp) FROM messages WHERE contact_uid = ?1",
            [contact_uid],
            |row| row.get(0),
        )?;

        latest
            .map(|secs| from_epoch_seconds("timestamp", secs))
            .transpose()
    }

    fn count_conversations(&self) -> StoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_messages(&self) -> StoreResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        let store = *self;
        let conn = store.conn.into_inner().map_err(|_| StoreError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| StoreError::Sqlite(e))
    }
}
