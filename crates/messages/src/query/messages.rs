//! Message query functions

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{ConversationId, Message};
use crate::storage::MessageStore;

/// Messages in a conversation, newest first
pub fn get_messages_for_conversation(store: &dyn MessageStore, id: &ConversationId) -> Result<Vec<Message>> {
    Ok(store.list_messages_for_conversation(id)?)
}

/// Messages whose contact is exactly `contact_uid`, newest first
pub fn get_messages_for_contact(store: &dyn MessageStore, contact_uid: &str) -> Result<Vec<Message>> {
    Ok(store.list_messages_for_contact(contact_uid)?)
}

/// Timestamp of the latest message with a contact
///
/// `None` only when no message exists; a message stored at the epoch
/// yields `Some(UNIX_EPOCH)`.
pub fn get_last_contact_date(store: &dyn MessageStore, contact_uid: &str) -> Result<Option<DateTime<Utc>>> {
    Ok(store.last_contact_date(contact_uid)?)
}
