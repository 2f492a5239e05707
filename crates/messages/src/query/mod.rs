//! Query API over the local store
//!
//! Read-only lookups used by the manager and by callers holding a store
//! directly. Lists come back newest first.

mod conversations;
mod messages;

pub use conversations::{
    ConversationDetail, get_conversation, get_conversation_detail, get_conversations_for_contact,
    list_all_conversations,
};
pub use messages::{get_last_contact_date, get_messages_for_contact, get_messages_for_conversation};
