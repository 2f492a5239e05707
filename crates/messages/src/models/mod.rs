//! Canonical data model shared by every provider

mod attachment;
mod conversation;
mod message;

pub use attachment::{Attachment, decode_attachments, encode_attachments};
pub use conversation::{
    Conversation, ConversationId, ConversationType, decode_participant_uids,
    encode_participant_uids,
};
pub use message::{Message, MessageBuilder, MessageId};
