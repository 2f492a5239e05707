//! Sync engine for pulling provider snapshots into the store
//!
//! Syncing is idempotent: conversations are overwritten with the latest
//! provider view and messages already stored are left untouched.

mod engine;

pub use engine::{SyncStats, send_message, sync_account};
