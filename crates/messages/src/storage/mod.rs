//! Storage traits and implementations
//!
//! This module defines the storage abstraction layer for the canonical
//! model. The trait-based design allows swapping between the SQLite store
//! used in production and an in-memory store for tests.

mod memory;
mod sqlite;
mod traits;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{StoreError, StoreResult};

pub use memory::InMemoryMessageStore;
pub use sqlite::{DATABASE_FILE, SqliteMessageStore};
pub use traits::MessageStore;

/// Timestamps are persisted as whole epoch seconds
pub(crate) fn to_epoch_seconds(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}

pub(crate) fn from_epoch_seconds(field: &'static str, secs: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| StoreError::InvalidValue {
            field,
            value: secs.to_string(),
        })
}

/// Drop sub-second precision the same way a store round-trip does
pub(crate) fn truncate_to_seconds(field: &'static str, dt: &DateTime<Utc>) -> StoreResult<DateTime<Utc>> {
    from_epoch_seconds(field, to_epoch_seconds(dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_round_trip_drops_fraction() {
        let dt = Utc.timestamp_opt(1_736_935_200, 987_654_321).unwrap();
        let secs = to_epoch_seconds(&dt);
        assert_eq!(secs, 1_736_935_200);
        assert_eq!(
            from_epoch_seconds("timestamp", secs).unwrap(),
            Utc.timestamp_opt(1_736_935_200, 0).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_epoch_is_invalid() {
        let err = from_epoch_seconds("timestamp", i64::MAX).unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue { field: "timestamp", .. }));
    }
}
