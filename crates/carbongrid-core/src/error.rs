//! Snapshot error types.

use thiserror::Error;

/// Errors reading or writing the persisted carbon snapshot.
///
/// Consumers treat all three variants the same way: carbon information
/// is unavailable for the current decision.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot schema error: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("snapshot expired (age: {age_minutes}m, ttl: {ttl_minutes}m)")]
    Expired { age_minutes: i64, ttl_minutes: i64 },
}
