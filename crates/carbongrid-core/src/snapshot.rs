//! Snapshot persistence — normalising loader and atomic writer.
//!
//! The loader accepts both the canonical layout and the historical one
//! where the value of `regions` carries a nested `regions` key holding
//! the true mapping; the ambiguity is flattened here and never leaks
//! past this module.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::SnapshotError;
use crate::types::Snapshot;

/// Read and normalise a snapshot without validating its age.
///
/// The simulator replays saved snapshots long after their TTL, so age
/// checking is the caller's concern; live consumers use
/// [`load_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let raw = fs::read_to_string(path)?;
    let mut value: Value = serde_json::from_str(&raw)?;
    flatten_nested_regions(&mut value);
    let snapshot: Snapshot = serde_json::from_value(value)?;
    Ok(snapshot)
}

/// Read a snapshot and reject it when its embedded creation time is
/// older than its TTL.
pub fn load_snapshot(path: &Path, now: DateTime<Utc>) -> Result<Snapshot, SnapshotError> {
    let snapshot = read_snapshot(path)?;
    if snapshot.is_expired(now) {
        return Err(SnapshotError::Expired {
            age_minutes: snapshot.age(now).num_minutes(),
            ttl_minutes: snapshot.ttl_minutes,
        });
    }
    Ok(snapshot)
}

/// Replace the persisted snapshot atomically: write to a temporary path
/// in the same directory, then rename over the target. Readers observe
/// the prior snapshot or the new one, never a partial file.
pub fn store_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Historical cache files nest the region mapping one level deeper
/// (`regions.regions`). Flatten before typed decoding.
fn flatten_nested_regions(value: &mut Value) {
    let Some(regions) = value.get_mut("regions") else {
        return;
    };
    if let Some(nested) = regions.get("regions") {
        if nested.is_object() {
            debug!("flattening nested regions layout in snapshot");
            let nested = nested.clone();
            *regions = nested;
        }
    }
}

/// Where a consumer obtains its carbon view.
///
/// The filesystem cache is the production implementation; tests inject
/// fixed or failing sources.
pub trait SnapshotSource: Send + Sync {
    fn load(&self) -> Result<Snapshot, SnapshotError>;
}

/// Reads the poller's cache file on every call. The read is cheap, so
/// consumers hold no in-memory copy between decisions.
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn load(&self) -> Result<Snapshot, SnapshotError> {
        load_snapshot(&self.path, Utc::now())
    }
}
