//! Snapshot fixtures for tests and offline experiments.

use std::collections::BTreeMap;

use chrono::Utc;

use carbongrid_core::{Region, Snapshot};

/// A regional spread covering the grids the placement experiments were
/// originally run against: hydro-heavy Nordic zones through coal-heavy
/// grids.
pub const DIVERSE_REGIONS: [(&str, f64); 24] = [
    ("NO-NO1", 25.0),
    ("IS-IS", 28.0),
    ("CA-QC", 30.0),
    ("SE-SE3", 45.0),
    ("FR-FR", 85.0),
    ("BR-S", 120.0),
    ("US-NW-PACW", 180.0),
    ("GB-GB", 250.0),
    ("US-NY-NYIS", 280.0),
    ("US-CAL-CISO", 360.0),
    ("DE-DE", 380.0),
    ("JP-TK", 420.0),
    ("US-FLA-FPL", 420.0),
    ("US-TEX-ERCO", 450.0),
    ("KR-KR", 480.0),
    ("US-SE-SERC", 480.0),
    ("US-MIDW-MISO", 550.0),
    ("CN-BJ", 580.0),
    ("AU-NSW", 650.0),
    ("IN-WE", 720.0),
    ("PL-PL", 750.0),
    ("ID-JB", 780.0),
    ("ZA-ZA", 850.0),
    ("AU-VIC", 900.0),
];

/// A synthesised snapshot with wide regional diversity.
pub fn diverse_snapshot(ttl_minutes: i64) -> Snapshot {
    let regions: BTreeMap<String, Region> = DIVERSE_REGIONS
        .iter()
        .map(|(tag, intensity)| (tag.to_string(), Region::with_intensity(*tag, *intensity)))
        .collect();
    Snapshot::from_regions(regions, ttl_minutes, Utc::now())
}

/// A snapshot over an explicit set of (tag, intensity) pairs.
pub fn snapshot_of(entries: &[(&str, f64)]) -> Snapshot {
    let regions: BTreeMap<String, Region> = entries
        .iter()
        .map(|(tag, intensity)| (tag.to_string(), Region::with_intensity(*tag, *intensity)))
        .collect();
    Snapshot::from_regions(regions, 10, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverse_snapshot_is_ranked() {
        let snapshot = diverse_snapshot(10);
        assert_eq!(snapshot.regions.len(), DIVERSE_REGIONS.len());
        assert_eq!(snapshot.best_region.as_deref(), Some("NO-NO1"));
        assert_eq!(snapshot.worst_region.as_deref(), Some("AU-VIC"));
    }
}
