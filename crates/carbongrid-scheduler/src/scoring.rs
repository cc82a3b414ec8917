//! Carbon scoring over the admissible host set.
//!
//! Lower is better. A host whose region is unknown — no region label,
//! or a tag the snapshot has never heard of — receives the sentinel
//! penalty so it sorts after every host with a real reading.

use carbongrid_core::Snapshot;

use crate::platform::Host;

/// Score for a host with no usable region reading, in g CO₂eq/kWh.
pub const SENTINEL_SCORE: f64 = 1000.0;

/// A scored admissible host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostScore {
    pub host: String,
    pub region: Option<String>,
    pub score: f64,
}

/// Score each admissible host by the current effective intensity of its
/// region. Order of the input is preserved.
pub fn score_hosts(hosts: &[Host], snapshot: &Snapshot) -> Vec<HostScore> {
    hosts
        .iter()
        .map(|host| {
            let region = host.region_tag();
            let score = region
                .and_then(|tag| snapshot.intensity_of(tag))
                .unwrap_or(SENTINEL_SCORE);
            HostScore {
                host: host.name.clone(),
                region: region.map(str::to_string),
                score,
            }
        })
        .collect()
}

/// Index of the minimum-score entry; ties keep the first-seen entry.
pub fn select_lowest(scores: &[HostScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, entry) in scores.iter().enumerate() {
        match best {
            None => best = Some(index),
            Some(current) if entry.score < scores[current].score => best = Some(index),
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use chrono::Utc;

    use carbongrid_core::{Region, Resources};

    use super::*;

    fn snapshot_of(entries: &[(&str, f64)]) -> Snapshot {
        let regions: BTreeMap<String, Region> = entries
            .iter()
            .map(|(tag, intensity)| (tag.to_string(), Region::with_intensity(*tag, *intensity)))
            .collect();
        Snapshot::from_regions(regions, 10, Utc::now())
    }

    fn host_in_region(name: &str, region: Option<&str>) -> Host {
        let mut labels = HashMap::new();
        if let Some(tag) = region {
            labels.insert("carbon-region".to_string(), tag.to_string());
        }
        Host {
            name: name.to_string(),
            ready: true,
            taints: Vec::new(),
            capacity: Resources::new(4000, 8 << 30),
            labels,
        }
    }

    #[test]
    fn hosts_score_their_region_intensity() {
        let snapshot = snapshot_of(&[("A", 334.0), ("B", 367.0)]);
        let hosts = vec![host_in_region("h1", Some("A")), host_in_region("h2", Some("B"))];

        let scores = score_hosts(&hosts, &snapshot);
        assert_eq!(scores[0].score, 334.0);
        assert_eq!(scores[1].score, 367.0);

        let chosen = select_lowest(&scores).unwrap();
        assert_eq!(scores[chosen].host, "h1");
    }

    #[test]
    fn unlabelled_host_gets_sentinel() {
        let snapshot = snapshot_of(&[("A", 334.0)]);
        let hosts = vec![host_in_region("h1", Some("A")), host_in_region("h2", None)];

        let scores = score_hosts(&hosts, &snapshot);
        assert_eq!(scores[0].score, 334.0);
        assert_eq!(scores[1].score, SENTINEL_SCORE);
        assert_eq!(scores[1].region, None);
    }

    #[test]
    fn region_absent_from_snapshot_gets_sentinel() {
        let snapshot = snapshot_of(&[("A", 334.0)]);
        let hosts = vec![host_in_region("h1", Some("ZZ-ZZ"))];

        let scores = score_hosts(&hosts, &snapshot);
        assert_eq!(scores[0].score, SENTINEL_SCORE);
        assert_eq!(scores[0].region.as_deref(), Some("ZZ-ZZ"));
    }

    #[test]
    fn ties_break_by_first_seen_order() {
        let snapshot = snapshot_of(&[("A", 334.0)]);
        let hosts = vec![
            host_in_region("h1", Some("A")),
            host_in_region("h2", Some("A")),
        ];

        let scores = score_hosts(&hosts, &snapshot);
        let chosen = select_lowest(&scores).unwrap();
        assert_eq!(scores[chosen].host, "h1");
    }

    #[test]
    fn empty_score_set_selects_nothing() {
        assert_eq!(select_lowest(&[]), None);
    }
}
