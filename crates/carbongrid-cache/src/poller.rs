//! Poll cycle and the long-lived poll loop.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use carbongrid_core::{store_snapshot, Region, Snapshot};

use crate::client::{EmissionsClient, ZoneReading};
use crate::config::CacheConfig;

/// A whole poll cycle failed: not a single zone returned a usable
/// reading. The previous snapshot stays in place.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("all {0} zones failed")]
    AllZonesFailed(usize),
}

/// Poll every zone once and assemble a snapshot from the zones that
/// succeeded. Per-zone failures are logged and skipped; the cycle
/// succeeds iff at least one zone succeeded.
pub async fn poll_once(
    client: &EmissionsClient,
    zones: &[String],
    ttl_minutes: i64,
) -> Result<Snapshot, PollError> {
    let mut regions = BTreeMap::new();

    for zone in zones {
        match client.latest(zone).await {
            Ok(reading) => {
                info!(
                    %zone,
                    intensity = reading.carbon_intensity.unwrap_or_default(),
                    estimated = reading.is_estimated,
                    "polled carbon intensity"
                );
                regions.insert(zone.clone(), region_from_reading(zone, reading));
            }
            Err(err) => {
                warn!(%zone, error = %err, "zone poll failed, skipping");
            }
        }
    }

    if regions.is_empty() {
        return Err(PollError::AllZonesFailed(zones.len()));
    }

    Ok(Snapshot::from_regions(regions, ttl_minutes, Utc::now()))
}

fn region_from_reading(zone: &str, reading: ZoneReading) -> Region {
    Region {
        zone: zone.to_string(),
        carbon_intensity: reading.carbon_intensity.unwrap_or_default(),
        moer: None,
        datetime: reading.datetime,
        updated_at: reading.updated_at,
        created_at: reading.created_at,
        emission_factor_type: reading.emission_factor_type,
        is_estimated: reading.is_estimated,
        estimation_method: reading.estimation_method,
        timestamp: Some(Utc::now().to_rfc3339()),
    }
}

/// The long-lived cache poller. One cycle is in flight at a time, and
/// the persisted snapshot is replaced only after a cycle with at least
/// one successful zone.
pub struct Poller {
    client: EmissionsClient,
    config: CacheConfig,
}

impl Poller {
    pub fn new(client: EmissionsClient, config: CacheConfig) -> Self {
        Self { client, config }
    }

    /// Poll immediately, then every `poll_interval_minutes`, until the
    /// shutdown signal flips. An in-flight cycle finishes before the
    /// signal is observed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_minutes = self.config.poll_interval_minutes,
            ttl_minutes = self.config.cache_ttl_minutes,
            cache_file = %self.config.cache_file.display(),
            zones = self.config.zones.len(),
            "cache poller started"
        );

        let mut interval =
            time::interval(Duration::from_secs(self.config.poll_interval_minutes * 60));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("cache poller shutting down");
                        return;
                    }
                }
            }
        }
    }

    /// One poll cycle: poll, then atomically replace the snapshot file.
    pub(crate) async fn cycle(&self) {
        match poll_once(&self.client, &self.config.zones, self.config.cache_ttl_minutes).await {
            Ok(snapshot) => match store_snapshot(&self.config.cache_file, &snapshot) {
                Ok(()) => info!(
                    regions = snapshot.regions.len(),
                    best = snapshot.best_region.as_deref().unwrap_or("-"),
                    worst = snapshot.worst_region.as_deref().unwrap_or("-"),
                    "snapshot written"
                ),
                Err(err) => error!(error = %err, "failed to write snapshot"),
            },
            Err(err) => {
                error!(error = %err, "poll cycle failed, keeping previous snapshot");
                self.log_available_zones().await;
            }
        }
    }

    /// After a fully failed cycle, fetch the service's zone list once
    /// and log a sample so misconfigured zone codes are easy to spot.
    async fn log_available_zones(&self) {
        match self.client.list_zones().await {
            Ok(mut zones) => {
                let total = zones.len();
                zones.truncate(10);
                info!(total, sample = ?zones, "available zone codes");
            }
            Err(err) => debug!(error = %err, "could not fetch zone list"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn unreachable_client() -> EmissionsClient {
        // Nothing listens on port 1; every request fails fast.
        EmissionsClient::new("http://127.0.0.1:1", "token").unwrap()
    }

    fn config_with_cache_file(path: PathBuf) -> CacheConfig {
        CacheConfig {
            api_key: "token".to_string(),
            poll_interval_minutes: 5,
            cache_ttl_minutes: 10,
            cache_file: path,
            zones: vec!["FR-FR".to_string(), "DE-DE".to_string()],
        }
    }

    #[tokio::test]
    async fn poll_once_fails_when_every_zone_fails() {
        let client = unreachable_client();
        let zones = vec!["FR-FR".to_string(), "DE-DE".to_string()];

        let err = poll_once(&client, &zones, 10).await.unwrap_err();
        assert!(matches!(err, PollError::AllZonesFailed(2)));
    }

    #[tokio::test]
    async fn failed_cycle_leaves_previous_snapshot_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carbon_cache.json");
        std::fs::write(&path, r#"{"previous": true}"#).unwrap();

        let poller = Poller::new(unreachable_client(), config_with_cache_file(path.clone()));
        poller.cycle().await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, r#"{"previous": true}"#);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let dir = tempfile::tempdir().unwrap();
        let poller = Poller::new(
            unreachable_client(),
            config_with_cache_file(dir.path().join("carbon_cache.json")),
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { poller.run(rx).await });

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("poller should stop promptly")
            .unwrap();
    }

    #[test]
    fn reading_maps_onto_region_record() {
        let reading = ZoneReading {
            carbon_intensity: Some(287.0),
            datetime: Some("2024-03-01T12:00:00Z".to_string()),
            updated_at: None,
            created_at: None,
            emission_factor_type: Some("lifecycle".to_string()),
            is_estimated: true,
            estimation_method: Some("TIME_SLICER_AVERAGE".to_string()),
        };

        let region = region_from_reading("US-NY-NYIS", reading);
        assert_eq!(region.zone, "US-NY-NYIS");
        assert_eq!(region.carbon_intensity, 287.0);
        assert_eq!(region.moer, None);
        assert!(region.is_estimated);
        assert!(region.timestamp.is_some());
    }
}
