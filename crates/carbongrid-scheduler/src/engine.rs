//! Placement engine — observe, filter, score, bind.
//!
//! A cooperative single-threaded loop: one unit at a time, in the
//! platform's notification order. Within a unit the
//! filter → score → bind sequence runs to completion before the next
//! unit is looked at. The snapshot is re-read once per decision; a
//! missing, expired, or malformed snapshot is an expected condition
//! handled by the first-admissible fallback, never a reason to leave a
//! unit unplaced.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use carbongrid_core::SnapshotSource;

use crate::admission::admissible_hosts;
use crate::error::EngineError;
use crate::platform::{Host, PlatformFacade, WorkloadUnit};
use crate::scoring::{score_hosts, select_lowest};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Units must declare this scheduler name to be considered.
    pub scheduler_name: String,
    /// When false, the engine places on the first admissible host.
    pub carbon_aware: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler_name: "carbon-scheduler".to_string(),
            carbon_aware: true,
        }
    }
}

impl EngineConfig {
    /// Apply the `CARBON_AWARE_MODE` switch from the process
    /// environment. Only the literal `false` disables carbon scoring.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            carbon_aware: lookup("CARBON_AWARE_MODE")
                .map(|value| value != "false")
                .unwrap_or(true),
            ..Self::default()
        }
    }
}

/// Outcome of one placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Unit bound to the named host.
    Bound { host: String },
    /// No admissible host this cycle; the platform's re-observation
    /// drives the retry.
    Skipped,
    /// The bind was rejected; the platform will re-notify.
    Errored,
}

/// The placement engine. Generic over its two capabilities so tests
/// inject fakes by construction.
pub struct Engine<P, S> {
    platform: Arc<P>,
    snapshots: S,
    config: EngineConfig,
}

impl<P: PlatformFacade, S: SnapshotSource> Engine<P, S> {
    pub fn new(platform: Arc<P>, snapshots: S, config: EngineConfig) -> Self {
        Self {
            platform,
            snapshots,
            config,
        }
    }

    /// Process unplaced-unit notifications until the shutdown signal
    /// flips or the platform closes the stream. Units are handled
    /// strictly one at a time.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), EngineError> {
        let mut units = self.platform.watch_unplaced().await?;
        info!(
            scheduler = %self.config.scheduler_name,
            carbon_aware = self.config.carbon_aware,
            "placement engine started"
        );

        loop {
            tokio::select! {
                next = units.recv() => {
                    match next {
                        Some(unit) => {
                            if let Err(err) = self.place_unit(&unit).await {
                                warn!(unit = %unit.id(), error = %err, "placement attempt failed");
                            }
                        }
                        None => {
                            info!("unplaced stream closed");
                            return Ok(());
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("placement engine shutting down");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handle one observed unit. Returns `None` when the unit names a
    /// different scheduler and was not touched.
    pub async fn place_unit(
        &self,
        unit: &WorkloadUnit,
    ) -> Result<Option<Outcome>, EngineError> {
        if unit.scheduler_name != self.config.scheduler_name {
            return Ok(None);
        }

        let request = unit.total_requests();
        info!(
            unit = %unit.id(),
            cpu_millis = request.cpu_millis,
            memory_bytes = request.memory_bytes,
            "observed unplaced unit"
        );

        let hosts = self.platform.list_hosts().await?;
        let admissible = admissible_hosts(self.platform.as_ref(), hosts, unit).await?;
        if admissible.is_empty() {
            warn!(unit = %unit.id(), "no admissible host, leaving unplaced");
            return Ok(Some(Outcome::Skipped));
        }

        let chosen = self.choose(&admissible);
        match self.platform.bind(unit, &chosen).await {
            Ok(()) => {
                info!(unit = %unit.id(), host = %chosen, "unit bound");
                Ok(Some(Outcome::Bound { host: chosen }))
            }
            Err(err) => {
                warn!(
                    unit = %unit.id(),
                    host = %chosen,
                    error = %err,
                    "bind failed, platform will re-notify"
                );
                Ok(Some(Outcome::Errored))
            }
        }
    }

    /// Pick among the admissible hosts: carbon scoring when enabled and
    /// a snapshot loads, first-admissible otherwise.
    fn choose(&self, admissible: &[Host]) -> String {
        if self.config.carbon_aware {
            match self.snapshots.load() {
                Ok(snapshot) => {
                    let scores = score_hosts(admissible, &snapshot);
                    for entry in &scores {
                        debug!(
                            host = %entry.host,
                            region = entry.region.as_deref().unwrap_or("-"),
                            score = entry.score,
                            "host scored"
                        );
                    }
                    if let Some(index) = select_lowest(&scores) {
                        info!(
                            host = %scores[index].host,
                            score = scores[index].score,
                            "carbon-aware selection"
                        );
                        return scores[index].host.clone();
                    }
                }
                Err(err) => {
                    warn!(error = %err, "carbon data unavailable, falling back to first admissible");
                }
            }
        }
        admissible[0].name.clone()
    }
}
