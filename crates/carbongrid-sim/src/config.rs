//! Simulation configuration.

/// Logical time advances in fixed 10 s ticks.
pub const TICK_SECONDS: u64 = 10;

/// After arrivals cease, the loop keeps draining queues for at most 48
/// logical hours.
pub const DRAIN_CAP_SECONDS: u64 = 48 * 3600;

/// Parameters for one simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Logical window during which units arrive, in seconds.
    pub duration_secs: u64,
    /// Mean arrival rate in units per minute. Arrivals form a Poisson
    /// process: inter-arrival times are exponentially distributed.
    pub arrivals_per_minute: f64,
    /// Fraction of compute-intensive units in the kind mix.
    pub compute_ratio: f64,
    /// Seed for the run's random streams.
    pub seed: u64,
}

impl SimConfig {
    pub fn new(
        duration_hours: f64,
        arrivals_per_minute: f64,
        compute_ratio: f64,
        seed: u64,
    ) -> Self {
        Self {
            duration_secs: (duration_hours * 3600.0) as u64,
            arrivals_per_minute,
            compute_ratio,
            seed,
        }
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_secs as f64 / 3600.0
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(1.0, 5.0, 0.4, 42)
    }
}
