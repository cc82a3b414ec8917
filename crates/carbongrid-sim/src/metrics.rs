//! Per-run metric rollups.

use std::collections::BTreeMap;

use crate::config::SimConfig;
use crate::engine::SimHost;
use crate::policy::PolicyKind;
use crate::workload::Job;

/// Aggregated results for a single simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub policy: PolicyKind,
    pub total_units: usize,
    /// Units that started and released their resources.
    pub completed: usize,
    /// Units that never completed: still queued, still running at the
    /// drain cap, or never placed.
    pub failed: usize,
    /// Creation → start, completed units only.
    pub mean_latency_secs: f64,
    pub p95_latency_secs: f64,
    /// Creation → completion, completed units only.
    pub mean_turnaround_secs: f64,
    pub p95_turnaround_secs: f64,
    /// Mean carbon intensity over completed units, g CO₂eq/kWh.
    pub mean_carbon: f64,
    /// Sum of per-unit intensities over completed units.
    pub total_carbon: f64,
    /// Completed units per hour of configured duration.
    pub throughput_per_hour: f64,
    /// Time-integrated compute utilization, averaged over hosts.
    pub mean_utilization_pct: f64,
    pub units_by_region: BTreeMap<String, usize>,
    pub carbon_by_region: BTreeMap<String, f64>,
}

impl RunMetrics {
    /// Carbon reduction relative to `baseline`:
    /// `(baseline − self) / baseline × 100`.
    pub fn carbon_reduction_vs(&self, baseline: &RunMetrics) -> f64 {
        if baseline.mean_carbon <= 0.0 {
            return 0.0;
        }
        (baseline.mean_carbon - self.mean_carbon) / baseline.mean_carbon * 100.0
    }
}

/// Roll a finished run up into metrics.
pub fn compute(
    policy: PolicyKind,
    jobs: &[Job],
    hosts: &[SimHost],
    config: &SimConfig,
    elapsed_secs: u64,
) -> RunMetrics {
    let mut completed = 0usize;
    let mut total_carbon = 0.0;
    let mut latencies = Vec::new();
    let mut turnarounds = Vec::new();
    let mut units_by_region: BTreeMap<String, usize> = BTreeMap::new();
    let mut carbon_by_region: BTreeMap<String, f64> = BTreeMap::new();

    for job in jobs {
        let (Some(latency), Some(turnaround)) = (job.latency_secs(), job.turnaround_secs())
        else {
            continue;
        };
        completed += 1;
        latencies.push(latency as f64);
        turnarounds.push(turnaround as f64);

        let intensity = job.intensity.unwrap_or_default();
        total_carbon += intensity;
        if let Some(region) = &job.region {
            *units_by_region.entry(region.clone()).or_default() += 1;
            *carbon_by_region.entry(region.clone()).or_default() += intensity;
        }
    }

    latencies.sort_by(f64::total_cmp);
    turnarounds.sort_by(f64::total_cmp);

    let mean_carbon = if completed > 0 {
        total_carbon / completed as f64
    } else {
        0.0
    };

    let duration_hours = config.duration_hours();
    let throughput_per_hour = if duration_hours > 0.0 {
        completed as f64 / duration_hours
    } else {
        0.0
    };

    let mean_utilization_pct = if hosts.is_empty() {
        0.0
    } else {
        hosts
            .iter()
            .map(|host| host.mean_utilization_pct(elapsed_secs))
            .sum::<f64>()
            / hosts.len() as f64
    };

    RunMetrics {
        policy,
        total_units: jobs.len(),
        completed,
        failed: jobs.len() - completed,
        mean_latency_secs: mean(&latencies),
        p95_latency_secs: p95(&latencies),
        mean_turnaround_secs: mean(&turnarounds),
        p95_turnaround_secs: p95(&turnarounds),
        mean_carbon,
        total_carbon,
        throughput_per_hour,
        mean_utilization_pct,
        units_by_region,
        carbon_by_region,
    }
}

fn mean(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

/// 95th percentile of an ascending sample. Small samples fall back to
/// the maximum.
fn p95(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() >= 20 {
        sorted[(sorted.len() as f64 * 0.95) as usize]
    } else {
        sorted[sorted.len() - 1]
    }
}
