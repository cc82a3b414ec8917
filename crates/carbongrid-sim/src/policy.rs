//! Placement policies and the queue selector.
//!
//! Policies are values: each maps an admissible host to a real number,
//! lower preferred. When nothing is immediately admissible a separate
//! queue score combines an estimated wait with the policy's primary
//! criterion to pick the host whose queue the unit joins.

use rand::rngs::StdRng;
use rand::Rng;

use crate::engine::SimHost;
use crate::workload::{Job, JobKind};

/// Weight that lets carbon intensity swamp the wait-time term in queue
/// selection: any constant large enough that no realistic wait-time
/// difference reorders two hosts with different intensities.
pub const CARBON_QUEUE_WEIGHT: f64 = 10_000.0;

const UTILIZATION_QUEUE_WEIGHT: f64 = 10_000.0;
const QUEUE_LENGTH_WEIGHT: f64 = 1_000.0;

/// The five selectable policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Minimum carbon intensity.
    CarbonAware,
    /// Maximum carbon intensity; the comparison baseline.
    HighestCarbon,
    /// Fewest currently running units.
    RoundRobin,
    /// Uniform random over admissible hosts.
    Random,
    /// Minimum compute-unit utilisation.
    LeastLoaded,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 5] = [
        PolicyKind::CarbonAware,
        PolicyKind::HighestCarbon,
        PolicyKind::RoundRobin,
        PolicyKind::Random,
        PolicyKind::LeastLoaded,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::CarbonAware => "carbon-aware",
            PolicyKind::HighestCarbon => "highest-carbon",
            PolicyKind::RoundRobin => "round-robin",
            PolicyKind::Random => "random",
            PolicyKind::LeastLoaded => "least-loaded",
        }
    }

    /// Score an immediately-admissible host; lower wins.
    pub fn score(self, host: &SimHost, rng: &mut StdRng) -> f64 {
        match self {
            PolicyKind::CarbonAware => host.intensity,
            PolicyKind::HighestCarbon => -host.intensity,
            PolicyKind::RoundRobin => host.running.len() as f64,
            PolicyKind::Random => rng.gen(),
            PolicyKind::LeastLoaded => host.cpu_utilization(),
        }
    }

    /// Pick among admissible hosts, given as indices into `hosts`.
    /// Ties keep the first-seen candidate.
    pub fn select_immediate(
        self,
        hosts: &[SimHost],
        admissible: &[usize],
        rng: &mut StdRng,
    ) -> usize {
        let mut best = admissible[0];
        let mut best_score = self.score(&hosts[best], rng);
        for &candidate in &admissible[1..] {
            let score = self.score(&hosts[candidate], rng);
            if score < best_score {
                best = candidate;
                best_score = score;
            }
        }
        best
    }

    /// Combined wait/criterion score used when no host admits the unit
    /// immediately; lower wins.
    pub fn queue_score(self, host: &SimHost, job: &Job) -> f64 {
        let wait = estimate_wait_secs(host, job);
        match self {
            PolicyKind::CarbonAware => wait * 0.1 + host.intensity * CARBON_QUEUE_WEIGHT,
            PolicyKind::HighestCarbon => wait * 0.1 - host.intensity * CARBON_QUEUE_WEIGHT,
            PolicyKind::LeastLoaded => wait + host.cpu_utilization() * UTILIZATION_QUEUE_WEIGHT,
            PolicyKind::RoundRobin => wait + host.queue.len() as f64 * QUEUE_LENGTH_WEIGHT,
            PolicyKind::Random => wait,
        }
    }

    /// Index of the preferred host to queue on.
    pub fn select_queue(self, hosts: &[SimHost], job: &Job) -> usize {
        let mut best = 0;
        let mut best_score = self.queue_score(&hosts[0], job);
        for (index, host) in hosts.iter().enumerate().skip(1) {
            let score = self.queue_score(host, job);
            if score < best_score {
                best = index;
                best_score = score;
            }
        }
        best
    }
}

/// Rough wait estimate from utilization and queue depth. Compute units
/// block far longer, so their wait doubles.
fn estimate_wait_secs(host: &SimHost, job: &Job) -> f64 {
    let mut base = 600.0 * host.cpu_utilization();
    if job.kind == JobKind::ComputeIntensive {
        base *= 2.0;
    }
    let queue_wait = 1200.0 * host.queue.len() as f64 * 0.5;
    base + queue_wait
}
