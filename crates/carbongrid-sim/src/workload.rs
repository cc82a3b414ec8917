//! Synthetic workload generation.
//!
//! All draws come from a single seeded stream in a fixed order, so the
//! same seed reproduces the same workload exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use carbongrid_core::Resources;

use crate::config::SimConfig;

/// Workload flavours with distinct duration and blocking profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Matrix multiplication, model training: long, CPU-bound.
    ComputeIntensive,
    /// Data movement: short, mostly waiting on I/O.
    IoBound,
    /// Web services, APIs.
    Mixed,
    /// Long-running batch processing.
    Batch,
}

impl JobKind {
    /// Portion of the sampled duration during which the requested
    /// resources are held on the host.
    pub fn blocking_fraction(self) -> f64 {
        match self {
            JobKind::ComputeIntensive => 0.8,
            JobKind::IoBound => 0.3,
            JobKind::Mixed => 0.5,
            JobKind::Batch => 0.7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobKind::ComputeIntensive => "compute-intensive",
            JobKind::IoBound => "io-bound",
            JobKind::Mixed => "mixed",
            JobKind::Batch => "batch",
        }
    }

    /// Duration distribution in seconds: (mean, std, floor).
    fn duration_params(self) -> (f64, f64, f64) {
        match self {
            JobKind::ComputeIntensive => (45.0 * 60.0, 20.0 * 60.0, 30.0 * 60.0),
            JobKind::Batch => (90.0 * 60.0, 30.0 * 60.0, 60.0 * 60.0),
            JobKind::IoBound => (10.0 * 60.0, 5.0 * 60.0, 5.0 * 60.0),
            JobKind::Mixed => (20.0 * 60.0, 10.0 * 60.0, 10.0 * 60.0),
        }
    }
}

/// One synthetic unit of placement.
#[derive(Debug, Clone)]
pub struct Job {
    /// Sequential id; also the job's index in the run's job table.
    pub id: u64,
    pub kind: JobKind,
    pub request: Resources,
    /// How long the request is held on the host once started: the
    /// blocking fraction of the sampled service duration. The
    /// non-blocking remainder does not occupy the host.
    pub hold_secs: u64,
    /// Logical arrival stamp.
    pub created_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub host: Option<String>,
    pub region: Option<String>,
    /// Carbon intensity of the host's region at placement.
    pub intensity: Option<f64>,
}

impl Job {
    /// Queue-and-scheduling latency: creation → start.
    pub fn latency_secs(&self) -> Option<u64> {
        self.started_at.map(|started| started - self.created_at)
    }

    /// Turnaround: creation → completion.
    pub fn turnaround_secs(&self) -> Option<u64> {
        self.completed_at.map(|done| done - self.created_at)
    }
}

/// Draws arrival stamps and job shapes from a seeded stream.
pub struct WorkloadGenerator {
    rng: StdRng,
    arrivals_per_minute: f64,
    compute_ratio: f64,
    next_arrival_secs: f64,
    next_id: u64,
}

impl WorkloadGenerator {
    pub fn new(config: &SimConfig) -> Self {
        let mut generator = Self {
            rng: StdRng::seed_from_u64(config.seed),
            arrivals_per_minute: config.arrivals_per_minute,
            compute_ratio: config.compute_ratio,
            next_arrival_secs: 0.0,
            next_id: 0,
        };
        generator.next_arrival_secs = generator.draw_interarrival_secs();
        generator
    }

    /// Emit every arrival whose stamp falls at or before `now`.
    pub fn arrivals_until(&mut self, now: u64) -> Vec<Job> {
        let mut due = Vec::new();
        while self.next_arrival_secs <= now as f64 {
            let at = self.next_arrival_secs as u64;
            due.push(self.synthesize(at));
            self.next_arrival_secs += self.draw_interarrival_secs();
        }
        due
    }

    /// Exponential inter-arrival time for a Poisson process at the
    /// configured rate. The floor keeps the stream strictly advancing.
    fn draw_interarrival_secs(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        (-(1.0 - u).ln() / self.arrivals_per_minute * 60.0).max(0.001)
    }

    fn synthesize(&mut self, created_at: u64) -> Job {
        let kind = self.draw_kind();

        let mut cpu_cores = self.sample_normal(1.0, 0.5).max(0.1);
        if kind == JobKind::ComputeIntensive {
            // Compute jobs need real cores.
            cpu_cores = cpu_cores.max(2.0);
        }
        let memory_gb = self.sample_normal(2.0, 1.0).max(0.5);

        let (mean, std, floor) = kind.duration_params();
        let duration_secs = self.sample_normal(mean, std).max(floor);
        let hold_secs = (duration_secs * kind.blocking_fraction()).round() as u64;

        let id = self.next_id;
        self.next_id += 1;

        Job {
            id,
            kind,
            request: Resources::new(
                (cpu_cores * 1000.0).round() as u64,
                (memory_gb * 1024.0).round() as u64 * (1 << 20),
            ),
            hold_secs,
            created_at,
            started_at: None,
            completed_at: None,
            host: None,
            region: None,
            intensity: None,
        }
    }

    /// Kind mix from the compute ratio r: [0,r) compute, [r,r+0.2)
    /// I/O, [r+0.2,r+0.5) mixed, remainder batch.
    fn draw_kind(&mut self) -> JobKind {
        let draw: f64 = self.rng.gen();
        if draw < self.compute_ratio {
            JobKind::ComputeIntensive
        } else if draw < self.compute_ratio + 0.2 {
            JobKind::IoBound
        } else if draw < self.compute_ratio + 0.5 {
            JobKind::Mixed
        } else {
            JobKind::Batch
        }
    }

    /// Box–Muller over the seeded uniform stream.
    fn sample_normal(&mut self, mean: f64, std: f64) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std * z
    }
}
