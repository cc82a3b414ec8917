//! Discrete-event simulation loop.
//!
//! Logical time advances in fixed ticks. Per tick: drain due
//! completions, scan per-host queues for units that now fit, then emit
//! arrivals due in the elapsed interval — placing immediately when a
//! host admits the request, otherwise enqueueing on the queue
//! selector's preferred host. After the configured duration arrivals
//! cease and the loop drains until idle or the hard cap.
//!
//! Determinism: hosts are sorted by name, all randomness comes from
//! seeded streams, and the region mapping iterates in key order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use carbongrid_core::{Resources, Snapshot};

use crate::config::{SimConfig, DRAIN_CAP_SECONDS, TICK_SECONDS};
use crate::event::SimEvent;
use crate::metrics::{self, RunMetrics};
use crate::policy::PolicyKind;
use crate::workload::{Job, WorkloadGenerator};

/// Fixed capacity of every synthetic host: 4 compute-units.
pub const HOST_CPU_MILLIS: u64 = 4000;
/// Fixed capacity of every synthetic host: 8 memory-units.
pub const HOST_MEMORY_BYTES: u64 = 8 << 30;

/// The policy rng draws from a stream independent of the workload's so
/// policy choices never shift the generated workload.
const POLICY_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// A synthetic execution host, one per snapshot region.
#[derive(Debug, Clone)]
pub struct SimHost {
    pub name: String,
    pub region: String,
    pub intensity: f64,
    pub capacity: Resources,
    pub available: Resources,
    /// Ids of units currently holding resources here.
    pub running: Vec<u64>,
    /// Ids of units waiting for capacity here, FIFO.
    pub queue: VecDeque<u64>,
    /// Accumulated cpu-millis × seconds, for time-integrated
    /// utilization.
    cpu_millis_seconds: u128,
}

impl SimHost {
    pub fn new(name: String, region: String, intensity: f64, capacity: Resources) -> Self {
        Self {
            name,
            region,
            intensity,
            capacity,
            available: capacity,
            running: Vec::new(),
            queue: VecDeque::new(),
            cpu_millis_seconds: 0,
        }
    }

    /// Fraction of compute capacity currently in use.
    pub fn cpu_utilization(&self) -> f64 {
        if self.capacity.cpu_millis == 0 {
            return 0.0;
        }
        (self.capacity.cpu_millis - self.available.cpu_millis) as f64
            / self.capacity.cpu_millis as f64
    }

    /// Mean utilization over `elapsed_secs` of logical time, as a
    /// percentage.
    pub fn mean_utilization_pct(&self, elapsed_secs: u64) -> f64 {
        if elapsed_secs == 0 || self.capacity.cpu_millis == 0 {
            return 0.0;
        }
        self.cpu_millis_seconds as f64
            / (self.capacity.cpu_millis as u128 * elapsed_secs as u128) as f64
            * 100.0
    }

    fn integrate_tick(&mut self) {
        let used = self.capacity.cpu_millis - self.available.cpu_millis;
        self.cpu_millis_seconds += used as u128 * TICK_SECONDS as u128;
    }

    fn start(&mut self, job: &mut Job, at: u64) -> u64 {
        job.started_at = Some(at);
        job.host = Some(self.name.clone());
        job.region = Some(self.region.clone());
        job.intensity = Some(self.intensity);
        self.available = self.available.minus(&job.request);
        self.running.push(job.id);
        at + job.hold_secs
    }
}

/// One host per snapshot region with an effective intensity, sorted by
/// name for stable iteration.
pub fn hosts_from_snapshot(snapshot: &Snapshot) -> Vec<SimHost> {
    let capacity = Resources::new(HOST_CPU_MILLIS, HOST_MEMORY_BYTES);
    let mut hosts: Vec<SimHost> = snapshot
        .regions
        .iter()
        .filter_map(|(tag, region)| {
            let intensity = region.effective_intensity()?;
            Some(SimHost::new(
                format!("{tag}-host-1"),
                tag.clone(),
                intensity,
                capacity,
            ))
        })
        .collect();
    hosts.sort_by(|a, b| a.name.cmp(&b.name));
    hosts
}

/// Everything a run produces: the rolled-up metrics plus the event
/// trace that led to them.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub metrics: RunMetrics,
    pub events: Vec<SimEvent>,
}

/// Run one policy against a snapshot. The same (snapshot, config,
/// seed) always produces the same output.
pub fn run(snapshot: &Snapshot, config: &SimConfig, policy: PolicyKind) -> RunOutput {
    let mut hosts = hosts_from_snapshot(snapshot);
    let mut jobs: Vec<Job> = Vec::new();
    let mut events: Vec<SimEvent> = Vec::new();

    if hosts.is_empty() {
        return RunOutput {
            metrics: metrics::compute(policy, &jobs, &hosts, config, 0),
            events,
        };
    }

    let mut generator = WorkloadGenerator::new(config);
    let mut policy_rng = StdRng::seed_from_u64(config.seed ^ POLICY_STREAM_SALT);
    // Pending completions, keyed by logical release time.
    let mut completions: BinaryHeap<Reverse<(u64, u64)>> = BinaryHeap::new();

    let horizon = config.duration_secs;
    let cap = horizon + DRAIN_CAP_SECONDS;
    let mut now = 0u64;

    loop {
        // 1. Completions due this tick release their resources.
        while let Some(&Reverse((at, job_id))) = completions.peek() {
            if at > now {
                break;
            }
            completions.pop();
            let job = &mut jobs[job_id as usize];
            job.completed_at = Some(at);
            let host_name = job.host.clone();
            let request = job.request;
            if let Some(host) = hosts
                .iter_mut()
                .find(|h| Some(h.name.as_str()) == host_name.as_deref())
            {
                host.available = host.available.plus(&request);
                host.running.retain(|&id| id != job_id);
            }
            events.push(SimEvent::Completion { at, job: job_id });
        }

        // 2. Queued units start as soon as capacity admits them.
        for host in hosts.iter_mut() {
            let mut waiting = VecDeque::new();
            while let Some(job_id) = host.queue.pop_front() {
                let job = &mut jobs[job_id as usize];
                if job.request.fits_within(&host.available) {
                    let done_at = host.start(job, now);
                    completions.push(Reverse((done_at, job_id)));
                    events.push(SimEvent::Start {
                        at: now,
                        job: job_id,
                        host: host.name.clone(),
                    });
                } else {
                    waiting.push_back(job_id);
                }
            }
            host.queue = waiting;
        }

        // 3. Arrivals due in the elapsed interval. After the horizon,
        // arrivals cease and the loop only drains.
        if now <= horizon {
            for mut job in generator.arrivals_until(now) {
                let job_id = job.id;
                events.push(SimEvent::Arrival {
                    at: job.created_at,
                    job: job_id,
                });

                let admissible: Vec<usize> = hosts
                    .iter()
                    .enumerate()
                    .filter(|(_, host)| job.request.fits_within(&host.available))
                    .map(|(index, _)| index)
                    .collect();

                if admissible.is_empty() {
                    let target = policy.select_queue(&hosts, &job);
                    debug!(job = job_id, host = %hosts[target].name, "queued");
                    hosts[target].queue.push_back(job_id);
                } else {
                    let target = policy.select_immediate(&hosts, &admissible, &mut policy_rng);
                    // Immediate placements start at their arrival stamp.
                    let at = job.created_at;
                    let done_at = hosts[target].start(&mut job, at);
                    completions.push(Reverse((done_at, job_id)));
                    events.push(SimEvent::Start {
                        at,
                        job: job_id,
                        host: hosts[target].name.clone(),
                    });
                }
                jobs.push(job);
            }
        }

        for host in hosts.iter_mut() {
            host.integrate_tick();
        }

        if now >= horizon {
            let idle = completions.is_empty() && hosts.iter().all(|host| host.queue.is_empty());
            if idle || now >= cap {
                break;
            }
        }
        now += TICK_SECONDS;
    }

    RunOutput {
        metrics: metrics::compute(policy, &jobs, &hosts, config, now),
        events,
    }
}

/// Run every policy against the same snapshot, config, and seed.
pub fn run_all(snapshot: &Snapshot, config: &SimConfig) -> Vec<RunMetrics> {
    PolicyKind::ALL
        .iter()
        .map(|&policy| run(snapshot, config, policy).metrics)
        .collect()
}
