//! Simulation events.

/// A record in the simulator's logical-time pipeline. Stamps are
/// seconds of logical time from the start of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A new unit appeared.
    Arrival { at: u64, job: u64 },
    /// A unit acquired its requested resources on a host.
    Start { at: u64, job: u64, host: String },
    /// A started unit released its resources.
    Completion { at: u64, job: u64 },
}

impl SimEvent {
    pub fn at(&self) -> u64 {
        match self {
            SimEvent::Arrival { at, .. }
            | SimEvent::Start { at, .. }
            | SimEvent::Completion { at, .. } => *at,
        }
    }

    pub fn job(&self) -> u64 {
        match self {
            SimEvent::Arrival { job, .. }
            | SimEvent::Start { job, .. }
            | SimEvent::Completion { job, .. } => *job,
        }
    }
}
