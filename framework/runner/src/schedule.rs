use std::time::{Duration, Instant};

/// Counter metric recording arrival-rate iterations that were skipped because
/// the agent pool was already at its ceiling.
pub const DROPPED_ITERATIONS_METRIC: &str = "dropped_iterations";

/// How long an idle arrival-rate agent waits for a permit before rechecking
/// the shutdown flag.
pub(crate) const PERMIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How behaviour iterations are scheduled onto agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A fixed pool of agents, each looping the behaviour back-to-back for
    /// the whole run.
    ConstantAgents { agents: usize },
    /// A target number of behaviour iterations started per second. Iteration
    /// permits are handed to idle agents; when every agent is busy the pool
    /// grows from `preallocated_agents` up to `max_agents`, and past the
    /// ceiling iterations are dropped and counted instead of queued.
    ConstantArrivalRate {
        rate_per_sec: u32,
        preallocated_agents: usize,
        max_agents: usize,
    },
}

/// Absolute tick schedule for a constant arrival rate.
///
/// Deadlines advance by a fixed interval from the start instant rather than
/// from "now", so a tick that fires late is followed by catch-up ticks and
/// the average rate holds.
pub(crate) struct ArrivalSchedule {
    next: Instant,
    interval: Duration,
}

impl ArrivalSchedule {
    pub(crate) fn new(start: Instant, rate_per_sec: u32) -> Self {
        Self {
            next: start,
            interval: interval_for_rate(rate_per_sec),
        }
    }

    /// Sleep until the next tick deadline, then advance it.
    pub(crate) fn wait_for_next_tick(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        self.next += self.interval;
    }
}

fn interval_for_rate(rate_per_sec: u32) -> Duration {
    // A rate of zero would never tick; treat it as one per second rather than
    // dividing by zero.
    Duration::from_secs(1) / rate_per_sec.max(1)
}
