#![forbid(unsafe_code)]

use parking_lot::Mutex;
use std::time::Duration;
use tracing::trace;

/// Running latency total of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsState {
    pub total_latency: Duration,
    pub completed: u64,
}

impl MetricsState {
    pub const ZERO: Self = Self {
        total_latency: Duration::ZERO,
        completed: 0,
    };

    /// Fold one successful fetch into the total.
    #[must_use]
    pub fn accumulate(self, latency: Duration) -> Self {
        Self {
            total_latency: self.total_latency.saturating_add(latency),
            completed: self.completed.saturating_add(1),
        }
    }

    /// Mean latency in whole nanoseconds, `None` before the first completion.
    pub fn average(&self) -> Option<Duration> {
        if self.completed == 0 {
            return None;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.completed);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No cycle has been started yet.
    #[default]
    Idle,
    Accumulating,
    Done,
}

/// Result of a single [`MetricsAggregator::report_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// State right after this report was folded in.
    pub state: MetricsState,
    /// The cycle average, set only on the report that reached the target.
    pub published: Option<Duration>,
}

impl Report {
    pub fn completed(&self) -> u64 {
        self.state.completed
    }
}

#[derive(Debug, Default)]
struct Cycle {
    state: MetricsState,
    target: u64,
    phase: Phase,
    last_published: Option<Duration>,
}

/// Folds latencies from concurrently completing fetches and detects the
/// report that completes the cycle.
///
/// The fold and the comparison against the target happen under one lock, so
/// exactly one report observes `completed == target` no matter how many
/// threads report at once. The lock is never held across an await point.
///
/// A report that belongs to a previous cycle but lands after
/// [`reset_for_new_cycle`](Self::reset_for_new_cycle) cannot be told apart
/// from a current one and is counted towards the new cycle.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    cycle: Mutex<Cycle>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the previous cycle and start counting towards `target`.
    ///
    /// A zero target is complete on the spot and never publishes an average.
    pub fn reset_for_new_cycle(&self, target: u64) -> Phase {
        let mut cycle = self.cycle.lock();
        cycle.state = MetricsState::ZERO;
        cycle.target = target;
        cycle.phase = if target == 0 {
            Phase::Done
        } else {
            Phase::Accumulating
        };
        trace!(target, phase = ?cycle.phase, "metrics reset");
        cycle.phase
    }

    /// Fold one successful fetch. Safe to call from any number of threads.
    pub fn report_completion(&self, latency: Duration) -> Report {
        let mut cycle = self.cycle.lock();
        let state = cycle.state.accumulate(latency);
        cycle.state = state;

        let published = if cycle.phase == Phase::Accumulating && state.completed == cycle.target {
            cycle.phase = Phase::Done;
            let average = state.average();
            cycle.last_published = average;
            average
        } else {
            None
        };

        trace!(
            completed = state.completed,
            target = cycle.target,
            ?latency,
            "completion reported"
        );
        Report { state, published }
    }

    pub fn snapshot(&self) -> MetricsState {
        self.cycle.lock().state
    }

    pub fn phase(&self) -> Phase {
        self.cycle.lock().phase
    }

    pub fn target(&self) -> u64 {
        self.cycle.lock().target
    }

    /// Average published by the most recent completed cycle, kept across resets.
    pub fn last_published(&self) -> Option<Duration> {
        self.cycle.lock().last_published
    }
}
