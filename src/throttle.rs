//! Adaptive tick throttle for the visualization loop.
//!
//! Every tick samples process CPU and memory; when either exceeds the
//! configured limits the tick widens to shed load, and it snaps back to
//! the base interval once usage drops.

use crate::config::PerformanceLimits;
use crate::platform::{self, ProcessStat};
use std::time::{Duration, Instant};

/// Base visualization tick.
pub const BASE_TICK: Duration = Duration::from_millis(16);

/// Widened tick used while over the resource limits.
pub const SLOW_TICK: Duration = Duration::from_millis(48);

/// Instantaneous process load reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSnapshot {
    pub cpu_percent: f32,
    pub memory_mb: u64,
}

/// Source of load readings. The process-backed implementation is the real
/// one; tests substitute scripted samplers.
pub trait LoadSampler: Send {
    fn sample(&mut self) -> Option<LoadSnapshot>;
}

/// Samples the current process, deriving CPU percent from the growth of
/// cumulative CPU time between calls.
pub struct ProcessLoadSampler {
    last: Option<(ProcessStat, Instant)>,
}

impl ProcessLoadSampler {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Default for ProcessLoadSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSampler for ProcessLoadSampler {
    fn sample(&mut self) -> Option<LoadSnapshot> {
        let stat = platform::process_stat()?;
        let now = Instant::now();

        let snapshot = match self.last {
            Some((previous, at)) => {
                let elapsed = now.duration_since(at).as_secs_f32();
                if elapsed <= 0.0 {
                    return None;
                }
                let cpu_delta = stat
                    .cpu_time
                    .saturating_sub(previous.cpu_time)
                    .as_secs_f32();
                Some(LoadSnapshot {
                    cpu_percent: cpu_delta / elapsed * 100.0,
                    memory_mb: stat.resident_mb,
                })
            }
            // First call has no baseline to diff against
            None => None,
        };

        self.last = Some((stat, now));
        snapshot
    }
}

/// Tick-interval state owned by the visualization loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptiveThrottle {
    base: Duration,
    slow: Duration,
    interval: Duration,
}

impl Default for AdaptiveThrottle {
    fn default() -> Self {
        Self::new(BASE_TICK, SLOW_TICK)
    }
}

impl AdaptiveThrottle {
    pub fn new(base: Duration, slow: Duration) -> Self {
        Self {
            base,
            slow,
            interval: base,
        }
    }

    /// The interval the loop should wait before its next tick.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Re-evaluate the interval from a fresh load reading. An unavailable
    /// reading keeps the current interval.
    pub fn tick(&mut self, sampler: &mut dyn LoadSampler, limits: &PerformanceLimits) -> Duration {
        if let Some(load) = sampler.sample() {
            let over_limit = load.cpu_percent > limits.max_cpu_percent
                || load.memory_mb > limits.max_memory_mb;
            let next = if over_limit { self.slow } else { self.base };

            if next != self.interval {
                log::debug!(
                    "throttle interval {:?} -> {:?} (cpu {:.1}%, mem {} MB)",
                    self.interval,
                    next,
                    load.cpu_percent,
                    load.memory_mb
                );
                self.interval = next;
            }
        }

        self.interval
    }
}
