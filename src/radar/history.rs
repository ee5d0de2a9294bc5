//! Radar hit trail: an append-only, time-ordered, age-pruned collection of
//! classified direction events.

use super::classifier::Pattern;
use crate::audio::DirectionSample;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How long a hit stays on the radar.
pub const TRAIL_DURATION: Duration = Duration::from_millis(1500);

/// One classified, timestamped directional event.
///
/// Hits are immutable after insertion; the only way one leaves the history
/// is the age-based prune pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarHit {
    pub direction: DirectionSample,
    pub radius_factor: f32,
    pub pattern: Pattern,
    pub at: Instant,
}

/// Time-ordered hit collection with age-based pruning.
#[derive(Debug, Clone)]
pub struct HitHistory {
    hits: VecDeque<RadarHit>,
    trail: Duration,
}

impl Default for HitHistory {
    fn default() -> Self {
        Self::new(TRAIL_DURATION)
    }
}

impl HitHistory {
    pub fn new(trail: Duration) -> Self {
        Self {
            hits: VecDeque::new(),
            trail,
        }
    }

    pub fn trail(&self) -> Duration {
        self.trail
    }

    /// Append a hit. Timestamps are expected to be non-decreasing (they come
    /// from a monotonic clock in insertion order).
    pub fn push(&mut self, hit: RadarHit) {
        debug_assert!(
            self.hits.back().map_or(true, |last| last.at <= hit.at),
            "hit history must stay time-ordered"
        );
        self.hits.push_back(hit);
    }

    /// Drop every hit whose age has reached the trail duration, preserving
    /// the order of the remainder.
    pub fn prune(&mut self, now: Instant) {
        while let Some(front) = self.hits.front() {
            if now.duration_since(front.at) >= self.trail {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    /// Remaining opacity of a hit, 1 at insertion fading to 0 at the trail
    /// boundary.
    pub fn fade_of(&self, hit: &RadarHit, now: Instant) -> f32 {
        let age = now.duration_since(hit.at).as_secs_f32();
        (1.0 - age / self.trail.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn latest(&self) -> Option<&RadarHit> {
        self.hits.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RadarHit> {
        self.hits.iter()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
