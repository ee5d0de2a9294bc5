//! Pattern classification: labels each qualifying sample by its temporal
//! character using an ordered rule list.

use super::history::RadarHit;
use crate::audio::DirectionSample;
use crate::config::SensitivityProfile;
use serde::Serialize;
use std::time::Instant;

/// Coarse temporal character of a hit.
///
/// `Unknown` is never produced by the current rules but remains a valid
/// member renderers must handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Strong,
    Medium,
    Weak,
    Unknown,
}

/// Classifies samples one at a time, tracking the previous sample's
/// magnitude for the transient-jump rule.
///
/// Rules are evaluated in fixed priority order: Strong, then Medium, then
/// the Weak default.
#[derive(Debug, Clone, Default)]
pub struct PatternClassifier {
    last_magnitude: f32,
}

impl PatternClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one sample against the most recent prior hit.
    ///
    /// The previous-magnitude tracking state advances exactly once per call,
    /// whatever the outcome.
    pub fn classify(
        &mut self,
        sample: &DirectionSample,
        previous_hit: Option<&RadarHit>,
        at: Instant,
        profile: &SensitivityProfile,
    ) -> Pattern {
        let jump = sample.magnitude - self.last_magnitude;

        let pattern = strong_rule(sample, jump, profile)
            .or_else(|| rhythm_rule(sample, previous_hit, at, profile))
            .unwrap_or(Pattern::Weak);

        self.last_magnitude = sample.magnitude;
        pattern
    }

    #[cfg(test)]
    fn prime(&mut self, magnitude: f32) {
        self.last_magnitude = magnitude;
    }
}

/// Strong: a loud sample that also jumped sharply over its predecessor.
fn strong_rule(sample: &DirectionSample, jump: f32, profile: &SensitivityProfile) -> Option<Pattern> {
    if sample.magnitude > profile.strong_magnitude && jump > profile.strong_jump {
        Some(Pattern::Strong)
    } else {
        None
    }
}

/// Medium: a recurrence of the previous hit within the rhythm window and in
/// a similar direction.
fn rhythm_rule(
    sample: &DirectionSample,
    previous_hit: Option<&RadarHit>,
    at: Instant,
    profile: &SensitivityProfile,
) -> Option<Pattern> {
    let last = previous_hit?;
    let dt = at.duration_since(last.at).as_secs_f32();
    if dt < profile.rhythm_min_interval || dt > profile.rhythm_max_interval {
        return None;
    }

    let bound = profile.rhythm_direction_rad();
    let azimuth_delta = (sample.azimuth - last.direction.azimuth).abs();
    let elevation_delta = (sample.elevation - last.direction.elevation).abs();
    if azimuth_delta < bound && elevation_delta < bound {
        Some(Pattern::Medium)
    } else {
        None
    }
}
