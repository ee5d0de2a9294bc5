//! Radar pipeline: smoothing, pattern classification and the hit trail,
//! plus the read-only snapshot handed to renderers.

mod classifier;
mod history;
mod smoothing;

pub use classifier::{Pattern, PatternClassifier};
pub use history::{HitHistory, RadarHit, TRAIL_DURATION};
pub use smoothing::{LoudnessNormalizer, MAX_RADIUS, MIN_RADIUS};

use crate::audio::{DirectionSample, OutputMode};
use crate::config::SensitivityProfile;
use serde::Serialize;
use std::time::Instant;

/// Per-pattern distance emphasis applied on top of the profile's range
/// scale when building hit views. These are not semantic labels, just a
/// rough distance bias per pattern bucket.
const PATTERN_STYLES: [(Pattern, f32); 4] = [
    (Pattern::Strong, 0.7),  // strong impulse: pull closer
    (Pattern::Medium, 1.0),  // rhythmic/burst: neutral
    (Pattern::Weak, 1.2),    // soft/residual: push farther
    (Pattern::Unknown, 1.0),
];

fn distance_emphasis(pattern: Pattern) -> f32 {
    PATTERN_STYLES
        .iter()
        .find(|(id, _)| *id == pattern)
        .map(|(_, scale)| *scale)
        .unwrap_or(1.0)
}

/// One hit prepared for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitView {
    pub azimuth: f32,
    pub elevation: f32,
    pub magnitude: f32,

    /// Display radius after range scale and pattern emphasis, 0.05..1.0
    pub radius_factor: f32,

    pub pattern: Pattern,

    /// Remaining opacity, 1 fresh to 0 at the trail boundary
    pub fade: f32,
}

/// Read-only state handed to the renderer on each pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSnapshot {
    /// Current (pruned) trail, oldest first
    pub hits: Vec<HitView>,

    /// Direction for textual display: the most recent hit's, or the raw
    /// latest sample when the trail is empty
    pub direction: DirectionSample,

    /// Human-readable output mode plus active profile name
    pub mode_label: String,
}

/// Consumer-side pipeline state: turns resolved direction samples into a
/// decaying trail of classified hits.
#[derive(Debug, Clone, Default)]
pub struct RadarProcessor {
    normalizer: LoudnessNormalizer,
    classifier: PatternClassifier,
    history: HitHistory,
}

impl RadarProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &HitHistory {
        &self.history
    }

    /// Feed one resolved sample through smoothing and classification.
    ///
    /// Background samples and samples below the audibility floor leave the
    /// pipeline untouched; everything else appends exactly one hit.
    pub fn observe(&mut self, sample: &DirectionSample, at: Instant, profile: &SensitivityProfile) {
        if sample.is_background || sample.magnitude <= profile.audible_floor() {
            return;
        }

        let radius_factor = self
            .normalizer
            .radius_factor(sample.magnitude, profile.smoothing());
        let pattern = self
            .classifier
            .classify(sample, self.history.latest(), at, profile);

        self.history.push(RadarHit {
            direction: sample.clone(),
            radius_factor,
            pattern,
            at,
        });
    }

    /// Prune expired hits and build the renderer snapshot.
    pub fn snapshot(
        &mut self,
        latest: &DirectionSample,
        mode: OutputMode,
        profile: &SensitivityProfile,
        now: Instant,
    ) -> RadarSnapshot {
        self.history.prune(now);

        let scale = profile.distance_scale();
        let hits = self
            .history
            .iter()
            .map(|hit| HitView {
                azimuth: hit.direction.azimuth,
                elevation: hit.direction.elevation,
                magnitude: hit.direction.magnitude,
                radius_factor: (hit.radius_factor * scale * distance_emphasis(hit.pattern))
                    .clamp(0.05, 1.0),
                pattern: hit.pattern,
                fade: self.history.fade_of(hit, now),
            })
            .collect();

        let direction = self
            .history
            .latest()
            .map(|hit| hit.direction.clone())
            .unwrap_or_else(|| latest.clone());

        RadarSnapshot {
            hits,
            direction,
            mode_label: format!("{} ({})", mode.label(), profile.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(azimuth: f32, magnitude: f32) -> DirectionSample {
        DirectionSample {
            azimuth,
            magnitude,
            ..Default::default()
        }
    }

    fn background() -> DirectionSample {
        DirectionSample {
            is_background: true,
            ..Default::default()
        }
    }

    #[test]
    fn qualifying_samples_append_hits() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let now = Instant::now();

        radar.observe(&sample(0.3, 0.5), now, &profile);
        radar.observe(&sample(0.4, 0.4), now + Duration::from_millis(50), &profile);

        assert_eq!(radar.history().len(), 2);
    }

    #[test]
    fn background_and_quiet_samples_are_ignored() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let now = Instant::now();

        radar.observe(&background(), now, &profile);
        radar.observe(&sample(0.3, 0.1), now, &profile); // below the 0.15 floor

        assert!(radar.history().is_empty());
    }

    #[test]
    fn snapshot_prunes_before_reporting() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let start = Instant::now();

        radar.observe(&sample(0.3, 0.5), start, &profile);
        radar.observe(&sample(0.5, 0.5), start + Duration::from_millis(1000), &profile);

        let snapshot = radar.snapshot(
            &DirectionSample::default(),
            OutputMode::Multichannel,
            &profile,
            start + Duration::from_millis(1600),
        );

        assert_eq!(snapshot.hits.len(), 1);
        assert_eq!(snapshot.hits[0].azimuth, 0.5);
        assert!(snapshot.hits[0].fade > 0.0);
    }

    #[test]
    fn snapshot_direction_falls_back_to_latest_sample() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let latest = sample(-0.8, 0.05);

        let snapshot = radar.snapshot(&latest, OutputMode::Headphone, &profile, Instant::now());

        assert!(snapshot.hits.is_empty());
        assert_eq!(snapshot.direction, latest);
    }

    #[test]
    fn snapshot_direction_prefers_the_newest_hit() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let now = Instant::now();

        radar.observe(&sample(0.2, 0.5), now, &profile);
        radar.observe(&sample(0.7, 0.5), now + Duration::from_millis(100), &profile);

        let snapshot = radar.snapshot(
            &DirectionSample::default(),
            OutputMode::Multichannel,
            &profile,
            now + Duration::from_millis(200),
        );
        assert_eq!(snapshot.direction.azimuth, 0.7);
    }

    #[test]
    fn strong_hits_render_closer_than_weak_hits() {
        // Same stored radius; Strong's 0.7 emphasis must pull the view in
        // while Weak's 1.2 pushes it out.
        assert!(distance_emphasis(Pattern::Strong) < distance_emphasis(Pattern::Medium));
        assert!(distance_emphasis(Pattern::Weak) > distance_emphasis(Pattern::Medium));
    }

    #[test]
    fn view_radius_honors_the_range_scale() {
        let mut radar = RadarProcessor::new();
        let mut profile = SensitivityProfile::default();
        let now = Instant::now();

        radar.observe(&sample(0.0, 0.5), now, &profile);

        profile.distance_scale = 0.5;
        let near = radar
            .snapshot(&DirectionSample::default(), OutputMode::Headphone, &profile, now)
            .hits[0]
            .radius_factor;

        profile.distance_scale = 2.0;
        let far = radar
            .snapshot(&DirectionSample::default(), OutputMode::Headphone, &profile, now)
            .hits[0]
            .radius_factor;

        assert!(near < far);
    }

    #[test]
    fn mode_label_names_mode_and_profile() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();

        let snapshot = radar.snapshot(
            &DirectionSample::default(),
            OutputMode::Headphone,
            &profile,
            Instant::now(),
        );
        assert_eq!(snapshot.mode_label, "Headphone (balanced)");
    }

    #[test]
    fn rapid_recurrences_classify_as_medium_through_the_pipeline() {
        let mut radar = RadarProcessor::new();
        let profile = SensitivityProfile::default();
        let now = Instant::now();

        radar.observe(&sample(0.1, 0.4), now, &profile);
        radar.observe(&sample(0.15, 0.4), now + Duration::from_millis(400), &profile);

        let patterns: Vec<Pattern> = radar.history().iter().map(|h| h.pattern).collect();
        assert_eq!(patterns, vec![Pattern::Weak, Pattern::Medium]);
    }
}
