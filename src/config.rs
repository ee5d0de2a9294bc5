//! Engine configuration: sensitivity thresholds, direction filtering,
//! output-mode override and performance limits.
//!
//! All of these are supplied by an external settings/persistence layer and
//! may change at any time while the engine runs; `SharedSettings` is the
//! hot-reloadable handle both engine loops read from.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tunable detection thresholds for direction resolution and pattern
/// classification.
///
/// Out-of-range values are clamped at the point of use (see the accessor
/// methods) so a bad config can never stall the analysis loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityProfile {
    pub name: String,

    /// Energy floor in dB subtracted before normalization (-80..-10)
    pub threshold_db: f32,

    /// EMA weight of a new sample when updating the reference magnitude (0-1)
    pub smoothing: f32,

    /// Radar range scale applied to hit radii (0.5-2.0)
    pub distance_scale: f32,

    /// Minimum magnitude for a Strong classification
    pub strong_magnitude: f32,

    /// Minimum jump over the previous sample for a Strong classification
    pub strong_jump: f32,

    /// Lower bound of the rhythmic-recurrence window in seconds
    pub rhythm_min_interval: f32,

    /// Upper bound of the rhythmic-recurrence window in seconds
    pub rhythm_max_interval: f32,

    /// Maximum azimuth/elevation delta (degrees) for a rhythmic match
    pub rhythm_direction_deg: f32,

    /// Left/right imbalance below which a sample counts as background (0-1)
    pub balance_floor: f32,

    /// Minimum magnitude for a sample to produce a radar hit (0-1)
    pub audible_floor: f32,
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        Self {
            name: "balanced".to_string(),
            threshold_db: -40.0,
            smoothing: 0.3,
            distance_scale: 1.0,
            strong_magnitude: 0.6,
            strong_jump: 0.25,
            rhythm_min_interval: 0.25,
            rhythm_max_interval: 0.70,
            rhythm_direction_deg: 40.0,
            balance_floor: 0.10,
            audible_floor: 0.15,
        }
    }
}

impl SensitivityProfile {
    /// Energy floor clamped to the documented -80..-10 dB range.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db.clamp(-80.0, -10.0)
    }

    /// Reference-magnitude EMA weight clamped to 0..1.
    pub fn smoothing(&self) -> f32 {
        self.smoothing.clamp(0.0, 1.0)
    }

    /// Range scale clamped to 0.5..2.0.
    pub fn distance_scale(&self) -> f32 {
        self.distance_scale.clamp(0.5, 2.0)
    }

    /// Background-rejection balance floor clamped to 0..1.
    pub fn balance_floor(&self) -> f32 {
        self.balance_floor.clamp(0.0, 1.0)
    }

    /// Audibility floor clamped to 0..1.
    pub fn audible_floor(&self) -> f32 {
        self.audible_floor.clamp(0.0, 1.0)
    }

    /// Rhythm direction bound converted to radians.
    pub fn rhythm_direction_rad(&self) -> f32 {
        self.rhythm_direction_deg.to_radians()
    }

    /// Return all built-in profiles.
    pub fn presets() -> Vec<SensitivityProfile> {
        vec![
            SensitivityProfile::default(),
            SensitivityProfile {
                name: "sharp".to_string(),
                threshold_db: -45.0,
                strong_magnitude: 0.5,
                strong_jump: 0.18,
                rhythm_direction_deg: 30.0,
                ..Default::default()
            },
            SensitivityProfile {
                name: "relaxed".to_string(),
                threshold_db: -35.0,
                strong_magnitude: 0.7,
                strong_jump: 0.35,
                audible_floor: 0.2,
                ..Default::default()
            },
            SensitivityProfile {
                name: "quiet".to_string(),
                threshold_db: -55.0,
                smoothing: 0.2,
                audible_floor: 0.1,
                balance_floor: 0.08,
                ..Default::default()
            },
        ]
    }

    /// Look up a built-in profile by name (case-insensitive).
    pub fn preset(name: &str) -> Option<SensitivityProfile> {
        let lower = name.to_lowercase();
        Self::presets().into_iter().find(|p| p.name == lower)
    }
}

/// Per-direction enable switches. A disabled direction contributes nothing
/// to resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionFilter {
    pub front: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Default for DirectionFilter {
    fn default() -> Self {
        Self {
            front: true,
            back: true,
            left: true,
            right: true,
            up: true,
            down: true,
        }
    }
}

/// Output-mode override. Auto picks Headphone for plain stereo endpoints and
/// Multichannel otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeOverride {
    #[default]
    Auto,
    Headphone,
    Multichannel,
}

/// Resource limits for the visualization loop's adaptive throttle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLimits {
    /// Maximum process CPU usage in percent before the tick widens
    pub max_cpu_percent: f32,

    /// Maximum resident memory in MB before the tick widens
    pub max_memory_mb: u64,
}

impl Default for PerformanceLimits {
    fn default() -> Self {
        Self {
            max_cpu_percent: 5.0,
            max_memory_mb: 50,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineSettings {
    pub profile: SensitivityProfile,
    pub filter: DirectionFilter,
    pub mode: ModeOverride,
    pub limits: PerformanceLimits,
}

/// Shared, hot-reloadable settings handle.
///
/// Cloning is cheap; all clones observe updates immediately. Engine loops
/// take a snapshot per tick/buffer so a single sample is processed under a
/// consistent view.
#[derive(Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<EngineSettings>>,
}

impl SharedSettings {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings.
    pub fn snapshot(&self) -> EngineSettings {
        self.inner.read().clone()
    }

    /// Replace the settings wholesale.
    pub fn replace(&self, settings: EngineSettings) {
        *self.inner.write() = settings;
        log::debug!("engine settings replaced");
    }

    /// Mutate the settings in place.
    pub fn apply(&self, f: impl FnOnce(&mut EngineSettings)) {
        let mut guard = self.inner.write();
        f(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_matches_documented_thresholds() {
        let profile = SensitivityProfile::default();

        assert_eq!(profile.strong_magnitude, 0.6);
        assert_eq!(profile.strong_jump, 0.25);
        assert_eq!(profile.rhythm_min_interval, 0.25);
        assert_eq!(profile.rhythm_max_interval, 0.70);
        assert_eq!(profile.rhythm_direction_deg, 40.0);
        assert_eq!(profile.balance_floor, 0.10);
        assert_eq!(profile.audible_floor, 0.15);
        assert_eq!(profile.smoothing, 0.3);
    }

    #[test]
    fn out_of_range_values_are_clamped_by_accessors() {
        let profile = SensitivityProfile {
            threshold_db: -120.0,
            smoothing: 1.7,
            distance_scale: 5.0,
            balance_floor: -0.2,
            ..Default::default()
        };

        assert_eq!(profile.threshold_db(), -80.0);
        assert_eq!(profile.smoothing(), 1.0);
        assert_eq!(profile.distance_scale(), 2.0);
        assert_eq!(profile.balance_floor(), 0.0);
    }

    #[test]
    fn preset_lookup_is_case_insensitive() {
        assert!(SensitivityProfile::preset("Sharp").is_some());
        assert!(SensitivityProfile::preset("QUIET").is_some());
        assert!(SensitivityProfile::preset("nonexistent").is_none());
    }

    #[test]
    fn presets_lead_with_the_default_profile() {
        let presets = SensitivityProfile::presets();
        assert_eq!(presets[0], SensitivityProfile::default());
        let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["balanced", "sharp", "relaxed", "quiet"]);
    }

    #[test]
    fn shared_settings_updates_are_visible_to_clones() {
        let settings = SharedSettings::default();
        let observer = settings.clone();

        settings.apply(|s| {
            s.mode = ModeOverride::Headphone;
            s.profile.strong_jump = 0.4;
        });

        let seen = observer.snapshot();
        assert_eq!(seen.mode, ModeOverride::Headphone);
        assert_eq!(seen.profile.strong_jump, 0.4);
    }

    #[test]
    fn direction_filter_defaults_to_all_enabled() {
        let filter = DirectionFilter::default();
        assert!(filter.front && filter.back && filter.left && filter.right);
        assert!(filter.up && filter.down);
    }
}
