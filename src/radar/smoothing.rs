//! Loudness normalization: tracks a slowly-adapting reference magnitude and
//! maps each sample's relative loudness to a visualization radius.

/// Innermost radius factor a hit can be drawn at.
pub const MIN_RADIUS: f32 = 0.12;

/// Outermost radius factor (the radar's outer ring).
pub const MAX_RADIUS: f32 = 1.0;

/// Relative loudness treated as "as close as it gets".
const LOUDNESS_CEILING: f32 = 1.5;

/// Exponential-moving-average reference magnitude plus the non-linear
/// loudness → radius mapping.
///
/// The reference seeds itself from the first observed magnitude and is
/// re-seeded whenever it decays to non-positive.
#[derive(Debug, Clone, Default)]
pub struct LoudnessNormalizer {
    reference: f32,
}

impl LoudnessNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reference magnitude (0 until the first sample).
    pub fn reference(&self) -> f32 {
        self.reference
    }

    pub fn reset(&mut self) {
        self.reference = 0.0;
    }

    /// Fold a sample into the reference and return its radius factor.
    ///
    /// `smoothing` is the EMA weight of the new sample.
    pub fn radius_factor(&mut self, magnitude: f32, smoothing: f32) -> f32 {
        if self.reference <= 0.0 {
            self.reference = magnitude;
        } else {
            self.reference = (1.0 - smoothing) * self.reference + smoothing * magnitude;
        }

        let reference = if self.reference > 1e-3 {
            self.reference
        } else {
            magnitude
        };
        let relative = if reference > 1e-3 {
            (magnitude / reference).clamp(0.0, 2.0)
        } else {
            1.0
        };

        radius_from_relative(relative)
    }
}

/// Map relative loudness to a radius factor.
///
/// relative ~= 0   -> outer ring (far)
/// relative ~= 1   -> baseline
/// relative >= 1.5 -> tight to center (close)
///
/// The quiet term is squared so loud events compress toward the center
/// while quiet ones spread outward.
fn radius_from_relative(relative: f32) -> f32 {
    let loud = (relative / LOUDNESS_CEILING).clamp(0.0, 1.0);
    let quiet = 1.0 - loud;
    (MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * quiet * quiet).clamp(MIN_RADIUS, MAX_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f32, expected: f32, tolerance: f32) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} +/- {tolerance}, got {actual}"
        );
    }

    #[test]
    fn first_sample_seeds_the_reference() {
        let mut normalizer = LoudnessNormalizer::new();
        normalizer.radius_factor(0.5, 0.3);
        assert_approx(normalizer.reference(), 0.5, 1e-6);
    }

    #[test]
    fn reference_follows_the_ema_weights() {
        let mut normalizer = LoudnessNormalizer::new();
        normalizer.radius_factor(0.5, 0.3);
        normalizer.radius_factor(1.0, 0.3);

        // 0.7 * 0.5 + 0.3 * 1.0
        assert_approx(normalizer.reference(), 0.65, 1e-6);
    }

    #[test]
    fn baseline_loudness_lands_between_the_radius_bounds() {
        // relative = 1: loud = 2/3, quiet = 1/3 -> 0.12 + 0.88 / 9
        let factor = radius_from_relative(1.0);
        assert_approx(factor, 0.12 + 0.88 / 9.0, 1e-5);
    }

    #[test]
    fn louder_samples_draw_closer_to_center() {
        let quiet = radius_from_relative(0.4);
        let baseline = radius_from_relative(1.0);
        let loud = radius_from_relative(1.4);

        assert!(quiet > baseline);
        assert!(baseline > loud);
    }

    #[test]
    fn radius_factor_is_monotonic_in_relative_loudness() {
        let mut previous = f32::MAX;
        for step in 0..=30 {
            let relative = step as f32 * 0.05;
            let factor = radius_from_relative(relative);
            assert!(
                factor <= previous,
                "radius should not grow with loudness (relative {relative})"
            );
            previous = factor;
        }
    }

    #[test]
    fn radius_factor_stays_within_bounds() {
        assert_eq!(radius_from_relative(0.0), MAX_RADIUS);
        assert_eq!(radius_from_relative(2.0), MIN_RADIUS);
    }

    #[test]
    fn reset_reseeds_from_the_next_sample() {
        let mut normalizer = LoudnessNormalizer::new();
        normalizer.radius_factor(0.9, 0.3);
        normalizer.reset();
        normalizer.radius_factor(0.2, 0.3);
        assert_approx(normalizer.reference(), 0.2, 1e-6);
    }
}
