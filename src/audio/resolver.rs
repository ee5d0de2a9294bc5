//! Direction resolution: per-direction energies in, a single
//! azimuth/elevation/magnitude sample out.
//!
//! Applies the user's direction filter, decides headphone vs multichannel
//! presentation, and rejects left/right-balanced content as background
//! music before computing angles.

use super::energy::{speakers, ChannelEnergy, ChannelLayout};
use crate::config::{DirectionFilter, ModeOverride, SensitivityProfile};
use serde::Serialize;

/// A resolved direction sample for one captured buffer.
///
/// When `is_background` is true the sample represents ambient content:
/// magnitude is zero and the angles carry no meaning.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DirectionSample {
    /// Horizontal angle in radians, 0 = front, positive = right
    pub azimuth: f32,

    /// Vertical angle in radians, 0 = horizontal plane
    pub elevation: f32,

    /// Aggregate loudness, 0 when silent or background
    pub magnitude: f32,

    /// Sample was rejected as left/right-balanced ambient content
    pub is_background: bool,

    /// Display label of the loudest audio session, if a telemetry
    /// collaborator supplied one
    pub dominant_label: Option<String>,
}

/// Presentation mode the resolver operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Only the left/right differential is meaningful
    Headphone,
    /// All six directions contribute
    Multichannel,
}

impl OutputMode {
    pub fn label(&self) -> &'static str {
        match self {
            OutputMode::Headphone => "Headphone",
            OutputMode::Multichannel => "Multichannel",
        }
    }
}

/// Format facts about the capture stream that drive Auto mode detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamProfile {
    pub layout: ChannelLayout,
}

impl StreamProfile {
    pub fn new(layout: ChannelLayout) -> Self {
        Self { layout }
    }

    /// Plain stereo endpoint (typical headphones / virtual surround output).
    pub fn is_stereo(&self) -> bool {
        let mask = self.layout.mask.unwrap_or(speakers::STEREO);
        self.layout.channels <= 2 && mask & !speakers::STEREO == 0
    }

    /// 5.1 / 7.1 class endpoint.
    pub fn is_multichannel(&self) -> bool {
        self.layout.channels >= 6
    }

    /// Endpoint exposes explicit spatial (top/back/side) channels.
    pub fn is_spatial(&self) -> bool {
        let mask = self.layout.mask.unwrap_or(0);
        mask & (speakers::TOP_FRONT_LEFT
            | speakers::BACK_LEFT
            | speakers::SIDE_LEFT
            | speakers::SIDE_RIGHT)
            != 0
    }
}

impl Default for StreamProfile {
    fn default() -> Self {
        Self::new(ChannelLayout::stereo())
    }
}

/// Decide the operating mode: explicit overrides win, Auto follows the
/// stream format (headphone iff plain stereo).
pub fn resolve_mode(override_mode: ModeOverride, stream: &StreamProfile) -> OutputMode {
    match override_mode {
        ModeOverride::Headphone => OutputMode::Headphone,
        ModeOverride::Multichannel => OutputMode::Multichannel,
        ModeOverride::Auto => {
            if stream.is_stereo() && !stream.is_spatial() {
                OutputMode::Headphone
            } else {
                OutputMode::Multichannel
            }
        }
    }
}

/// Resolve a direction from per-direction energies.
///
/// Deterministic and infallible: silent input yields a zero-magnitude
/// sample, never an error.
pub fn resolve(
    energy: &ChannelEnergy,
    filter: &DirectionFilter,
    mode: OutputMode,
    profile: &SensitivityProfile,
) -> DirectionSample {
    let mut front = if filter.front { energy.front } else { 0.0 };
    let mut back = if filter.back { energy.back } else { 0.0 };
    let left = if filter.left { energy.left } else { 0.0 };
    let right = if filter.right { energy.right } else { 0.0 };
    let mut top = if filter.up { energy.top } else { 0.0 };
    let mut bottom = if filter.down { energy.bottom } else { 0.0 };

    if mode == OutputMode::Headphone {
        front = 0.0;
        back = 0.0;
        top = 0.0;
        bottom = 0.0;
    }

    // Background rejection: near-identical left/right energy cannot
    // represent a localized event.
    let lr_total = left + right;
    if lr_total > 1e-4 {
        let balance = (left - right).abs() / lr_total;
        if balance < profile.balance_floor() {
            return DirectionSample {
                is_background: true,
                ..Default::default()
            };
        }
    }

    let total = front + back + left + right + top + bottom;
    if total <= 1e-3 {
        return DirectionSample::default();
    }

    let x = right - left;
    let z = front - back;
    let y = top - bottom;

    DirectionSample {
        azimuth: x.atan2(z),
        elevation: y.atan2((x * x + z * z).sqrt()),
        magnitude: total / 6.0,
        is_background: false,
        dominant_label: None,
    }
}
