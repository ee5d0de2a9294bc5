//! Channel energy extraction: interleaved float buffers in, per-direction
//! loudness out.
//!
//! Each channel's RMS level is converted to dB, offset by the configured
//! floor and normalized into 0..1 over a fixed 60 dB window, then routed to
//! one or more logical directions based on the endpoint's speaker mask.

/// WASAPI-style speaker position bits.
pub mod speakers {
    pub const FRONT_LEFT: u32 = 0x1;
    pub const FRONT_RIGHT: u32 = 0x2;
    pub const FRONT_CENTER: u32 = 0x4;
    pub const LOW_FREQUENCY: u32 = 0x8;
    pub const BACK_LEFT: u32 = 0x10;
    pub const BACK_RIGHT: u32 = 0x20;
    pub const FRONT_LEFT_OF_CENTER: u32 = 0x40;
    pub const FRONT_RIGHT_OF_CENTER: u32 = 0x80;
    pub const BACK_CENTER: u32 = 0x100;
    pub const SIDE_LEFT: u32 = 0x200;
    pub const SIDE_RIGHT: u32 = 0x400;
    pub const TOP_CENTER: u32 = 0x800;
    pub const TOP_FRONT_LEFT: u32 = 0x1000;
    pub const TOP_FRONT_CENTER: u32 = 0x2000;
    pub const TOP_FRONT_RIGHT: u32 = 0x4000;
    pub const TOP_BACK_LEFT: u32 = 0x8000;
    pub const TOP_BACK_CENTER: u32 = 0x10000;
    pub const TOP_BACK_RIGHT: u32 = 0x20000;

    pub const STEREO: u32 = FRONT_LEFT | FRONT_RIGHT;
    pub const SURROUND_5_1: u32 =
        FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER | LOW_FREQUENCY | BACK_LEFT | BACK_RIGHT;
    pub const SURROUND_7_1: u32 = SURROUND_5_1 | SIDE_LEFT | SIDE_RIGHT;
    pub const QUAD: u32 = FRONT_LEFT | FRONT_RIGHT | BACK_LEFT | BACK_RIGHT;
}

/// Channel index → speaker position order used when walking a mask.
const SPEAKER_ORDER: [u32; 18] = [
    speakers::FRONT_LEFT,
    speakers::FRONT_RIGHT,
    speakers::FRONT_CENTER,
    speakers::LOW_FREQUENCY,
    speakers::BACK_LEFT,
    speakers::BACK_RIGHT,
    speakers::FRONT_LEFT_OF_CENTER,
    speakers::FRONT_RIGHT_OF_CENTER,
    speakers::BACK_CENTER,
    speakers::SIDE_LEFT,
    speakers::SIDE_RIGHT,
    speakers::TOP_CENTER,
    speakers::TOP_FRONT_LEFT,
    speakers::TOP_FRONT_CENTER,
    speakers::TOP_FRONT_RIGHT,
    speakers::TOP_BACK_LEFT,
    speakers::TOP_BACK_CENTER,
    speakers::TOP_BACK_RIGHT,
];

/// Normalization window below full scale, in dB.
const DB_WINDOW: f32 = 60.0;

/// Channel layout of a capture stream: channel count plus the optional
/// speaker-position mask describing what each channel index feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub channels: u16,
    pub mask: Option<u32>,
}

impl ChannelLayout {
    pub fn new(channels: u16, mask: Option<u32>) -> Self {
        Self { channels, mask }
    }

    pub fn stereo() -> Self {
        Self::new(2, Some(speakers::STEREO))
    }

    /// Infer the standard layout for a channel count. Unrecognized counts
    /// carry no mask and resolve through the stereo fallback.
    pub fn guess(channels: u16) -> Self {
        let mask = match channels {
            1 => Some(speakers::FRONT_CENTER),
            2 => Some(speakers::STEREO),
            4 => Some(speakers::QUAD),
            6 => Some(speakers::SURROUND_5_1),
            8 => Some(speakers::SURROUND_7_1),
            _ => None,
        };
        Self::new(channels, mask)
    }

    /// Speaker position for a channel index: the index-th set bit of the
    /// mask in standard order, positional order past the mask's last bit.
    /// Absent masks are treated as front-left/front-right stereo.
    pub fn speaker_for(&self, index: usize) -> u32 {
        let mask = self.mask.unwrap_or(speakers::STEREO);

        if mask != 0 {
            let mut bit_index = 0;
            for &speaker in SPEAKER_ORDER.iter() {
                if mask & speaker != 0 {
                    if bit_index == index {
                        return speaker;
                    }
                    bit_index += 1;
                }
            }
        }

        SPEAKER_ORDER[if index < SPEAKER_ORDER.len() { index } else { 0 }]
    }
}

/// Normalized loudness contribution per logical direction for one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelEnergy {
    pub front: f32,
    pub back: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

fn to_decibels(value: f32) -> f32 {
    20.0 * value.max(1e-6).log10()
}

/// Extract per-direction energy from an interleaved float buffer.
///
/// Pure function of buffer + layout + floor. An empty buffer is a silent
/// frame (all-zero energy); a buffer carrying NaN/infinite samples is a
/// transient anomaly and is likewise treated as silence.
pub fn extract(samples: &[f32], layout: ChannelLayout, threshold_db: f32) -> ChannelEnergy {
    let mut energy = ChannelEnergy::default();

    let channel_count = layout.channels as usize;
    if samples.is_empty() || channel_count == 0 {
        return energy;
    }

    if samples.iter().any(|s| !s.is_finite()) {
        log::debug!("discarding buffer with non-finite samples");
        return energy;
    }

    let frames = samples.len() / channel_count;
    if frames == 0 {
        return energy;
    }

    let mut rms = vec![0.0f64; channel_count];
    for frame in samples.chunks_exact(channel_count) {
        for (channel, &sample) in frame.iter().enumerate() {
            rms[channel] += f64::from(sample) * f64::from(sample);
        }
    }

    use speakers::*;
    for (channel, sum) in rms.into_iter().enumerate() {
        let level = (sum / frames as f64).sqrt() as f32;
        let db = to_decibels(level);
        let normalized = ((db - threshold_db) / DB_WINDOW).clamp(0.0, 1.0);

        let speaker = layout.speaker_for(channel);

        if speaker & (FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER) != 0 {
            energy.front += normalized;
        }
        // Side channels count into "back" as well: most 7.1 setups use
        // SIDE_* as the rear surround pair.
        if speaker & (BACK_LEFT | BACK_RIGHT | SIDE_LEFT | SIDE_RIGHT | BACK_CENTER) != 0 {
            energy.back += normalized;
        }
        if speaker & (SIDE_LEFT | BACK_LEFT | FRONT_LEFT) != 0 {
            energy.left += normalized;
        }
        if speaker & (SIDE_RIGHT | BACK_RIGHT | FRONT_RIGHT) != 0 {
            energy.right += normalized;
        }
        if speaker & (TOP_FRONT_LEFT | TOP_FRONT_RIGHT | TOP_BACK_LEFT | TOP_BACK_RIGHT) != 0 {
            energy.top += normalized;
        }
        if speaker & (LOW_FREQUENCY | BACK_CENTER) != 0 {
            energy.bottom += normalized;
        }
    }

    energy
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR_DB: f32 = -40.0;

    fn frames(frame: &[f32], count: usize) -> Vec<f32> {
        std::iter::repeat(frame)
            .take(count)
            .flat_map(|f| f.iter().copied())
            .collect()
    }

    #[test]
    fn empty_buffer_is_silent() {
        let energy = extract(&[], ChannelLayout::stereo(), FLOOR_DB);
        assert_eq!(energy, ChannelEnergy::default());
    }

    #[test]
    fn non_finite_samples_are_treated_as_silence() {
        let samples = vec![0.5, f32::NAN, 0.5, 0.5];
        let energy = extract(&samples, ChannelLayout::stereo(), FLOOR_DB);
        assert_eq!(energy, ChannelEnergy::default());
    }

    #[test]
    fn full_scale_sample_normalizes_over_60db_window() {
        // RMS 1.0 -> 0 dB; with a -40 dB floor that is 40/60 of the window.
        let samples = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let energy = extract(&samples, ChannelLayout::stereo(), FLOOR_DB);

        assert!((energy.left - 40.0 / 60.0).abs() < 1e-4, "left {}", energy.left);
        assert_eq!(energy.right, 0.0);
        assert!((energy.front - energy.left).abs() < 1e-6);
    }

    #[test]
    fn left_only_signal_feeds_left_and_front() {
        let samples = frames(&[0.8, 0.0], 3);
        let energy = extract(&samples, ChannelLayout::stereo(), FLOOR_DB);

        assert!(energy.left > 0.0);
        assert!(energy.front > 0.0);
        assert_eq!(energy.right, 0.0);
        assert_eq!(energy.back, 0.0);
        assert_eq!(energy.top, 0.0);
    }

    #[test]
    fn surround_back_channels_feed_back_and_sides() {
        // 5.1 frame order: FL FR FC LFE BL BR
        let samples = frames(&[0.0, 0.0, 0.0, 0.0, 0.5, 0.5], 4);
        let layout = ChannelLayout::guess(6);
        let energy = extract(&samples, layout, FLOOR_DB);

        assert!(energy.back > 0.0);
        assert!(energy.left > 0.0, "BL should also count as left");
        assert!(energy.right > 0.0, "BR should also count as right");
        assert_eq!(energy.front, 0.0);
    }

    #[test]
    fn lfe_channel_feeds_bottom() {
        let samples = frames(&[0.0, 0.0, 0.0, 0.7, 0.0, 0.0], 4);
        let energy = extract(&samples, ChannelLayout::guess(6), FLOOR_DB);

        assert!(energy.bottom > 0.0);
        assert_eq!(energy.front, 0.0);
        assert_eq!(energy.left, 0.0);
    }

    #[test]
    fn top_channels_feed_top_only() {
        // 8 channels with a custom mask: stereo plus four height channels.
        let mask = speakers::STEREO
            | speakers::TOP_FRONT_LEFT
            | speakers::TOP_FRONT_RIGHT
            | speakers::TOP_BACK_LEFT
            | speakers::TOP_BACK_RIGHT;
        let layout = ChannelLayout::new(6, Some(mask));
        let samples = frames(&[0.0, 0.0, 0.6, 0.6, 0.6, 0.6], 4);
        let energy = extract(&samples, layout, FLOOR_DB);

        assert!(energy.top > 0.0);
        assert_eq!(energy.front, 0.0);
        assert_eq!(energy.bottom, 0.0);
    }

    #[test]
    fn absent_mask_falls_back_to_stereo() {
        let layout = ChannelLayout::new(2, None);
        assert_eq!(layout.speaker_for(0), speakers::FRONT_LEFT);
        assert_eq!(layout.speaker_for(1), speakers::FRONT_RIGHT);
    }

    #[test]
    fn channels_past_the_mask_use_positional_order() {
        // A stereo mask with 3 channels: the third walks off the mask and
        // lands on the positional FRONT_CENTER slot.
        let layout = ChannelLayout::new(3, Some(speakers::STEREO));
        assert_eq!(layout.speaker_for(2), speakers::FRONT_CENTER);
    }

    #[test]
    fn guess_covers_the_common_layouts() {
        assert_eq!(ChannelLayout::guess(2).mask, Some(speakers::STEREO));
        assert_eq!(ChannelLayout::guess(6).mask, Some(speakers::SURROUND_5_1));
        assert_eq!(ChannelLayout::guess(8).mask, Some(speakers::SURROUND_7_1));
        assert_eq!(ChannelLayout::guess(3).mask, None);
    }
}
