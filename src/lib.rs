//! Sound Radar Engine
//!
//! Continuously samples the audio the operating system is rendering,
//! resolves a dominant sound direction per buffer, classifies qualifying
//! samples into coarse Strong/Medium/Weak patterns, and maintains a
//! 1.5-second decaying trail of hits for a radar-style overlay renderer.
//!
//! The overlay window, tray/hotkey UI, settings persistence and
//! audio-session telemetry are external collaborators; they talk to the
//! engine through [`RadarEngine`]'s snapshot accessor, the sample queue,
//! the hot-reloadable settings handle and the dominant-label setter.

pub mod audio;
pub mod config;
pub mod engine;
pub mod radar;
pub mod state;
pub mod throttle;

mod platform;

pub use audio::{
    list_sources, AudioCaptureHandle, AudioSource, CaptureBlock, CaptureError, CaptureEvent,
    ChannelEnergy, ChannelLayout, DirectionSample, OutputMode, SampleQueue, SourceError,
    SourceType, StreamProfile,
};
pub use config::{
    DirectionFilter, EngineSettings, ModeOverride, PerformanceLimits, SensitivityProfile,
    SharedSettings,
};
pub use engine::RadarEngine;
pub use radar::{HitView, Pattern, RadarHit, RadarSnapshot, TRAIL_DURATION};
pub use throttle::{AdaptiveThrottle, LoadSampler, LoadSnapshot, ProcessLoadSampler};
