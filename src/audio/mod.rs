//! Audio capture, channel energy extraction and direction resolution.

mod capture;
mod energy;
mod resolver;
mod sources;

pub use capture::{
    AudioCaptureHandle, CaptureBlock, CaptureError, CaptureEvent, SampleQueue,
};
pub use energy::{extract as extract_energy, speakers, ChannelEnergy, ChannelLayout};
pub use resolver::{resolve, resolve_mode, DirectionSample, OutputMode, StreamProfile};
pub use sources::{list_sources, AudioSource, SourceError, SourceType};

pub(crate) use capture::run_analysis_loop;
