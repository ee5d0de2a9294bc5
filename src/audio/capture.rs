//! Audio capture and analysis using a dedicated thread.
//!
//! A cpal stream callback pushes interleaved float buffers into a
//! `SampleQueue`; the capture thread blocks on the queue's buffer-ready
//! signal, drains everything pending, runs energy extraction and direction
//! resolution per buffer, and publishes the latest direction. External
//! capture collaborators can push into the same queue instead of cpal.

use super::energy::{self, ChannelEnergy, ChannelLayout};
use super::resolver::{self, StreamProfile};
use crate::config::SharedSettings;
use crate::state::{DirectionCell, EngineStatus};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Pending buffers kept while the analysis side is busy. Oldest entries are
/// dropped past this; the radar only ever cares about recent sound.
const MAX_PENDING_EVENTS: usize = 32;

/// Consecutive stream errors tolerated before the capture is declared dead.
const MAX_CONSECUTIVE_FAILURES: u32 = 100;

/// Audio capture errors
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No output device found")]
    NoOutputDevice,

    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    #[error("Capture format is not float: {0:?}")]
    UnsupportedFormat(SampleFormat),

    #[error("Failed to build audio stream: {0}")]
    StreamError(String),

    #[error("Failed to start stream: {0}")]
    PlayError(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Thread error: {0}")]
    ThreadError(String),
}

/// One interleaved float buffer plus the layout it was captured with.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureBlock {
    pub samples: Vec<f32>,
    pub layout: ChannelLayout,
}

/// Queue entries handed to the analysis side.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Buffer(CaptureBlock),

    /// Explicit silent marker from collaborators that can signal it
    Silent { frames: u32 },
}

struct QueueInner {
    events: VecDeque<CaptureEvent>,
    closed: bool,
}

/// Buffer-ready signal object between the capture callback (producer) and
/// the analysis loop (consumer).
///
/// `drain` blocks until data arrives or the queue is closed, so shutdown
/// latency is bounded even when the audio device goes silent.
pub struct SampleQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
}

impl Default for SampleQueue {
    fn default() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                events: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event and wake the analysis loop. Events pushed after
    /// close are discarded.
    pub fn push(&self, event: CaptureEvent) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        if inner.events.len() >= MAX_PENDING_EVENTS {
            inner.events.pop_front();
            log::debug!("sample queue full, dropping oldest buffer");
        }
        inner.events.push_back(event);
        self.ready.notify_one();
    }

    /// Close the queue and wake any waiter.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Block until events are pending, then take all of them. Returns None
    /// once the queue is closed and drained.
    pub fn drain(&self) -> Option<Vec<CaptureEvent>> {
        let mut inner = self.inner.lock();
        loop {
            if !inner.events.is_empty() {
                return Some(inner.events.drain(..).collect());
            }
            if inner.closed {
                return None;
            }
            self.ready.wait(&mut inner);
        }
    }
}

/// Handle to the capture/analysis thread.
///
/// The cpal stream lives on that thread; dropping the handle closes the
/// queue and joins it.
pub struct AudioCaptureHandle {
    queue: Arc<SampleQueue>,
    thread_handle: Option<JoinHandle<()>>,
}

impl AudioCaptureHandle {
    /// Start capturing from the given source (None = default loopback) and
    /// publish resolved directions into `cell`.
    pub fn new(
        source_id: Option<String>,
        queue: Arc<SampleQueue>,
        settings: SharedSettings,
        cell: DirectionCell,
        stream_info: Arc<Mutex<StreamProfile>>,
        status: Arc<EngineStatus>,
    ) -> Result<Self, CaptureError> {
        let thread_queue = queue.clone();
        let thread_status = status.clone();

        let thread_handle = thread::Builder::new()
            .name("sound-radar-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture_thread(
                    source_id,
                    thread_queue,
                    settings,
                    cell,
                    stream_info,
                    thread_status.clone(),
                ) {
                    log::error!("Capture thread error: {}", e);
                    thread_status.record_fatal(e.to_string());
                }
            })
            .map_err(|e| CaptureError::ThreadError(e.to_string()))?;

        Ok(Self {
            queue,
            thread_handle: Some(thread_handle),
        })
    }

    /// Stop the capture and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.queue.close();
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioCaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run capture + analysis in a dedicated thread.
fn run_capture_thread(
    source_id: Option<String>,
    queue: Arc<SampleQueue>,
    settings: SharedSettings,
    cell: DirectionCell,
    stream_info: Arc<Mutex<StreamProfile>>,
    status: Arc<EngineStatus>,
) -> Result<(), CaptureError> {
    let host = cpal::default_host();

    // Loopback capture builds an input stream on an output device
    let mut is_loopback = false;

    let device = match &source_id {
        Some(id) if id.starts_with("output:") => {
            let device_name = id.trim_start_matches("output:");
            log::info!("Using output device for loopback: {}", device_name);
            is_loopback = true;
            host.output_devices()
                .map_err(|e| CaptureError::ConfigError(e.to_string()))?
                .find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
                .ok_or_else(|| CaptureError::SourceNotFound(device_name.to_string()))?
        }
        Some(id) if id.starts_with("input:") => {
            let device_name = id.trim_start_matches("input:");
            host.input_devices()
                .map_err(|e| CaptureError::ConfigError(e.to_string()))?
                .find(|d| d.name().map(|n| n == device_name).unwrap_or(false))
                .ok_or_else(|| CaptureError::SourceNotFound(device_name.to_string()))?
        }
        _ => {
            log::info!("Using default output device for system audio loopback");
            is_loopback = true;
            host.default_output_device()
                .ok_or(CaptureError::NoOutputDevice)?
        }
    };

    let config = if is_loopback {
        device
            .default_output_config()
            .map_err(|e| CaptureError::ConfigError(format!("Loopback config: {}", e)))?
    } else {
        device
            .default_input_config()
            .map_err(|e| CaptureError::ConfigError(e.to_string()))?
    };

    // The mix format must be float
    if config.sample_format() != SampleFormat::F32 {
        return Err(CaptureError::UnsupportedFormat(config.sample_format()));
    }

    let channels = config.channels();
    let layout = ChannelLayout::guess(channels);
    log::info!(
        "Audio capture: {} Hz, {} channels, mask {:?}",
        config.sample_rate().0,
        channels,
        layout.mask
    );

    let failures = Arc::new(AtomicU32::new(0));
    let stream = build_stream(
        &device,
        &config.into(),
        queue.clone(),
        layout,
        failures,
        status,
    )?;

    stream
        .play()
        .map_err(|e| CaptureError::PlayError(e.to_string()))?;

    log::info!("Audio capture started");

    run_analysis_loop(&queue, &settings, &cell, &stream_info);

    drop(stream);
    log::info!("Audio capture stopped");
    Ok(())
}

/// Drain the queue until it closes, resolving a direction per buffer.
///
/// Engines fed by an external capture collaborator run this directly
/// without a cpal stream.
pub(crate) fn run_analysis_loop(
    queue: &SampleQueue,
    settings: &SharedSettings,
    cell: &DirectionCell,
    stream_info: &Mutex<StreamProfile>,
) {
    while let Some(events) = queue.drain() {
        let view = settings.snapshot();

        for event in events {
            let (energy, stream) = match event {
                CaptureEvent::Buffer(block) => {
                    let stream = StreamProfile::new(block.layout);
                    let energy =
                        energy::extract(&block.samples, block.layout, view.profile.threshold_db());
                    (energy, stream)
                }
                CaptureEvent::Silent { .. } => (ChannelEnergy::default(), *stream_info.lock()),
            };

            *stream_info.lock() = stream;

            let mode = resolver::resolve_mode(view.mode, &stream);
            let sample = resolver::resolve(&energy, &view.filter, mode, &view.profile);
            cell.store(sample);
        }
    }
}

/// Build the input stream feeding the sample queue.
fn build_stream(
    device: &Device,
    config: &StreamConfig,
    queue: Arc<SampleQueue>,
    layout: ChannelLayout,
    failures: Arc<AtomicU32>,
    status: Arc<EngineStatus>,
) -> Result<cpal::Stream, CaptureError> {
    let err_failures = failures.clone();
    let err_queue = queue.clone();

    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                failures.store(0, Ordering::Relaxed);
                queue.push(CaptureEvent::Buffer(CaptureBlock {
                    samples: data.to_vec(),
                    layout,
                }));
            },
            move |err| {
                // A single failed read is a silent frame; only a long run of
                // them escalates to the fatal condition.
                err_queue.push(CaptureEvent::Silent { frames: 0 });
                let count = err_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if count == MAX_CONSECUTIVE_FAILURES {
                    log::error!("Audio stream failing repeatedly: {}", err);
                    status.record_fatal(format!("repeated capture failure: {}", err));
                } else {
                    log::debug!("Audio stream error: {}", err);
                }
            },
            None,
        )
        .map_err(|e| CaptureError::StreamError(e.to_string()))
}
