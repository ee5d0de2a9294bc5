//! Engine assembly: wires the capture/analysis loop and the throttled
//! visualization loop around the shared direction cell, and exposes the
//! renderer-facing snapshot accessor.

use crate::audio::{
    self, AudioCaptureHandle, CaptureError, SampleQueue, StreamProfile,
};
use crate::config::{EngineSettings, SharedSettings};
use crate::radar::{RadarProcessor, RadarSnapshot};
use crate::state::{DirectionCell, EngineStatus, ShutdownSignal};
use crate::throttle::{AdaptiveThrottle, LoadSampler, ProcessLoadSampler};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// The direction resolution & pattern classification engine.
///
/// Owns two loops: the capture/analysis thread resolving a direction per
/// buffer, and the visualization thread feeding the radar pipeline on an
/// adaptive tick. All shared state is handed to the loops at construction.
pub struct RadarEngine {
    settings: SharedSettings,
    cell: DirectionCell,
    radar: Arc<Mutex<RadarProcessor>>,
    stream_info: Arc<Mutex<StreamProfile>>,
    status: Arc<EngineStatus>,
    queue: Arc<SampleQueue>,
    shutdown: Arc<ShutdownSignal>,
    capture: Option<AudioCaptureHandle>,
    analysis_thread: Option<JoinHandle<()>>,
    radar_thread: Option<JoinHandle<()>>,
}

impl RadarEngine {
    /// Start against a capture device (None = default system loopback).
    pub fn start(
        source_id: Option<String>,
        settings: EngineSettings,
    ) -> Result<Self, CaptureError> {
        let mut engine = Self::assemble(settings);

        let capture = AudioCaptureHandle::new(
            source_id,
            engine.queue.clone(),
            engine.settings.clone(),
            engine.cell.clone(),
            engine.stream_info.clone(),
            engine.status.clone(),
        )?;
        engine.capture = Some(capture);
        engine.spawn_radar_loop(Box::new(ProcessLoadSampler::new()))?;

        Ok(engine)
    }

    /// Start without a capture device; an external collaborator pushes
    /// `CaptureEvent`s into `queue()` instead.
    pub fn with_external_capture(settings: EngineSettings) -> Result<Self, CaptureError> {
        Self::with_external_capture_and_sampler(settings, Box::new(ProcessLoadSampler::new()))
    }

    /// External-capture engine with a caller-supplied load sampler.
    pub fn with_external_capture_and_sampler(
        settings: EngineSettings,
        sampler: Box<dyn LoadSampler>,
    ) -> Result<Self, CaptureError> {
        let mut engine = Self::assemble(settings);

        let queue = engine.queue.clone();
        let loop_settings = engine.settings.clone();
        let cell = engine.cell.clone();
        let stream_info = engine.stream_info.clone();
        let analysis_thread = thread::Builder::new()
            .name("sound-radar-analysis".to_string())
            .spawn(move || {
                audio::run_analysis_loop(&queue, &loop_settings, &cell, &stream_info);
            })
            .map_err(|e| CaptureError::ThreadError(e.to_string()))?;
        engine.analysis_thread = Some(analysis_thread);

        engine.spawn_radar_loop(sampler)?;
        Ok(engine)
    }

    fn assemble(settings: EngineSettings) -> Self {
        Self {
            settings: SharedSettings::new(settings),
            cell: DirectionCell::default(),
            radar: Arc::new(Mutex::new(RadarProcessor::new())),
            stream_info: Arc::new(Mutex::new(StreamProfile::default())),
            status: Arc::new(EngineStatus::default()),
            queue: Arc::new(SampleQueue::new()),
            shutdown: Arc::new(ShutdownSignal::default()),
            capture: None,
            analysis_thread: None,
            radar_thread: None,
        }
    }

    fn spawn_radar_loop(&mut self, sampler: Box<dyn LoadSampler>) -> Result<(), CaptureError> {
        let shutdown = self.shutdown.clone();
        let settings = self.settings.clone();
        let cell = self.cell.clone();
        let radar = self.radar.clone();

        let handle = thread::Builder::new()
            .name("sound-radar-viz".to_string())
            .spawn(move || {
                run_radar_loop(shutdown, settings, cell, radar, sampler);
            })
            .map_err(|e| CaptureError::ThreadError(e.to_string()))?;

        self.radar_thread = Some(handle);
        Ok(())
    }

    /// Queue the capture collaborator feeds.
    pub fn queue(&self) -> Arc<SampleQueue> {
        self.queue.clone()
    }

    /// Hot-reloadable settings handle.
    pub fn settings(&self) -> SharedSettings {
        self.settings.clone()
    }

    /// Replace the engine configuration at runtime.
    pub fn update_settings(&self, settings: EngineSettings) {
        self.settings.replace(settings);
    }

    /// Setter for the session-telemetry collaborator.
    pub fn set_dominant_label(&self, label: Option<String>) {
        self.cell.set_dominant_label(label);
    }

    /// Fatal capture condition, if one occurred.
    pub fn fatal_error(&self) -> Option<String> {
        self.status.fatal_error()
    }

    /// Read-only snapshot for the renderer: pruned trail, display direction
    /// and the mode/profile label.
    pub fn snapshot(&self) -> RadarSnapshot {
        let view = self.settings.snapshot();
        let mode = audio::resolve_mode(view.mode, &self.stream_info.lock());
        self.radar
            .lock()
            .snapshot(&self.cell.load(), mode, &view.profile, Instant::now())
    }

    /// Shut both loops down. Bounded latency: the analysis loop wakes on
    /// queue close, the visualization loop on the shutdown signal.
    pub fn stop(&mut self) {
        self.shutdown.signal();
        self.queue.close();

        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
        if let Some(handle) = self.analysis_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.radar_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RadarEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Visualization loop: adaptive tick, read latest direction, feed the radar
/// pipeline.
fn run_radar_loop(
    shutdown: Arc<ShutdownSignal>,
    settings: SharedSettings,
    cell: DirectionCell,
    radar: Arc<Mutex<RadarProcessor>>,
    mut sampler: Box<dyn LoadSampler>,
) {
    let mut throttle = AdaptiveThrottle::default();
    log::debug!("visualization loop started");

    loop {
        if shutdown.wait_timeout(throttle.interval()) {
            break;
        }

        let view = settings.snapshot();
        throttle.tick(sampler.as_mut(), &view.limits);

        let direction = cell.load();
        radar.lock().observe(&direction, Instant::now(), &view.profile);
    }

    log::debug!("visualization loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CaptureBlock, CaptureEvent, ChannelLayout};
    use crate::config::ModeOverride;
    use crate::throttle::LoadSnapshot;
    use std::time::Duration;

    /// Sampler reporting a calm process.
    struct IdleSampler;

    impl LoadSampler for IdleSampler {
        fn sample(&mut self) -> Option<LoadSnapshot> {
            Some(LoadSnapshot {
                cpu_percent: 0.5,
                memory_mb: 10,
            })
        }
    }

    fn engine() -> RadarEngine {
        RadarEngine::with_external_capture_and_sampler(
            EngineSettings::default(),
            Box::new(IdleSampler),
        )
        .unwrap()
    }

    fn loud_right_block() -> CaptureEvent {
        // Loud, right-heavy stereo content: resolves right with a magnitude
        // above the audibility floor.
        let samples: Vec<f32> = (0..64).flat_map(|_| [0.2, 0.8]).collect();
        CaptureEvent::Buffer(CaptureBlock {
            samples,
            layout: ChannelLayout::stereo(),
        })
    }

    #[test]
    fn pushed_buffers_become_radar_hits() {
        let mut engine = engine();
        engine.queue().push(loud_right_block());

        // Give the analysis loop and a few visualization ticks time to run
        thread::sleep(Duration::from_millis(120));

        let snapshot = engine.snapshot();
        assert!(!snapshot.hits.is_empty(), "expected at least one hit");
        assert!(snapshot.direction.azimuth > 0.0);

        engine.stop();
    }

    #[test]
    fn snapshot_labels_stereo_streams_as_headphone() {
        let mut engine = engine();
        engine.queue().push(loud_right_block());
        thread::sleep(Duration::from_millis(60));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.mode_label, "Headphone (balanced)");

        engine.stop();
    }

    #[test]
    fn settings_hot_reload_switches_mode_without_restart() {
        let mut engine = engine();
        engine.queue().push(loud_right_block());
        thread::sleep(Duration::from_millis(60));

        engine.settings().apply(|s| s.mode = ModeOverride::Multichannel);
        let snapshot = engine.snapshot();
        assert!(snapshot.mode_label.starts_with("Multichannel"));

        engine.stop();
    }

    #[test]
    fn dominant_label_setter_reaches_the_snapshot() {
        let mut engine = engine();
        engine.set_dominant_label(Some("Game.exe".to_string()));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.direction.dominant_label.as_deref(), Some("Game.exe"));

        engine.stop();
    }

    #[test]
    fn stop_terminates_promptly_and_is_idempotent() {
        let mut engine = engine();
        let start = Instant::now();
        engine.stop();
        engine.stop();
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(engine.fatal_error().is_none());
    }
}
