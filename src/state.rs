//! Shared state passed to the engine loops at construction time: the
//! latest-direction cell, the sticky engine status, and the interruptible
//! shutdown signal.

use crate::audio::DirectionSample;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latest resolved direction, shared between the capture/analysis loop
/// (writer) and the visualization loop (reader).
///
/// The dominant-session label is owned by an external telemetry collaborator
/// and survives direction updates; only `set_dominant_label` touches it.
#[derive(Clone, Default)]
pub struct DirectionCell {
    inner: Arc<Mutex<DirectionSample>>,
}

impl DirectionCell {
    /// Publish a newly resolved direction, preserving the session label.
    pub fn store(&self, sample: DirectionSample) {
        let mut guard = self.inner.lock();
        let label = guard.dominant_label.take();
        *guard = sample;
        if guard.dominant_label.is_none() {
            guard.dominant_label = label;
        }
    }

    /// Copy of the latest direction.
    pub fn load(&self) -> DirectionSample {
        self.inner.lock().clone()
    }

    /// Setter exposed to the session-telemetry collaborator.
    pub fn set_dominant_label(&self, label: Option<String>) {
        self.inner.lock().dominant_label = label;
    }
}

/// Sticky fatal-condition report for the owning collaborator.
///
/// Only the first fatal error is kept; the engine never retries past it.
#[derive(Default)]
pub struct EngineStatus {
    fatal: Mutex<Option<String>>,
}

impl EngineStatus {
    pub fn record_fatal(&self, message: impl Into<String>) {
        let mut guard = self.fatal.lock();
        if guard.is_none() {
            *guard = Some(message.into());
        }
    }

    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.lock().clone()
    }
}

/// One-shot shutdown signal with an interruptible timed wait.
///
/// Both engine loops park on this instead of plain sleeps so shutdown
/// latency is bounded regardless of audio-device silence or tick width.
#[derive(Default)]
pub struct ShutdownSignal {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownSignal {
    pub fn signal(&self) {
        *self.signaled.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock()
    }

    /// Wait up to `timeout`. Returns true if shutdown was signaled, false if
    /// the full timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signaled = self.signaled.lock();
        while !*signaled {
            if self.cond.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }
}
