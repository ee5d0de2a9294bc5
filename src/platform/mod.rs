//! Platform-specific process load sampling.
//!
//! Each platform module provides `process_stat()` returning the process's
//! cumulative CPU time and resident memory. The adaptive throttle turns
//! consecutive readings into a CPU percentage; platforms where sampling is
//! unavailable simply return `None` and the throttle stays at its base tick.

use std::time::Duration;

/// Cumulative process resource usage at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStat {
    /// Total CPU time (kernel + user) consumed so far
    pub cpu_time: Duration,

    /// Resident set size in MB
    pub resident_mb: u64,
}

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

/// Sample the current process, best effort.
pub fn process_stat() -> Option<ProcessStat> {
    #[cfg(target_os = "windows")]
    {
        windows::process_stat()
    }

    #[cfg(target_os = "linux")]
    {
        linux::process_stat()
    }

    #[cfg(target_os = "macos")]
    {
        macos::process_stat()
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
