//! macOS process load sampling.
//!
//! macOS exposes no stable public equivalent of procfs, so this is a
//! best-effort `ps` shell-out: cumulative CPU time plus resident set for
//! the current pid. Any parse failure degrades to `None` and the throttle
//! stays at its base tick.

use super::ProcessStat;
use std::process::Command;
use std::time::Duration;

pub fn process_stat() -> Option<ProcessStat> {
    let pid = std::process::id().to_string();
    let output = Command::new("ps")
        .args(["-o", "time=,rss=", "-p", &pid])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut fields = stdout.split_whitespace();
    let cpu_time = parse_cpu_time(fields.next()?)?;
    let rss_kb: u64 = fields.next()?.parse().ok()?;

    Some(ProcessStat {
        cpu_time,
        resident_mb: rss_kb / 1024,
    })
}

/// Parse ps TIME output: "MM:SS.ss" or "HH:MM:SS".
fn parse_cpu_time(value: &str) -> Option<Duration> {
    let parts: Vec<&str> = value.split(':').collect();
    let seconds = match parts.as_slice() {
        [minutes, seconds] => {
            let minutes: f64 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            minutes * 60.0 + seconds
        }
        [hours, minutes, seconds] => {
            let hours: f64 = hours.parse().ok()?;
            let minutes: f64 = minutes.parse().ok()?;
            let seconds: f64 = seconds.parse().ok()?;
            hours * 3600.0 + minutes * 60.0 + seconds
        }
        _ => return None,
    };
    Some(Duration::from_secs_f64(seconds))
}
