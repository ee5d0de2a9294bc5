//! Linux process load sampling via procfs.

use super::ProcessStat;
use std::fs;
use std::time::Duration;

// Kernel clock ticks per second for the utime/stime fields. USER_HZ is
// fixed at 100 for userspace-visible values.
const TICKS_PER_SECOND: u64 = 100;

const PAGE_SIZE: u64 = 4096;

pub fn process_stat() -> Option<ProcessStat> {
    let cpu_time = cpu_time()?;
    let resident_mb = resident_mb()?;
    Some(ProcessStat {
        cpu_time,
        resident_mb,
    })
}

fn cpu_time() -> Option<Duration> {
    let stat = fs::read_to_string("/proc/self/stat").ok()?;

    // The comm field is parenthesized and may contain spaces; fields resume
    // after the closing paren. utime and stime are stat fields 14 and 15,
    // i.e. the 12th and 13th fields after comm (state is the first).
    let rest = stat.rsplit(')').next()?;
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;

    let total_ticks = utime + stime;
    Some(Duration::from_millis(total_ticks * 1000 / TICKS_PER_SECOND))
}

fn resident_mb() -> Option<u64> {
    let statm = fs::read_to_string("/proc/self/statm").ok()?;
    let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    Some(resident_pages * PAGE_SIZE / (1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_stat_reads_procfs() {
        let stat = process_stat().expect("procfs should be readable on Linux");
        // A running test process has a resident set; CPU time may round to 0.
        assert!(stat.resident_mb > 0);
    }
}
