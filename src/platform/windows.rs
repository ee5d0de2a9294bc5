//! Windows process load sampling via GetProcessTimes / GetProcessMemoryInfo.

use super::ProcessStat;
use std::time::Duration;

use windows::Win32::Foundation::FILETIME;
use windows::Win32::System::ProcessStatus::{GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows::Win32::System::Threading::{GetCurrentProcess, GetProcessTimes};

fn filetime_100ns(ft: &FILETIME) -> u64 {
    (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime)
}

pub fn process_stat() -> Option<ProcessStat> {
    unsafe {
        let process = GetCurrentProcess();

        let mut creation = FILETIME::default();
        let mut exit = FILETIME::default();
        let mut kernel = FILETIME::default();
        let mut user = FILETIME::default();
        if GetProcessTimes(process, &mut creation, &mut exit, &mut kernel, &mut user).is_err() {
            return None;
        }

        // FILETIME counts 100ns intervals
        let cpu_100ns = filetime_100ns(&kernel) + filetime_100ns(&user);
        let cpu_time = Duration::from_nanos(cpu_100ns.saturating_mul(100));

        let mut counters = PROCESS_MEMORY_COUNTERS {
            cb: std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32,
            ..Default::default()
        };
        if GetProcessMemoryInfo(
            process,
            &mut counters,
            std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32,
        )
        .is_err()
        {
            return None;
        }

        Some(ProcessStat {
            cpu_time,
            resident_mb: counters.WorkingSetSize as u64 / (1024 * 1024),
        })
    }
}
