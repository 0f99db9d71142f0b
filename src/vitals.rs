//! Process vitals behind a trait so handlers never touch global introspection.

use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};
use time::OffsetDateTime;

/// Named memory counters, all in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// Resident set size of this process.
    pub rss: u64,
    /// Virtual memory of this process.
    pub virtual_memory: u64,
    /// Total memory of the host.
    pub system_total: u64,
    /// Memory in use on the host.
    pub system_used: u64,
}

/// Point-in-time process vitals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSnapshot {
    /// Epoch milliseconds, non-decreasing for the life of the process.
    pub timestamp_ms: i64,
    /// Seconds since the process started.
    pub uptime_seconds: f64,
    /// Operating system process id.
    pub pid: u32,
    /// Memory counters.
    pub memory: MemoryStats,
}

/// Source of process vitals.
pub trait VitalsSource: Send + Sync + std::fmt::Debug {
    /// Take a fresh snapshot.
    fn snapshot(&self) -> ProcessSnapshot;
}

/// Live vitals for the current process.
pub struct SystemVitals {
    started: Instant,
    started_epoch_ms: i64,
    /// Seconds the process had already been running when `started` was taken.
    uptime_offset_secs: f64,
    pid: Pid,
    system: Mutex<System>,
}

impl SystemVitals {
    /// Measure uptime from the start of this process.
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        system.refresh_process(pid);
        let process_start = system.process(pid).map(|p| p.start_time());

        Self::with_process_start(pid, process_start, system)
    }

    /// `process_start` is in epoch seconds; `None` counts uptime from now.
    fn with_process_start(pid: Pid, process_start: Option<u64>, system: System) -> Self {
        let now = OffsetDateTime::now_utc();
        let started_epoch_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        let now_secs = now.unix_timestamp_nanos() as f64 / 1e9;

        let uptime_offset_secs = process_start
            .map(|start| (now_secs - start as f64).max(0.0))
            .unwrap_or(0.0);

        Self {
            started: Instant::now(),
            started_epoch_ms,
            uptime_offset_secs,
            pid,
            system: Mutex::new(system),
        }
    }

    fn read_memory(&self) -> MemoryStats {
        // A poisoned lock only means another snapshot panicked mid-refresh.
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        system.refresh_memory();
        system.refresh_process(self.pid);

        let (rss, virtual_memory) = system
            .process(self.pid)
            .map(|p| (p.memory(), p.virtual_memory()))
            .unwrap_or_default();

        MemoryStats {
            rss,
            virtual_memory,
            system_total: system.total_memory(),
            system_used: system.used_memory(),
        }
    }
}

impl Default for SystemVitals {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemVitals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemVitals")
            .field("pid", &self.pid.as_u32())
            .field("started_epoch_ms", &self.started_epoch_ms)
            .field("uptime_offset_secs", &self.uptime_offset_secs)
            .finish_non_exhaustive()
    }
}

impl VitalsSource for SystemVitals {
    fn snapshot(&self) -> ProcessSnapshot {
        let elapsed = self.started.elapsed();

        ProcessSnapshot {
            timestamp_ms: self.started_epoch_ms + elapsed.as_millis() as i64,
            uptime_seconds: self.uptime_offset_secs + elapsed.as_secs_f64(),
            pid: self.pid.as_u32(),
            memory: self.read_memory(),
        }
    }
}

/// Fixed vitals, for tests and demos.
#[derive(Debug, Clone)]
pub struct StaticVitals(pub ProcessSnapshot);

impl StaticVitals {
    /// A plausible snapshot with the given pid.
    pub fn with_pid(pid: u32) -> Self {
        Self(ProcessSnapshot {
            timestamp_ms: 1_700_000_000_000,
            uptime_seconds: 3600.0,
            pid,
            memory: MemoryStats {
                rss: 52_428_800,
                virtual_memory: 104_857_600,
                system_total: 8_589_934_592,
                system_used: 4_294_967_296,
            },
        })
    }
}

impl VitalsSource for StaticVitals {
    fn snapshot(&self) -> ProcessSnapshot {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_vitals_report_this_process() {
        let vitals = SystemVitals::new();
        let snapshot = vitals.snapshot();

        assert_eq!(snapshot.pid, std::process::id());
        assert!(snapshot.uptime_seconds >= 0.0);
        assert!(snapshot.memory.system_total > 0);
    }

    #[test]
    fn uptime_counts_from_process_start() {
        let pid = Pid::from_u32(std::process::id());
        let started_secs = OffsetDateTime::now_utc().unix_timestamp() as u64 - 120;
        let vitals = SystemVitals::with_process_start(pid, Some(started_secs), System::new());

        let uptime = vitals.snapshot().uptime_seconds;
        assert!(uptime >= 119.0, "uptime {uptime} ignores time before construction");
        assert!(uptime < 180.0, "uptime {uptime}");
    }

    #[test]
    fn uptime_includes_time_before_construction() {
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let vitals = SystemVitals::new();
        assert!(vitals.uptime_offset_secs > 0.0);
        assert!(vitals.snapshot().uptime_seconds >= vitals.uptime_offset_secs);
    }

    #[test]
    fn unknown_process_start_counts_from_now() {
        let pid = Pid::from_u32(std::process::id());
        let vitals = SystemVitals::with_process_start(pid, None, System::new());
        assert!(vitals.snapshot().uptime_seconds < 5.0);
    }

    #[test]
    fn system_vitals_timestamps_never_go_backwards() {
        let vitals = SystemVitals::new();
        let mut last = vitals.snapshot().timestamp_ms;

        for _ in 0..50 {
            let next = vitals.snapshot().timestamp_ms;
            assert!(next >= last, "{next} < {last}");
            last = next;
        }
    }

    #[test]
    fn static_vitals_are_stable() {
        let vitals = StaticVitals::with_pid(12345);
        assert_eq!(vitals.snapshot(), vitals.snapshot());
        assert_eq!(vitals.snapshot().pid, 12345);
    }
}
