//! # Progress — Sampled Search Telemetry
//!
//! The coordinator takes one [`ProgressSample`] per tick (attempt count,
//! elapsed time, throughput, CPU load, ETA) and pushes it into a
//! [`ProgressSink`]. Samples are coordinator-local snapshots for display
//! only — slightly stale counter reads are fine, and nothing here feeds back
//! into search correctness.
//!
//! The `sysinfo::System` instance inside [`CpuMonitor`] is reused across
//! calls to amortize initialization cost; CPU usage is measured as the delta
//! since the previous refresh, which matches the fixed sampling cadence.

use sysinfo::System;

/// One coordinator-local snapshot of search progress.
#[derive(Clone, Debug)]
pub struct ProgressSample {
    pub digits: u64,
    pub attempts: u64,
    pub elapsed_secs: f64,
    /// Instantaneous throughput in attempts/second.
    pub speed: f64,
    pub cpu_percent: f32,
    /// Advisory remaining time; `None` until a throughput sample exists.
    pub eta_secs: Option<f64>,
}

/// Receiver for per-tick progress samples. The sink renders (or ignores)
/// them; nothing flows back into the engine.
pub trait ProgressSink {
    fn on_sample(&mut self, sample: &ProgressSample);
}

/// Sink that discards every sample. Used by tests and quiet runs.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_sample(&mut self, _sample: &ProgressSample) {}
}

/// Global CPU usage reader, refreshed once per sampling tick.
pub struct CpuMonitor {
    sys: System,
}

impl CpuMonitor {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        CpuMonitor { sys }
    }

    /// Average CPU usage across all cores since the previous call, 0–100.
    pub fn usage(&mut self) -> f32 {
        self.sys.refresh_cpu_all();
        self.sys.global_cpu_usage()
    }
}

impl Default for CpuMonitor {
    fn default() -> Self {
        Self::new()
    }
}
