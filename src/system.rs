//! # System — Host Hardware Summary
//!
//! Descriptive metadata attached to each persisted search record: host name,
//! processor model, logical core count, and installed memory. Collection
//! never affects search behavior; failures degrade to `"unknown"` fields.

use serde::{Deserialize, Serialize};
use sysinfo::System;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SystemInfo {
    pub computer: String,
    pub processor: String,
    pub threads: usize,
    pub total_memory_gb: f64,
}

pub fn collect() -> SystemInfo {
    let sys = System::new_all();
    let total_gb = sys.total_memory() as f64 / 1_073_741_824.0;
    SystemInfo {
        computer: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        processor: cpu_model(),
        threads: sys.cpus().len(),
        total_memory_gb: (total_gb * 100.0).round() / 100.0,
    }
}

/// Worker pool default: one worker per logical execution unit.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn cpu_model() -> String {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
    #[cfg(not(target_os = "macos"))]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("model name"))
                    .map(|l| l.split(':').nth(1).unwrap_or("unknown").trim().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}
