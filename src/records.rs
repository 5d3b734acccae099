//! # Records — JSON Performance Log
//!
//! Persists one [`SearchRecord`] per completed run to a JSON array file
//! (default `prime_log.json`) and answers history queries filtered by digit
//! count: best-known metrics and the best performance ratio.
//!
//! ## Atomic Writes
//!
//! The log is rewritten atomically: serialize to a temp file, then rename.
//! This prevents corruption from mid-write crashes.
//!
//! ## Degraded Reads
//!
//! A missing or unparseable log file degrades to empty history — a corrupt
//! log must never abort a search run.

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::format_scientific;
use crate::search::SearchReport;
use crate::system::SystemInfo;

/// One completed run, as persisted to the log file.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub timestamp: String,
    pub digits: u64,
    pub attempts: u64,
    /// Wall-clock seconds for the whole run.
    pub elapsed: f64,
    /// Attempts per second.
    pub speed: f64,
    /// CPU usage percent at the end of the run.
    pub cpu: f32,
    pub prime: String,
    pub prime_scientific: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
}

impl SearchRecord {
    pub fn from_report(report: &SearchReport, system_info: Option<SystemInfo>) -> Self {
        SearchRecord {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            digits: report.digits,
            attempts: report.attempts,
            elapsed: report.elapsed.as_secs_f64(),
            speed: report.speed,
            cpu: report.cpu_percent,
            prime: report.prime.to_string_radix(10),
            prime_scientific: format_scientific(&report.prime, 3),
            system_info,
        }
    }

    /// Performance ratio in milliseconds per attempt, the cross-run
    /// benchmark metric. `None` for a zero-attempt record.
    pub fn ratio_ms(&self) -> Option<f64> {
        if self.attempts == 0 {
            return None;
        }
        Some(self.elapsed / self.attempts as f64 * 1000.0)
    }
}

/// Best-known historical values for one digit count. Each field is the best
/// across all matching records, not one single record's row.
pub struct BestMetrics {
    pub attempts: u64,
    pub elapsed: f64,
    pub speed: f64,
    pub cpu: f32,
    /// Scientific notation of the prime from the fastest run.
    pub prime_scientific: String,
}

/// Loads the full history, degrading to empty on a missing or corrupt file.
pub fn load(path: &Path) -> Vec<SearchRecord> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&data) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "record log unreadable, starting fresh history");
            Vec::new()
        }
    }
}

/// Appends one record, rewriting the log atomically (temp file + rename).
pub fn append(path: &Path, record: &SearchRecord) -> Result<()> {
    let mut records = load(path);
    records.push(record.clone());
    let json = serde_json::to_string_pretty(&records)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .with_context(|| format!("writing record log temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replacing record log {}", path.display()))?;
    Ok(())
}

/// Best-known metrics among records with the given digit count, or `None`
/// when no history exists for it.
pub fn best_for_digits(records: &[SearchRecord], digits: u64) -> Option<BestMetrics> {
    let matching: Vec<&SearchRecord> = records.iter().filter(|r| r.digits == digits).collect();
    let fastest = matching.iter().min_by(|a, b| {
        a.elapsed
            .partial_cmp(&b.elapsed)
            .unwrap_or(std::cmp::Ordering::Equal)
    })?;
    Some(BestMetrics {
        attempts: matching.iter().map(|r| r.attempts).min()?,
        elapsed: matching.iter().map(|r| r.elapsed).fold(f64::INFINITY, f64::min),
        speed: matching.iter().map(|r| r.speed).fold(0.0, f64::max),
        cpu: matching.iter().map(|r| r.cpu).fold(f32::INFINITY, f32::min),
        prime_scientific: fastest.prime_scientific.clone(),
    })
}

/// Best (minimum) performance ratio in ms/attempt among records with the
/// given digit count. Uses the direct elapsed/attempts ratio per record
/// rather than `1/max(speed)`; the two disagree when attempts and elapsed
/// do not scale together across runs.
pub fn best_ratio_ms(records: &[SearchRecord], digits: u64) -> Option<f64> {
    records
        .iter()
        .filter(|r| r.digits == digits)
        .filter_map(|r| r.ratio_ms())
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}
