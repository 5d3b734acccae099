//! # Display — Live Progress Line and Results Table
//!
//! Terminal rendering for the search: a single spinner-prefixed progress
//! line refreshed on each sample tick, and a final Current/Best/Variation
//! table comparing the run against the best historical metrics. All styling
//! state lives inside [`LiveProgress`]; there is no process-global console
//! configuration.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::format_time;
use crate::progress::{ProgressSample, ProgressSink};
use crate::records::BestMetrics;
use crate::search::SearchReport;

/// Live single-line progress display, updated once per coordinator sample.
pub struct LiveProgress {
    bar: ProgressBar,
}

impl LiveProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let bar_style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(bar_style);
        LiveProgress { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for LiveProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for LiveProgress {
    fn on_sample(&mut self, sample: &ProgressSample) {
        self.bar.set_message(progress_line(sample));
        self.bar.tick();
    }
}

/// Formats one sample as the live status line.
pub fn progress_line(sample: &ProgressSample) -> String {
    let eta = match sample.eta_secs {
        Some(eta) => format_time(eta),
        None => "--:--.-".to_string(),
    };
    format!(
        "Digit Count: {} | Attempts: {} | Time: {} | Numbers/Sec: {:.2} | CPU Usage: {:.2}% | ETA: {}",
        sample.digits,
        sample.attempts,
        format_time(sample.elapsed_secs),
        sample.speed,
        sample.cpu_percent,
        eta
    )
}

/// Percentage variation of `current` against the best historical value.
/// Positive means improvement for both orientations; returns 0 when no
/// meaningful best exists.
pub fn compute_variation(current: f64, best: f64, lower_is_better: bool) -> f64 {
    if best == 0.0 {
        return 0.0;
    }
    if lower_is_better {
        (best - current) / best * 100.0
    } else {
        (current - best) / best * 100.0
    }
}

fn format_variation(value: f64) -> String {
    let text = format!("{:.2}", value);
    if value > 0.0 {
        style(text).green().to_string()
    } else if value < 0.0 {
        style(text).red().to_string()
    } else {
        text
    }
}

fn row(label: &str, current: String, best: String, variation: f64) {
    println!(
        "{:<15} {:<20} {:<20} {:<15}",
        label,
        current,
        best,
        format_variation(variation)
    );
}

/// Prints the final results table and the performance-ratio summary.
/// `previous_ratio_ms` falls back to the current run when no history exists.
pub fn render_results(
    report: &SearchReport,
    best: Option<&BestMetrics>,
    prime_scientific: &str,
    current_ratio_ms: Option<f64>,
    previous_ratio_ms: Option<f64>,
) {
    let elapsed = report.elapsed.as_secs_f64();

    println!("\nResults:");
    let header = format!(
        "{:<15} {:<20} {:<20} {:<15}",
        "Label", "Current", "Best", "Variation (%)"
    );
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));

    row(
        "Attempts",
        report.attempts.to_string(),
        best.map_or(report.attempts.to_string(), |b| b.attempts.to_string()),
        best.map_or(0.0, |b| {
            compute_variation(report.attempts as f64, b.attempts as f64, true)
        }),
    );
    row(
        "Time",
        format_time(elapsed),
        best.map_or(format_time(elapsed), |b| format_time(b.elapsed)),
        best.map_or(0.0, |b| compute_variation(elapsed, b.elapsed, true)),
    );
    row(
        "Numbers/Sec",
        format!("{:.2}", report.speed),
        best.map_or(format!("{:.2}", report.speed), |b| format!("{:.2}", b.speed)),
        best.map_or(0.0, |b| compute_variation(report.speed, b.speed, false)),
    );
    row(
        "CPU Usage",
        format!("{:.2}%", report.cpu_percent),
        best.map_or(format!("{:.2}%", report.cpu_percent), |b| {
            format!("{:.2}%", b.cpu)
        }),
        best.map_or(0.0, |b| {
            compute_variation(report.cpu_percent as f64, b.cpu as f64, true)
        }),
    );
    println!(
        "{:<15} {:<20}",
        "Prime Found",
        style(prime_scientific).bold()
    );

    if let Some(current) = current_ratio_ms {
        println!("\nPerformance Ratio: {:.3} ms/attempt", current);
        println!(
            "Previous best ratio: {:.3} ms/attempt",
            previous_ratio_ms.unwrap_or(current)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variation_improvement_for_lower_is_better() {
        // Current 80 vs best 100: 20% improvement
        assert!((compute_variation(80.0, 100.0, true) - 20.0).abs() < 1e-9);
        // Current 120 vs best 100: 20% worse
        assert!((compute_variation(120.0, 100.0, true) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn variation_improvement_for_higher_is_better() {
        assert!((compute_variation(120.0, 100.0, false) - 20.0).abs() < 1e-9);
        assert!((compute_variation(80.0, 100.0, false) + 20.0).abs() < 1e-9);
    }

    #[test]
    fn variation_zero_best_yields_zero() {
        assert_eq!(compute_variation(50.0, 0.0, true), 0.0);
        assert_eq!(compute_variation(50.0, 0.0, false), 0.0);
    }

    #[test]
    fn progress_line_contains_every_field() {
        let line = progress_line(&ProgressSample {
            digits: 120,
            attempts: 4321,
            elapsed_secs: 65.5,
            speed: 66.0,
            cpu_percent: 87.5,
            eta_secs: Some(12.5),
        });
        assert!(line.contains("Digit Count: 120"));
        assert!(line.contains("Attempts: 4321"));
        assert!(line.contains("Time: 01:05.5"));
        assert!(line.contains("Numbers/Sec: 66.00"));
        assert!(line.contains("CPU Usage: 87.50%"));
        assert!(line.contains("ETA: 00:12.5"));
    }

    #[test]
    fn progress_line_without_eta_shows_placeholder() {
        let line = progress_line(&ProgressSample {
            digits: 2,
            attempts: 0,
            elapsed_secs: 0.0,
            speed: 0.0,
            cpu_percent: 0.0,
            eta_secs: None,
        });
        assert!(line.ends_with("ETA: --:--.-"));
    }
}
