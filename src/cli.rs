//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Runs one complete
//! search: history lookup, coordinator run with live display, record
//! persistence, results rendering, and the completion beep.

use anyhow::Result;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

use crate::display::{self, LiveProgress};
use crate::records::{self, SearchRecord};
use crate::search::{Coordinator, MillerRabin, SearchOutcome};
use crate::{format_time, notify, system};

#[derive(PartialEq)]
pub enum RunStatus {
    Completed,
    Interrupted,
}

pub struct RunConfig<'a> {
    pub digits: u64,
    pub workers: usize,
    pub mr_rounds: u32,
    pub log_file: &'a Path,
    pub no_beep: bool,
}

/// Executes one search run end to end. Returns `Interrupted` on user
/// cancellation, which callers treat as a clean exit.
pub fn run_search(config: &RunConfig, cancel: &Arc<AtomicBool>) -> Result<RunStatus> {
    let history = records::load(config.log_file);
    let best = records::best_for_digits(&history, config.digits);
    let previous_ratio = records::best_ratio_ms(&history, config.digits);

    println!("Algorithm: random candidate generation with mod-30 wheel filtering");
    println!("and GMP Miller-Rabin probable-prime testing.\n");

    let oracle = Arc::new(MillerRabin::new(config.mr_rounds));
    let coordinator = Coordinator::new(config.digits, config.workers, oracle)?
        .with_cancel(Arc::clone(cancel));

    let mut live = LiveProgress::new();
    let outcome = coordinator.run(&mut live);
    live.finish();

    match outcome? {
        SearchOutcome::Cancelled { attempts, elapsed } => {
            println!(
                "\nInterrupted by user after {} attempts in {}.",
                attempts,
                format_time(elapsed.as_secs_f64())
            );
            Ok(RunStatus::Interrupted)
        }
        SearchOutcome::Found(report) => {
            let record = SearchRecord::from_report(&report, Some(system::collect()));
            if let Err(e) = records::append(config.log_file, &record) {
                warn!(error = %e, "failed to update record log");
            }
            let current_ratio = record.ratio_ms();
            display::render_results(
                &report,
                best.as_ref(),
                &record.prime_scientific,
                current_ratio,
                previous_ratio,
            );
            if !config.no_beep {
                notify::beep();
            }
            Ok(RunStatus::Completed)
        }
    }
}
