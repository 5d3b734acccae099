//! # Main — CLI Entry Point
//!
//! Parses the command line, wires Ctrl-C to the shared cancellation flag,
//! and drives one or more search runs. Exit code is 0 on completion and on
//! user interrupt (a graceful stop), non-zero only on internal failure.
//!
//! ## Options
//!
//! - `digits` (positional): decimal digit count of the prime to find.
//! - `-r/--repeat [COUNT]`: repeat the search COUNT times (default 10).
//! - `--threads`: worker pool size (default: all logical cores).
//! - `--mr-rounds`: Miller-Rabin iterations (default 15).
//! - `--log-file`: JSON performance log path.
//! - `--no-beep`: skip the audible notification.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use primebench::cli::{run_search, RunConfig, RunStatus};
use primebench::system;

#[derive(Parser)]
#[command(
    name = "primebench",
    about = "Search for a prime number with a specified digit count"
)]
struct Cli {
    /// Decimal digit count of the prime to search for
    digits: u64,

    /// Repeat the search COUNT times (default 10 when given bare)
    #[arg(short, long, value_name = "COUNT", num_args = 0..=1, default_missing_value = "10")]
    repeat: Option<u32>,

    /// Number of worker threads (defaults to all logical cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Miller-Rabin rounds for primality testing (higher = more certain but slower)
    #[arg(long, default_value_t = 15)]
    mr_rounds: u32,

    /// Path to the JSON performance log
    #[arg(long, default_value = "prime_log.json")]
    log_file: PathBuf,

    /// Skip the audible notification on discovery
    #[arg(long)]
    no_beep: bool,
}

fn main() -> Result<()> {
    // Structured logging: LOG_FORMAT=json for machines, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    let config = RunConfig {
        digits: cli.digits,
        workers: cli.threads.unwrap_or_else(system::default_worker_count),
        mr_rounds: cli.mr_rounds,
        log_file: &cli.log_file,
        no_beep: cli.no_beep,
    };

    let runs = cli.repeat.unwrap_or(1);
    for i in 0..runs {
        if cancel.load(Ordering::SeqCst) {
            break;
        }
        if runs > 1 {
            println!("\n--- Run {} of {} ---\n", i + 1, runs);
        }
        if run_search(&config, &cancel)? == RunStatus::Interrupted {
            break;
        }
        if runs > 1 && i + 1 < runs {
            std::thread::sleep(Duration::from_secs(1));
        }
    }
    Ok(())
}
