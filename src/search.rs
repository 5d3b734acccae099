//! # Search — Concurrent Randomized Prime Search Engine
//!
//! A fixed pool of worker threads races to find a probable prime with a given
//! decimal digit count. Each worker independently draws uniform random
//! candidates from `[10^(d-1), 10^d)`, pre-filters them with the mod-30
//! wheel, and hands survivors to the primality oracle. The first worker whose
//! candidate passes claims the shared result slot and trips the termination
//! signal; everyone else observes the signal within one loop iteration and
//! exits.
//!
//! ## Shared State
//!
//! Workers communicate only through three primitives:
//!
//! | Primitive | Synchronization | Purpose |
//! |-----------|-----------------|---------|
//! | [`AttemptCounter`] | `AtomicU64` fetch-add | total candidates generated |
//! | [`TerminationSignal`] | `AtomicBool` | one-shot stop flag |
//! | [`ResultSlot`] | atomic claim + `Mutex` | write-once winning prime |
//!
//! Counter updates are batched worker-locally (`max(1, d/10)` per flush) so
//! large digit counts amortize the shared fetch-add over more attempts.
//! Filtered-out candidates still count as attempts: the tally is bumped
//! before the wheel runs.
//!
//! ## Coordinator
//!
//! [`Coordinator::run`] spawns the pool, samples the counter on a fixed
//! cadence to feed throughput/ETA to a [`ProgressSink`], and joins every
//! worker once the signal fires — including on user cancellation, which is
//! just another way of tripping the signal. An empty result slot after a
//! non-cancelled join is a protocol violation and reported as
//! [`SearchError::SearchFailed`], never as a silent missing value.

use rug::integer::IsPrime;
use rug::ops::Pow;
use rug::rand::RandState;
use rug::Integer;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::progress::{CpuMonitor, ProgressSample, ProgressSink};
use crate::{eta, wheel_admits};

/// Default interval between coordinator progress samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("digit count must be at least 1 (got {0})")]
    InvalidDigitCount(u64),
    #[error("no worker threads could be started")]
    NoWorkers,
    #[error(
        "all workers exited without reporting a prime \
         ({digits} digits, {attempts} attempts, {elapsed_secs:.2}s elapsed)"
    )]
    SearchFailed {
        digits: u64,
        attempts: u64,
        elapsed_secs: f64,
    },
}

/// Raised by the oracle on a non-positive candidate. The generator's range
/// construction guarantees this never happens in a real search; hitting it
/// means a programming error, so the affected worker logs and exits.
#[derive(Debug, Error)]
#[error("primality oracle received non-positive candidate {0}")]
pub struct MalformedCandidate(pub Integer);

/// Probable-prime test with bounded one-sided error.
///
/// Implementations must be safe to call from multiple worker threads at once.
/// A `true` result means "probably prime" at the implementation's confidence
/// level, never a certified prime.
pub trait PrimalityOracle: Send + Sync {
    fn test(&self, candidate: &Integer) -> Result<bool, MalformedCandidate>;
}

/// GMP Miller-Rabin oracle with a fast two-round pre-screen.
pub struct MillerRabin {
    rounds: u32,
}

impl MillerRabin {
    pub fn new(rounds: u32) -> Self {
        MillerRabin { rounds }
    }
}

impl PrimalityOracle for MillerRabin {
    fn test(&self, candidate: &Integer) -> Result<bool, MalformedCandidate> {
        if candidate.cmp0() != std::cmp::Ordering::Greater {
            return Err(MalformedCandidate(candidate.clone()));
        }
        Ok(crate::mr_screened_test(candidate, self.rounds) != IsPrime::No)
    }
}

/// Half-open candidate interval `[lower, upper)` for a given digit count.
/// Immutable once computed; shared read-only by every worker.
#[derive(Clone, Debug)]
pub struct SearchRange {
    pub lower: Integer,
    pub upper: Integer,
}

impl SearchRange {
    pub fn for_digits(digits: u64) -> Result<Self, SearchError> {
        if digits < 1 {
            return Err(SearchError::InvalidDigitCount(digits));
        }
        let lower = if digits == 1 {
            Integer::from(1u32)
        } else {
            Integer::from(10u32).pow(digits as u32 - 1)
        };
        let upper = Integer::from(10u32).pow(digits as u32);
        Ok(SearchRange { lower, upper })
    }

    pub fn contains(&self, n: &Integer) -> bool {
        n >= &self.lower && n < &self.upper
    }

    pub fn width(&self) -> Integer {
        Integer::from(&self.upper - &self.lower)
    }
}

/// Shared count of candidates generated across all workers. Exposes only
/// `add` and `read`; batching is the workers' policy, not the counter's.
#[derive(Default)]
pub struct AttemptCounter(AtomicU64);

impl AttemptCounter {
    pub fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// One-shot stop flag. Never reverts to false within a run.
#[derive(Default)]
pub struct TerminationSignal(AtomicBool);

impl TerminationSignal {
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The winning candidate and the shared counter value at the moment of
/// discovery.
pub struct Discovery {
    pub prime: Integer,
    pub attempts_at_discovery: u64,
}

/// Write-once slot for the winning prime. `try_claim` is the arbitration
/// point: exactly one worker wins the swap and may store; losers exit
/// without touching the value.
#[derive(Default)]
pub struct ResultSlot {
    claimed: AtomicBool,
    value: Mutex<Option<Discovery>>,
}

impl ResultSlot {
    pub fn try_claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    fn store(&self, discovery: Discovery) {
        *self.value.lock().unwrap() = Some(discovery);
    }

    fn take(&self) -> Option<Discovery> {
        self.value.lock().unwrap().take()
    }
}

#[derive(Default)]
struct Shared {
    counter: AttemptCounter,
    signal: TerminationSignal,
    slot: ResultSlot,
}

/// Per-attempt batch size for counter flushes: larger digit counts amortize
/// the shared fetch-add over more attempts, trading read freshness for lower
/// contention.
pub fn batch_size(digits: u64) -> u64 {
    (digits / 10).max(1)
}

fn seed_for(worker: usize) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut h = DefaultHasher::new();
    std::time::SystemTime::now().hash(&mut h);
    std::process::id().hash(&mut h);
    worker.hash(&mut h);
    h.finish()
}

struct Worker {
    id: usize,
    range: Arc<SearchRange>,
    shared: Arc<Shared>,
    oracle: Arc<dyn PrimalityOracle>,
    batch: u64,
}

impl Worker {
    /// generate → count → filter → test loop, until the signal fires.
    fn run(self) {
        let mut rng = RandState::new();
        rng.seed(&Integer::from(seed_for(self.id)));
        let width = self.range.width();
        let mut tally: u64 = 0;

        while !self.shared.signal.is_set() {
            let mut candidate = Integer::from(width.random_below_ref(&mut rng));
            candidate += &self.range.lower;

            // Count before filtering: rejected candidates are attempts too
            tally += 1;
            if tally >= self.batch {
                self.shared.counter.add(tally);
                tally = 0;
            }

            if !wheel_admits(&candidate) {
                continue;
            }

            match self.oracle.test(&candidate) {
                Ok(false) => continue,
                Ok(true) => {
                    self.shared.counter.add(tally);
                    tally = 0;
                    if self.shared.slot.try_claim() {
                        let attempts = self.shared.counter.read();
                        self.shared.slot.store(Discovery {
                            prime: candidate,
                            attempts_at_discovery: attempts,
                        });
                        self.shared.signal.set();
                    }
                    // A lost race means another worker already reported;
                    // either way this worker is done.
                    break;
                }
                Err(e) => {
                    error!(worker = self.id, error = %e, "oracle contract violation, worker exiting");
                    break;
                }
            }
        }

        // Flush the pending tally so the final counter equals the total
        // number of candidates generated across all workers.
        if tally > 0 {
            self.shared.counter.add(tally);
        }
    }
}

/// Final statistics for a completed search.
pub struct SearchReport {
    pub digits: u64,
    pub prime: Integer,
    pub attempts: u64,
    pub attempts_at_discovery: u64,
    pub elapsed: Duration,
    pub speed: f64,
    pub cpu_percent: f32,
    pub workers: usize,
}

pub enum SearchOutcome {
    Found(SearchReport),
    /// User-requested early termination: a clean exit with partial
    /// statistics, not an error.
    Cancelled { attempts: u64, elapsed: Duration },
}

/// Owns the worker pool lifecycle: spawn, sample, supervise, join.
pub struct Coordinator {
    digits: u64,
    workers: usize,
    range: Arc<SearchRange>,
    oracle: Arc<dyn PrimalityOracle>,
    cancel: Arc<AtomicBool>,
    sample_interval: Duration,
}

impl Coordinator {
    /// Validates the digit count and worker count up front; nothing is
    /// spawned until [`run`](Self::run).
    pub fn new(
        digits: u64,
        workers: usize,
        oracle: Arc<dyn PrimalityOracle>,
    ) -> Result<Self, SearchError> {
        let range = SearchRange::for_digits(digits)?;
        if workers == 0 {
            return Err(SearchError::NoWorkers);
        }
        Ok(Coordinator {
            digits,
            workers,
            range: Arc::new(range),
            oracle,
            cancel: Arc::new(AtomicBool::new(false)),
            sample_interval: SAMPLE_INTERVAL,
        })
    }

    /// Installs an external cancellation flag (e.g. wired to Ctrl-C). When it
    /// goes true the coordinator trips the termination signal itself and
    /// still joins every worker.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Runs the search to completion or cancellation, feeding one
    /// [`ProgressSample`] per tick into `sink`.
    pub fn run(&self, sink: &mut dyn ProgressSink) -> Result<SearchOutcome, SearchError> {
        let shared = Arc::new(Shared::default());
        let batch = batch_size(self.digits);
        let start = Instant::now();

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            let worker = Worker {
                id,
                range: Arc::clone(&self.range),
                shared: Arc::clone(&shared),
                oracle: Arc::clone(&self.oracle),
                batch,
            };
            let spawned = thread::Builder::new()
                .name(format!("search-{}", id))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                // Degraded but not fatal: the pool proceeds with fewer workers
                Err(e) => warn!(worker = id, error = %e, "failed to spawn worker thread"),
            }
        }
        if handles.is_empty() {
            return Err(SearchError::NoWorkers);
        }
        info!(
            digits = self.digits,
            workers = handles.len(),
            batch,
            "search started"
        );

        let mut cpu = CpuMonitor::new();
        let mut cancelled = false;
        while !shared.signal.is_set() {
            if self.cancel.load(Ordering::Relaxed) {
                shared.signal.set();
                cancelled = true;
                break;
            }
            thread::sleep(self.sample_interval);
            let elapsed = start.elapsed().as_secs_f64();
            let attempts = shared.counter.read();
            let speed = if elapsed > 0.0 {
                attempts as f64 / elapsed
            } else {
                0.0
            };
            sink.on_sample(&ProgressSample {
                digits: self.digits,
                attempts,
                elapsed_secs: elapsed,
                speed,
                cpu_percent: cpu.usage(),
                eta_secs: eta::estimate(self.digits, attempts, speed),
            });
        }

        // Every worker must be joined, even on cancellation: each observes
        // the signal within one loop iteration of its current test finishing.
        for handle in handles {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }

        let elapsed = start.elapsed();
        let attempts = shared.counter.read();

        if let Some(found) = shared.slot.take() {
            let elapsed_secs = elapsed.as_secs_f64();
            let speed = if elapsed_secs > 0.0 {
                attempts as f64 / elapsed_secs
            } else {
                0.0
            };
            info!(
                digits = self.digits,
                attempts,
                elapsed_secs = format_args!("{:.2}", elapsed_secs),
                "probable prime found"
            );
            return Ok(SearchOutcome::Found(SearchReport {
                digits: self.digits,
                prime: found.prime,
                attempts,
                attempts_at_discovery: found.attempts_at_discovery,
                elapsed,
                speed,
                cpu_percent: cpu.usage(),
                workers: self.workers,
            }));
        }
        if cancelled {
            info!(digits = self.digits, attempts, "search cancelled by user");
            return Ok(SearchOutcome::Cancelled { attempts, elapsed });
        }
        Err(SearchError::SearchFailed {
            digits: self.digits,
            attempts,
            elapsed_secs: elapsed.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;

    /// Oracle that marks only an explicit list of values as prime.
    struct StubOracle {
        primes: Vec<u64>,
    }

    impl PrimalityOracle for StubOracle {
        fn test(&self, candidate: &Integer) -> Result<bool, MalformedCandidate> {
            if candidate.cmp0() != std::cmp::Ordering::Greater {
                return Err(MalformedCandidate(candidate.clone()));
            }
            Ok(self.primes.iter().any(|&p| *candidate == p))
        }
    }

    fn fast(coordinator: Coordinator) -> Coordinator {
        coordinator.with_sample_interval(Duration::from_millis(20))
    }

    // ── Range Construction ─────────────────────────────────────────

    #[test]
    fn range_for_one_digit_starts_at_one() {
        let range = SearchRange::for_digits(1).unwrap();
        assert_eq!(range.lower, 1);
        assert_eq!(range.upper, 10);
    }

    #[test]
    fn range_for_five_digits() {
        let range = SearchRange::for_digits(5).unwrap();
        assert_eq!(range.lower, 10_000);
        assert_eq!(range.upper, 100_000);
    }

    #[test]
    fn range_contains_is_half_open() {
        let range = SearchRange::for_digits(3).unwrap();
        assert!(range.contains(&Integer::from(100u32)));
        assert!(range.contains(&Integer::from(999u32)));
        assert!(!range.contains(&Integer::from(1000u32)));
        assert!(!range.contains(&Integer::from(99u32)));
    }

    #[test]
    fn zero_digit_count_is_rejected() {
        assert!(matches!(
            SearchRange::for_digits(0),
            Err(SearchError::InvalidDigitCount(0))
        ));
    }

    // ── Batching Policy ────────────────────────────────────────────

    #[test]
    fn batch_size_is_tenth_of_digits_with_floor_one() {
        assert_eq!(batch_size(1), 1);
        assert_eq!(batch_size(9), 1);
        assert_eq!(batch_size(10), 1);
        assert_eq!(batch_size(50), 5);
        assert_eq!(batch_size(100), 10);
        assert_eq!(batch_size(1234), 123);
    }

    // ── Shared Primitives ──────────────────────────────────────────

    #[test]
    fn counter_accumulates_batched_adds() {
        let counter = AttemptCounter::default();
        counter.add(5);
        counter.add(7);
        assert_eq!(counter.read(), 12);
    }

    #[test]
    fn counter_is_exact_under_concurrent_flushes() {
        let counter = Arc::new(AttemptCounter::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.add(3);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.read(), 8 * 1000 * 3);
    }

    #[test]
    fn signal_latches_true() {
        let signal = TerminationSignal::default();
        assert!(!signal.is_set());
        signal.set();
        assert!(signal.is_set());
        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn slot_claim_succeeds_exactly_once() {
        let slot = ResultSlot::default();
        assert!(slot.try_claim());
        assert!(!slot.try_claim());
        assert!(!slot.try_claim());
    }

    #[test]
    fn slot_claims_race_to_one_winner() {
        let slot = Arc::new(ResultSlot::default());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let slot = Arc::clone(&slot);
                thread::spawn(move || slot.try_claim())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1, "exactly one claim must win the race");
    }

    // ── Oracle Contract ────────────────────────────────────────────

    #[test]
    fn miller_rabin_rejects_non_positive_input() {
        let oracle = MillerRabin::new(15);
        assert!(oracle.test(&Integer::from(0u32)).is_err());
        assert!(oracle.test(&Integer::from(-7i32)).is_err());
        assert!(oracle.test(&Integer::from(7u32)).unwrap());
        assert!(!oracle.test(&Integer::from(9u32)).unwrap());
    }

    // ── End-to-End Scenarios ───────────────────────────────────────

    #[test]
    fn one_digit_search_with_stub_oracle() {
        let oracle = Arc::new(StubOracle {
            primes: vec![2, 3, 5, 7],
        });
        let coordinator = fast(Coordinator::new(1, 1, oracle).unwrap());
        match coordinator.run(&mut NullSink).unwrap() {
            SearchOutcome::Found(report) => {
                assert!(
                    [2u64, 3, 5, 7].iter().any(|&p| report.prime == p),
                    "unexpected prime {}",
                    report.prime
                );
                assert!(report.attempts >= 1);
                assert!(report.attempts_at_discovery >= 1);
            }
            SearchOutcome::Cancelled { .. } => panic!("search should not cancel"),
        }
    }

    #[test]
    fn five_digit_search_finds_the_only_stub_prime() {
        // 17389 is the only value the stub accepts; every worker count must
        // converge on it.
        for workers in [1usize, 4, 16] {
            let oracle = Arc::new(StubOracle {
                primes: vec![17_389],
            });
            let coordinator = fast(Coordinator::new(5, workers, oracle).unwrap());
            match coordinator.run(&mut NullSink).unwrap() {
                SearchOutcome::Found(report) => {
                    assert_eq!(report.prime, 17_389, "workers={}", workers);
                    assert!(report.attempts >= report.attempts_at_discovery);
                }
                SearchOutcome::Cancelled { .. } => panic!("search should not cancel"),
            }
        }
    }

    #[test]
    fn cancellation_before_discovery_returns_partial_stats() {
        // No value is ever prime, so only cancellation can end this run.
        let oracle = Arc::new(StubOracle { primes: vec![] });
        let cancel = Arc::new(AtomicBool::new(false));
        let coordinator = fast(
            Coordinator::new(6, 2, oracle)
                .unwrap()
                .with_cancel(Arc::clone(&cancel)),
        );
        let flag = Arc::clone(&cancel);
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            flag.store(true, Ordering::SeqCst);
        });
        match coordinator.run(&mut NullSink).unwrap() {
            SearchOutcome::Cancelled { attempts, .. } => {
                // attempts may legitimately be zero if cancelled early enough
                let _ = attempts;
            }
            SearchOutcome::Found(report) => {
                panic!("found {} from an oracle with no primes", report.prime)
            }
        }
        trigger.join().unwrap();
    }

    #[test]
    fn zero_workers_fails_at_start() {
        let oracle = Arc::new(StubOracle { primes: vec![7] });
        assert!(matches!(
            Coordinator::new(1, 0, oracle),
            Err(SearchError::NoWorkers)
        ));
    }

    #[test]
    fn invalid_digit_count_fails_before_spawning() {
        let oracle = Arc::new(MillerRabin::new(15));
        assert!(matches!(
            Coordinator::new(0, 4, oracle),
            Err(SearchError::InvalidDigitCount(0))
        ));
    }

    #[test]
    fn found_prime_reverifies_with_real_oracle() {
        let oracle = Arc::new(MillerRabin::new(15));
        let coordinator = fast(Coordinator::new(3, 2, Arc::clone(&oracle) as Arc<dyn PrimalityOracle>).unwrap());
        match coordinator.run(&mut NullSink).unwrap() {
            SearchOutcome::Found(report) => {
                let range = SearchRange::for_digits(3).unwrap();
                assert!(range.contains(&report.prime));
                assert!(wheel_admits(&report.prime));
                assert!(oracle.test(&report.prime).unwrap(), "stored value must re-verify");
            }
            SearchOutcome::Cancelled { .. } => panic!("search should not cancel"),
        }
    }
}
