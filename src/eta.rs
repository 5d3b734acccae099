//! # ETA — Remaining-Time Estimation from Prime Density
//!
//! By the prime number theorem, the density of primes near a d-digit number
//! is roughly `1 / (ln(10) * (d - 1))`. Dividing by the wheel's 8/30
//! pass-through fraction gives the expected number of raw attempts before a
//! discovery, and the shortfall against the live attempt count divided by
//! current throughput gives a remaining-time estimate.
//!
//! Everything here is a pure function of `{digit_count, attempts,
//! throughput}` — the estimate is advisory display data derived from an
//! asymptotic approximation, never a correctness input.

/// Wheel filter pass-through fraction: 8 of the 30 residue classes survive.
pub const WHEEL_FRACTION: f64 = 8.0 / 30.0;

/// Asymptotic prime density near a d-digit number, with a degenerate 0.5
/// fallback for the single-digit case where the formula divides by zero.
pub fn prime_density(digits: u64) -> f64 {
    if digits > 1 {
        1.0 / (std::f64::consts::LN_10 * (digits - 1) as f64)
    } else {
        0.5
    }
}

/// Expected total attempts (raw generated candidates) before one prime.
pub fn expected_attempts(digits: u64) -> f64 {
    1.0 / (prime_density(digits) * WHEEL_FRACTION)
}

/// Advisory seconds-to-discovery at the current throughput. `None` until a
/// positive throughput sample exists.
pub fn estimate(digits: u64, attempts: u64, throughput: f64) -> Option<f64> {
    if throughput <= 0.0 || !throughput.is_finite() {
        return None;
    }
    let remaining = (expected_attempts(digits) - attempts as f64).max(0.0);
    Some(remaining / throughput)
}
