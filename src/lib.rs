pub mod cli;
pub mod display;
pub mod eta;
pub mod notify;
pub mod progress;
pub mod records;
pub mod search;
pub mod system;

use rug::Integer;

/// Residues mod 30 coprime to 30. A uniformly random integer survives the
/// wheel with probability 8/30; the rest are divisible by 2, 3, or 5 and
/// are rejected before the expensive primality test.
pub const WHEEL_OFFSETS: [u32; 8] = [1, 7, 11, 13, 17, 19, 23, 29];

/// Mod-30 wheel pre-filter. Returns true if the candidate is worth handing
/// to the primality oracle. Rejection here is purely a fast path: survivors
/// still get the full test, and the wheel never rejects a prime above 5.
pub fn wheel_admits(n: &Integer) -> bool {
    WHEEL_OFFSETS.contains(&n.mod_u(30))
}

/// Two-round Miller-Rabin pre-screening: run 2 fast rounds first, full rounds
/// only for survivors. Composites are rejected ~7x faster since most fail
/// within 2 rounds.
pub fn mr_screened_test(candidate: &Integer, mr_rounds: u32) -> rug::integer::IsPrime {
    use rug::integer::IsPrime;
    if mr_rounds > 2 && candidate.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    candidate.is_probably_prime(mr_rounds)
}

/// Scientific notation for a big integer, built from its decimal string so no
/// precision is lost to float conversion. A 1000-digit number with
/// `precision = 3` renders as `1.23e+999`.
pub fn format_scientific(n: &Integer, precision: usize) -> String {
    let s = n.to_string_radix(10);
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    if digits.len() <= precision {
        return s;
    }
    let exponent = digits.len() - 1;
    if precision <= 1 {
        format!("{}{}e+{}", sign, &digits[..1], exponent)
    } else {
        format!("{}{}.{}e+{}", sign, &digits[..1], &digits[1..precision], exponent)
    }
}

/// Formats a duration in seconds as `mm:ss.d`.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    let deciseconds = ((seconds - seconds.floor()) * 10.0) as u64;
    format!("{:02}:{:02}.{}", minutes, secs, deciseconds)
}

/// Exact decimal digit count (expensive for very large numbers).
pub fn exact_digits(n: &Integer) -> u64 {
    n.to_string_radix(10).len() as u64
}
