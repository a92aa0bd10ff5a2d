//! # Count Coercion
//!
//! Turns whatever the operator typed (or the frontend sent) into a count.
//!
//! ## Rules
//! - Counts are non-negative integers.
//! - Decimals are truncated toward zero (`"4.9"` → 4).
//! - Anything non-numeric, empty, or out of range becomes 0.
//! - Negative input becomes 0.

/// Coerces free-text input into a non-negative count.
///
/// ## Example
/// ```rust
/// use stocktake_core::count::coerce_count;
///
/// assert_eq!(coerce_count("12"), 12);
/// assert_eq!(coerce_count(" 7 "), 7);
/// assert_eq!(coerce_count("-3"), 0);
/// assert_eq!(coerce_count("abc"), 0);
/// ```
pub fn coerce_count(input: &str) -> i64 {
    let input = input.trim();
    if input.is_empty() {
        return 0;
    }

    if let Ok(n) = input.parse::<i64>() {
        return n.max(0);
    }

    match input.parse::<f64>() {
        Ok(f) if f.is_finite() => clamp_float(f),
        _ => 0,
    }
}

/// Normalizes an already-numeric count.
#[inline]
pub fn clamp_count(n: i64) -> i64 {
    n.max(0)
}

fn clamp_float(f: f64) -> i64 {
    let t = f.trunc();
    if t <= 0.0 || t >= i64::MAX as f64 {
        0
    } else {
        t as i64
    }
}
