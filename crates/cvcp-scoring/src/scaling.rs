//! Integer scaling primitives shared by every component scorer.
//!
//! Pure and stateless. Division truncates; nothing rounds. Every function is
//! total over `u64` inputs: intermediates are widened to `u128` where a
//! product could exceed `u64`.

/// Points awarded per halving step in [`log_scale`].
const LOG_STEP_POINTS: u64 = 8;

/// Days at which [`time_decay`] saturates.
const TIME_DECAY_SATURATION_DAYS: u64 = 365;

/// Half-saturation constant of [`time_decay`].
const TIME_DECAY_HALF_DAYS: u64 = 30;

/// Output ceiling of [`time_decay`] and [`bell_frequency`].
const CURVE_MAX: u64 = 100;

/// Coarse diminishing-returns curve.
///
/// Returns 0 for `value == 0`. Otherwise halves `value + base` until it
/// reaches 1 and returns the number of halvings times 8, i.e.
/// `floor(log2(value + base)) * 8`. This is not a true logarithm; stored
/// golden vectors depend on this exact loop.
///
/// # Examples
///
/// ```
/// use cvcp_scoring::scaling::log_scale;
///
/// assert_eq!(log_scale(0, 10), 0);
/// // 35 -> 17 -> 8 -> 4 -> 2 -> 1: five halvings.
/// assert_eq!(log_scale(25, 10), 40);
/// ```
pub fn log_scale(value: u64, base: u64) -> u64 {
    if value == 0 {
        return 0;
    }
    let mut x = value as u128 + base as u128;
    let mut steps = 0u64;
    while x > 1 {
        x /= 2;
        steps += 1;
    }
    steps * LOG_STEP_POINTS
}

/// Saturating growth over a duration in days.
///
/// `0` at 0 days, `100` from 365 days, `days * 100 / (days + 30)` between.
///
/// # Examples
///
/// ```
/// use cvcp_scoring::scaling::time_decay;
///
/// assert_eq!(time_decay(0), 0);
/// assert_eq!(time_decay(30), 50);
/// assert_eq!(time_decay(365), 100);
/// ```
pub fn time_decay(days: u64) -> u64 {
    if days == 0 {
        return 0;
    }
    if days >= TIME_DECAY_SATURATION_DAYS {
        return CURVE_MAX;
    }
    days * CURVE_MAX / (days + TIME_DECAY_HALF_DAYS)
}

/// `min(value, max_in) * max_out / max_in`.
///
/// Returns 0 when `max_in == 0`.
pub fn linear_scale(value: u64, max_in: u64, max_out: u64) -> u64 {
    if max_in == 0 {
        return 0;
    }
    let clamped = value.min(max_in) as u128;
    (clamped * max_out as u128 / max_in as u128) as u64
}

/// Map `value` from `[min_in, max_in]` onto `[0, max_out]`.
///
/// 0 at or below `min_in`, `max_out` at or above `max_in`, linear between.
pub fn normalize_to_range(value: u64, min_in: u64, max_in: u64, max_out: u64) -> u64 {
    if value <= min_in {
        return 0;
    }
    if value >= max_in {
        return max_out;
    }
    // min_in < value < max_in, so the span is non-zero.
    let offset = (value - min_in) as u128;
    let span = (max_in - min_in) as u128;
    (offset * max_out as u128 / span) as u64
}

/// Bell curve peaking at `optimal`.
///
/// 0 for `freq == 0` or when `freq` deviates from `optimal` by more than
/// `optimal`; otherwise `100 - deviation * 100 / optimal`.
///
/// # Examples
///
/// ```
/// use cvcp_scoring::scaling::bell_frequency;
///
/// assert_eq!(bell_frequency(20, 20), 100);
/// assert_eq!(bell_frequency(8, 20), 40);
/// assert_eq!(bell_frequency(41, 20), 0);
/// ```
pub fn bell_frequency(freq: u64, optimal: u64) -> u64 {
    if freq == 0 {
        return 0;
    }
    let deviation = freq.abs_diff(optimal);
    if deviation > optimal {
        return 0;
    }
    // deviation <= optimal and freq > 0 imply optimal > 0.
    CURVE_MAX - (deviation as u128 * CURVE_MAX as u128 / optimal as u128) as u64
}

/// `min(value, max)`.
pub fn cap_to_max(value: u64, max: u64) -> u64 {
    value.min(max)
}
