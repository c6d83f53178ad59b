//! Compact rendering of view and like counts.

/// `1500` → `"1.5K"`, `2_340_000` → `"2.3M"`, `999` → `"999"`.
///
/// Anything above 100000 is shown in millions, so 150000 renders as
/// `"0.1M"`. The quotient is taken in `f64` and its exact binary value is
/// rounded half-up to one decimal, which is how JavaScript's `toFixed(1)`
/// rounds: `1150` is `1.1499…` and gives `"1.1K"`, while `1250` is exactly
/// `1.25` and gives `"1.3K"`.
pub fn format_count(count: u64) -> String {
    if count > 100_000 {
        format!("{}M", tenths(count, 1_000_000))
    } else if count > 1_000 {
        format!("{}K", tenths(count, 1_000))
    } else {
        count.to_string()
    }
}

fn tenths(count: u64, unit: u64) -> String {
    let scaled = round_tenths(count as f64 / unit as f64);
    format!("{}.{}", scaled / 10, scaled % 10)
}

/// `value * 10` rounded half-up, computed on the exact binary value.
fn round_tenths(value: f64) -> u128 {
    let (mantissa, exponent) = decompose(value);
    let times_ten = u128::from(mantissa) * 10;
    if exponent >= 0 {
        return times_ten.checked_shl(exponent.unsigned_abs()).unwrap_or(u128::MAX);
    }
    let shift = exponent.unsigned_abs();
    if shift >= 128 {
        return 0;
    }
    let floor = times_ten >> shift;
    let remainder = times_ten - (floor << shift);
    if remainder >= 1 << (shift - 1) {
        floor + 1
    } else {
        floor
    }
}

/// Non-negative finite `value` as `mantissa * 2^exponent`.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1 << 52) - 1);
    if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    }
}
