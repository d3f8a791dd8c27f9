//! Size parsing and formatting helpers.
//!
//! Used for the `large_file_threshold` setting, which accepts human-readable
//! values like `"10MB"` or `"1.5MiB"`.

use anyhow::{Result, anyhow, bail};
use humansize::{DECIMAL, format_size};

/// Unit suffixes, longest first so `MIB` is tried before `MB` and `B`.
const UNITS: &[(&str, u64)] = &[
    ("GIB", 1 << 30),
    ("MIB", 1 << 20),
    ("KIB", 1 << 10),
    ("GB", 1_000_000_000),
    ("MB", 1_000_000),
    ("KB", 1_000),
    ("B", 1),
];

/// Parse a human-readable size string into bytes.
///
/// Supports decimal (KB, MB, GB) and binary (KiB, MiB, GiB) units, plain byte
/// counts, and fractional values such as `"1.5MB"`. Units are case-insensitive.
///
/// # Errors
///
/// Returns an error if the number is malformed, negative, has more than nine
/// fractional digits, or the result overflows `u64`.
pub fn parse_size(size_str: &str) -> Result<u64> {
    let upper = size_str.trim().to_uppercase();

    let (number, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|number| (number.trim(), *multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() {
        bail!("Missing number in size \"{size_str}\"");
    }

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        bail!("Invalid decimal format: {size_str}");
    }
    if fraction.len() > 9 {
        bail!("Too many decimal places: {size_str}");
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse()? };
    let whole_bytes = whole
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow!("Size value overflow: {size_str}"))?;

    if fraction.is_empty() {
        return Ok(whole_bytes);
    }

    // Scale the fraction to nanos so the multiplication stays integral.
    let nanos: u64 = format!("{fraction:0<9}").parse()?;
    let fraction_bytes = u128::from(nanos) * u128::from(multiplier) / 1_000_000_000;

    u64::try_from(fraction_bytes)
        .ok()
        .and_then(|bytes| whole_bytes.checked_add(bytes))
        .ok_or_else(|| anyhow!("Size value overflow: {size_str}"))
}

/// Format a byte count for display (e.g. `"10 MB"`).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}
