/// Size formatting utilities: human-readable byte counts.
///
/// All internal sizes are `u64` bytes. Floating point is only used
/// at the configuration and display boundaries.

/// Bytes in one gigabyte (binary, 1024³), the unit of the size threshold.
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count into a human-readable string.
///
/// Divides by 1024 until the value drops below 1024 (or the largest unit
/// is reached) and prints at most two decimals, trimming trailing zeros:
/// `1536` → `"1.5 KB"`, `1_073_741_824` → `"1 GB"`.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut order = 0;
    while value >= 1024.0 && order < UNITS.len() - 1 {
        value /= 1024.0;
        order += 1;
    }

    if order == 0 {
        return format!("{bytes} B");
    }

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[order])
}

/// Format a count with thousand separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Convert a threshold given in gigabytes to bytes, rounding down.
///
/// Callers validate that `gb` is finite and non-negative.
pub fn gigabytes_to_bytes(gb: f64) -> u64 {
    (gb * BYTES_PER_GB as f64).floor() as u64
}
