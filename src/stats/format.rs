//! Human-readable byte rates.

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * KB;
const GB: f64 = 1024.0 * MB;

/// Format bytes per second with two decimals in binary units.
///
/// A unit is used only when the rate is strictly greater than one of it,
/// so exactly 1024 B/s prints as `1024.00 B/s`.
pub fn format_rate(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

/// Format a byte amount with the same units and thresholds as [`format_rate`].
pub fn format_bytes(bytes: f64) -> String {
    if bytes > GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes > MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes > KB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{:.2} B", bytes)
    }
}

/// Like [`format_rate`], with `--` for "no data".
pub fn format_optional_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "--".to_string(), format_rate)
}
