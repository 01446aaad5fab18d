//! Text sparklines.
//!
//! Values are scaled against the largest visible value and drawn with the
//! eight Unicode block heights, newest on the right.

/// Block characters from lowest to highest.
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the last `width` values of `values` as a sparkline.
///
/// Shorter series are left-padded with blanks so the newest point always
/// sits at the right edge.
pub fn render_sparkline(values: &[u64], width: usize) -> String {
    let visible = &values[values.len().saturating_sub(width)..];
    let peak = visible.iter().copied().max().unwrap_or(0);

    let mut line = String::with_capacity(width * 3);
    line.extend(std::iter::repeat_n(' ', width - visible.len()));

    for &value in visible {
        let level = if peak == 0 {
            0
        } else {
            ((value as f64 / peak as f64) * (LEVELS.len() - 1) as f64).round() as usize
        };
        line.push(LEVELS[level.min(LEVELS.len() - 1)]);
    }
    line
}

/// Byte counts of a `(timestamp, bytes)` series.
pub fn series_values(series: &[(u64, u64)]) -> Vec<u64> {
    series.iter().map(|(_, bytes)| *bytes).collect()
}
