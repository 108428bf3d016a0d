//! Human-readable sizes, speeds and durations for progress output.

use std::time::Duration;

use crate::stats::FileStats;

const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

/// Formats a byte count using binary multiples ("512 B", "1.50 KB", "2.00 GB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Formats an announced size, or "unknown size" when the server sent none.
#[must_use]
pub fn format_size(size: Option<u64>) -> String {
    size.map_or_else(|| "unknown size".to_string(), format_bytes)
}

/// Formats a transfer rate in bytes per second.
#[must_use]
pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}

/// Formats a duration ("0.4s", "2m 05s", "1h 00m 09s").
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match secs {
        0..60 => format!("{secs}.{}s", d.subsec_millis() / 100),
        60..3600 => format!("{}m {:02}s", secs / 60, secs % 60),
        _ => format!(
            "{}h {:02}m {:02}s",
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        ),
    }
}

/// One-line summary printed after a file finishes.
#[must_use]
pub fn file_summary(name: &str, stats: &FileStats) -> String {
    let line = format!(
        "{name} - {} in {} ({} avg)",
        format_bytes(stats.size),
        format_duration(stats.elapsed),
        format_speed(stats.average_speed),
    );
    match stats.expected_size.filter(|_| stats.is_short()) {
        Some(expected) => format!("{line}, expected {}", format_bytes(expected)),
        None => line,
    }
}
