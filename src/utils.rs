use chrono::{DateTime, Utc};

pub const DEFAULT_PRECISION: usize = 2;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format bytes to human readable format
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_with_precision(bytes, DEFAULT_PRECISION)
}

/// Format bytes with at most `precision` decimals, trailing zeros dropped
pub fn format_bytes_with_precision(bytes: u64, precision: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let rounded = format!("{:.*}", precision, size);
    let trimmed = if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.')
    } else {
        rounded.as_str()
    };

    format!("{} {}", trimmed, UNITS[unit_index])
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Join a directory path and a file name with exactly one separator
pub fn join_path(dir: &str, file: &str) -> String {
    let file = file.trim_start_matches('/');
    if dir.is_empty() {
        return file.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), file)
}
