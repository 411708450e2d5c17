//! Utility functions

use crate::constants::APP_NAME;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Per-user data directory holding settings and logs
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Format bytes into human-readable string (B, KB, MB, GB)
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Unix seconds as local `YYYY-MM-DD HH:MM`
pub fn format_unix_time(secs: f64) -> String {
    DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Wall-clock time of a download event, local `HH:MM:SS`
pub fn format_clock(time: DateTime<chrono::Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M:%S").to_string()
}
