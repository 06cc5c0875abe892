//! Utilities module for logging, errors, and small formatting helpers

pub mod error;
pub mod logging;

pub use error::{DatasetError, Result, ResultExt};
pub use logging::{init_logging, LogConfig, LogLevel, ProgressLogger};

/// Format a duration in a human-readable way
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        let minutes = (seconds / 60.0).floor();
        let secs = seconds % 60.0;
        format!("{}m {:.0}s", minutes as u32, secs)
    } else {
        let hours = (seconds / 3600.0).floor();
        let minutes = ((seconds % 3600.0) / 60.0).floor();
        format!("{}h {}m", hours as u32, minutes as u32)
    }
}

/// Number of items kept when retaining `percentage` percent of `total`
pub fn percentage_count(total: usize, percentage: f64) -> usize {
    ((total as f64 * percentage / 100.0).round() as usize).min(total)
}
