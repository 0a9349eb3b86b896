//! Telemetry module
//!
//! Logging setup and lightweight metric recording for the protocol client

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{record_counter, record_rtt, CounterMetric};

/// Human-readable byte size for packet logging
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
