//! Progress Estimator: instantaneous throughput and ETA from cumulative byte
//! counters, plus human-readable formatting.
//!
//! Estimates use the bytes sent since the task started divided by the time
//! since it started. They are noisy at the first samples; callers get `None`
//! whenever a value is undefined.

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Bytes per second, or `None` when `elapsed_secs` is not strictly positive.
pub fn speed(bytes_sent: u64, elapsed_secs: f64) -> Option<f64> {
    if !elapsed_secs.is_finite() || elapsed_secs <= 0.0 {
        return None;
    }
    Some(bytes_sent as f64 / elapsed_secs)
}

/// Seconds remaining, or `None` without a positive speed.
pub fn eta(remaining_bytes: u64, bytes_per_sec: Option<f64>) -> Option<f64> {
    match bytes_per_sec {
        Some(s) if s.is_finite() && s > 0.0 => Some(remaining_bytes as f64 / s),
        _ => None,
    }
}

/// Share of `total` already sent, 0–100. A zero total reports 0.
pub fn percent(bytes_sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (bytes_sent.min(total) as f64 / total as f64) * 100.0
}

/// Scale a value into 1024-based units.
fn scaled(value: f64) -> (f64, &'static str) {
    let mut size = value;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }
    (size, UNITS[unit_idx])
}

/// `"0 B"`, `"512 B"`, `"1.5 KB"`, `"3.2 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    let (size, unit) = scaled(bytes as f64);
    if unit == UNITS[0] {
        format!("{} {}", bytes, unit)
    } else {
        format!("{:.1} {}", size, unit)
    }
}

/// `"512 B/s"`, `"1.5 MB/s"`; `"—"` when unknown.
pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
    match bytes_per_sec {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let (size, unit) = scaled(s);
            if unit == UNITS[0] {
                format!("{:.0} {}/s", size, unit)
            } else {
                format!("{:.1} {}/s", size, unit)
            }
        }
        _ => "—".to_string(),
    }
}

/// `"45s"`, `"3m 07s"`, `"1h 02m"`; `"—"` when unknown.
pub fn format_eta(seconds: Option<f64>) -> String {
    let secs = match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => s.ceil() as u64,
        _ => return "—".to_string(),
    };
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}
