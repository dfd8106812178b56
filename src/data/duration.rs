use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
    ("m", 60_000_000_000.0),
    ("h", 3_600_000_000_000.0),
];

/// Parse duration strings like "5s", "500ms", "2m", "1.5h".
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<f64>() {
        return from_secs(secs, s);
    }

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            let nanos = val * multiplier;
            if !nanos.is_finite() || nanos < 0.0 {
                bail!("Invalid duration: {}", s);
            }
            if nanos >= u64::MAX as f64 {
                bail!("Duration out of range: {}", s);
            }
            return Ok(Duration::from_nanos(nanos as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

fn from_secs(secs: f64, raw: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("Invalid duration: {}", raw);
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(duration) => Ok(duration),
        Err(_) => bail!("Duration out of range: {}", raw),
    }
}

/// Format a number of seconds as a day/hour/minute/second breakdown.
///
/// The largest non-zero unit decides how much is shown:
/// `"1d 2h 3m 4s"`, `"2h 0m 4s"`, `"3m 4s"`, `"4s"`.
pub fn format_breakdown(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Format a signed interval (e.g. time remaining until an ETA) as a breakdown.
///
/// Negative intervals render as `"0s"`.
pub fn format_remaining(delta: chrono::TimeDelta) -> String {
    format_breakdown(delta.num_seconds().max(0) as u64)
}
