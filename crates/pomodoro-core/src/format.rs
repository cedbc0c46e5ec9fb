//! Formatting utilities

use chrono::{DateTime, Local, TimeZone};

/// Format whole seconds as a countdown clock (MM:SS, or H:MM:SS past an hour)
pub fn clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format minutes as "Xh Ym" (or "Ym" under an hour)
pub fn minutes(total: u32) -> String {
    if total < 60 {
        format!("{}m", total)
    } else {
        format!("{}h {}m", total / 60, total % 60)
    }
}

/// Format an epoch-millisecond timestamp as local HH:MM
pub fn time_of_day(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => hh_mm(dt),
        None => "--:--".to_string(),
    }
}

fn hh_mm(dt: DateTime<Local>) -> String {
    dt.format("%H:%M").to_string()
}

/// Truncate a string to max characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
