//! Session types
//!
//! Timer modes (work, short break, long break) and the immutable record of a
//! completed work session as it is kept in history.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What the timer is currently counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    /// Focused work interval
    #[default]
    Work,
    /// Short rest between work intervals
    ShortBreak,
    /// Longer rest after a full set of work intervals
    LongBreak,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short-break",
            TimerMode::LongBreak => "long-break",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "work" | "focus" => Some(TimerMode::Work),
            "short-break" | "shortbreak" | "short" => Some(TimerMode::ShortBreak),
            "long-break" | "longbreak" | "long" => Some(TimerMode::LongBreak),
            _ => None,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, TimerMode::Work)
    }

    /// Heading shown while this mode is active
    pub fn title(&self) -> &'static str {
        match self {
            TimerMode::Work => "FOCUS",
            TimerMode::ShortBreak => "SHORT BREAK",
            TimerMode::LongBreak => "LONG BREAK",
        }
    }
}

/// Kind of a stored session. Breaks are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Work,
}

/// A completed work session as kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unique id, never reused. Empty only for damaged stored entries,
    /// which the store gives a fresh id on load.
    #[serde(default)]
    pub id: String,
    /// When the session started (Unix milliseconds)
    pub start_time: i64,
    /// When the session ended (Unix milliseconds); 0 when it was not stored
    #[serde(default)]
    pub end_time: i64,
    /// Minutes credited to the session; older or damaged entries may lack it
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration: Option<u32>,
    #[serde(rename = "type", default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub note: String,
    /// Weak reference to a task; the task may no longer exist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// The "why" stated before the session started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
}

impl SessionRecord {
    /// Minutes credited, treating a missing duration as zero
    pub fn minutes(&self) -> u32 {
        self.duration.unwrap_or(0)
    }

    /// Calendar date the session started on, in the given zone
    pub fn start_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        local_date(self.start_time, tz)
    }

    /// Calendar date the session ended on, in the given zone
    pub fn end_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        local_date(self.end_time, tz)
    }
}

/// Accept any stored number of minutes. Fractions are rounded; negative,
/// non-numeric and null values mean "unknown".
fn lenient_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let Value::Number(n) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Some(whole) = n.as_u64() {
        return Ok(Some(u32::try_from(whole).unwrap_or(u32::MAX)));
    }
    Ok(n
        .as_f64()
        .filter(|m| m.is_finite() && *m >= 0.0)
        .map(|m| m.round().min(f64::from(u32::MAX)) as u32))
}

/// Calendar date of an epoch-millisecond timestamp in the given zone.
///
/// Every date comparison in the crate goes through here so that filtering and
/// labelling can never disagree about which day a session belongs to.
pub fn local_date<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|utc| utc.with_timezone(tz).date_naive())
}

/// A session about to be recorded; history assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub start_time: i64,
    pub end_time: i64,
    pub duration: u32,
    pub note: String,
    pub task_id: Option<String>,
    pub commitment: Option<String>,
}

impl NewSession {
    pub fn new(start_time: i64, end_time: i64, duration: u32) -> Self {
        Self {
            start_time,
            end_time: end_time.max(start_time),
            duration,
            note: String::new(),
            task_id: None,
            commitment: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_task(mut self, task_id: Option<String>) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn with_commitment(mut self, commitment: Option<String>) -> Self {
        self.commitment = commitment.filter(|c| !c.trim().is_empty());
        self
    }

    pub(crate) fn into_record(self, id: String) -> SessionRecord {
        SessionRecord {
            id,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: Some(self.duration),
            kind: SessionKind::Work,
            note: self.note,
            task_id: self.task_id,
            commitment: self.commitment,
        }
    }
}
