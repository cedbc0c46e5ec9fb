//! User settings
//!
//! Durations are in minutes. Every field carries a serde default so settings
//! written by an older version, or only partly present, merge onto defaults.

use serde::{Deserialize, Serialize};

use crate::error::{PomodoroError, Result};
use crate::session::TimerMode;

/// Visual theme name, kept for compatibility with stored settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Minimal,
    Cyberpunk,
    Pastel,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Minimal => "minimal",
            Theme::Cyberpunk => "cyberpunk",
            Theme::Pastel => "pastel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" => Some(Theme::Default),
            "minimal" => Some(Theme::Minimal),
            "cyberpunk" => Some(Theme::Cyberpunk),
            "pastel" => Some(Theme::Pastel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    /// Work sessions per day the user aims for
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub theme: Theme,
    /// How far (seconds) the work countdown may be from full and still count
    /// as a fresh start that asks for a commitment. Zero means exact.
    #[serde(default = "default_clean_start_tolerance")]
    pub clean_start_tolerance_secs: u64,
}

fn default_work() -> u32 {
    25
}

fn default_short_break() -> u32 {
    5
}

fn default_long_break() -> u32 {
    15
}

fn default_daily_goal() -> u32 {
    8
}

fn default_sessions_before_long_break() -> u32 {
    4
}

fn default_clean_start_tolerance() -> u64 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            daily_goal: default_daily_goal(),
            sessions_before_long_break: default_sessions_before_long_break(),
            user_name: String::new(),
            theme: Theme::default(),
            clean_start_tolerance_secs: default_clean_start_tolerance(),
        }
    }
}

/// Keys accepted by [`Settings::set`]
pub const SETTING_KEYS: &[&str] = &[
    "work-duration",
    "short-break-duration",
    "long-break-duration",
    "daily-goal",
    "sessions-before-long-break",
    "user-name",
    "theme",
    "clean-start-tolerance",
];

impl Settings {
    /// Configured length of a mode, in minutes
    pub fn mode_minutes(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_duration,
            TimerMode::ShortBreak => self.short_break_duration,
            TimerMode::LongBreak => self.long_break_duration,
        }
    }

    /// Configured length of a mode, in seconds
    pub fn mode_duration_secs(&self, mode: TimerMode) -> u64 {
        u64::from(self.mode_minutes(mode)) * 60
    }

    /// Work sessions per long break, never less than one
    pub fn long_break_every(&self) -> u32 {
        self.sessions_before_long_break.max(1)
    }

    /// Update one setting from its textual form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || PomodoroError::InvalidSettingValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        let minutes = || value.trim().parse::<u32>().map_err(|_| invalid());

        match key {
            "work-duration" => self.work_duration = minutes()?,
            "short-break-duration" => self.short_break_duration = minutes()?,
            "long-break-duration" => self.long_break_duration = minutes()?,
            "daily-goal" => self.daily_goal = minutes()?,
            "sessions-before-long-break" => {
                let count = minutes()?;
                if count == 0 {
                    return Err(invalid());
                }
                self.sessions_before_long_break = count;
            }
            "user-name" => self.user_name = value.trim().to_string(),
            "theme" => self.theme = Theme::from_str(value).ok_or_else(invalid)?,
            "clean-start-tolerance" => {
                self.clean_start_tolerance_secs =
                    value.trim().parse::<u64>().map_err(|_| invalid())?
            }
            _ => return Err(PomodoroError::UnknownSetting(key.to_string())),
        }
        Ok(())
    }
}
