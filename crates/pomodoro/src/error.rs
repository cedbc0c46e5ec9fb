//! Error types for the pomodoro library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PomodoroError {
    #[error("Invalid date key: {0} (expected YYYY-MM-DD)")]
    InvalidDateKey(String),

    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidSettingValue { key: String, value: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),
}

pub type Result<T> = std::result::Result<T, PomodoroError>;
