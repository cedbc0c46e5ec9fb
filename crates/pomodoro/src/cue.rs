//! Situational cues (start, work complete, break over)
//!
//! Cues are fire-and-forget: the timer never waits on them and a failing sink
//! must not affect timing.

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// A countdown was started or resumed
    Start,
    /// A work session ran to completion
    Complete,
    /// A break ran to completion; back to work
    Break,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Start => "start",
            Cue::Complete => "complete",
            Cue::Break => "break",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Cue::Start => "Timer started",
            Cue::Complete => "Focus session complete. Take a break.",
            Cue::Break => "Break is over. Back to work.",
        }
    }
}

pub trait CueSink: Send {
    fn play(&self, cue: Cue);
}

/// Records cues in the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCues;

impl CueSink for LogCues {
    fn play(&self, cue: Cue) {
        info!(cue = cue.as_str(), "{}", cue.message());
    }
}
