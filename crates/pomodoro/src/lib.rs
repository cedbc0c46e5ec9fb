//! pomodoro - Work/break focus timer with session history and statistics
//!
//! The library is split into two halves:
//! - A drift-free countdown engine ([`timer`]) driven by any periodic
//!   scheduler ([`driver`] runs it on tokio), wrapped by a [`controller`]
//!   that cycles work and break modes and records finished sessions.
//! - Pure statistics over the recorded history ([`stats`]): daily totals,
//!   Monday-first weeks, month heatmaps and yearly totals, all bucketed by
//!   local calendar day.
//!
//! Settings, history and tasks persist as JSON through [`store`].

pub mod clock;
pub mod controller;
pub mod cue;
pub mod driver;
pub mod error;
pub mod history;
pub mod session;
pub mod settings;
pub mod stats;
pub mod store;
pub mod tasks;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{Controller, PendingSession, ToggleOutcome};
pub use cue::{Cue, CueSink, LogCues};
pub use error::{PomodoroError, Result};
pub use history::History;
pub use session::{SessionRecord, TimerMode};
pub use settings::Settings;
pub use stats::Stats;
pub use store::Store;
pub use tasks::{Task, TaskList};
pub use timer::{PollOutcome, TimerEngine, TimerStatus};
