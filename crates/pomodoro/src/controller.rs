//! Work/break cycle controller
//!
//! Owns the timer engine, settings, history and cue sink, all handed in at
//! construction. Drives the mode cycle: work, then a short break (or a long
//! one every `sessions_before_long_break` sessions), then work again.
//!
//! A finished work session is not written to history straight away. It waits
//! as a [`PendingSession`] until the user saves it (with a note) or discards
//! it; either way the cycle then moves on to the next break.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::cue::{Cue, CueSink};
use crate::history::History;
use crate::session::{NewSession, SessionRecord, TimerMode};
use crate::settings::Settings;
use crate::timer::{PollOutcome, TimerEngine, TimerStatus};

/// What a start/pause request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Paused,
    /// Fresh work session: ask for a commitment, then call `commit`
    NeedsCommitment,
    /// A finished session must be saved or discarded first
    Blocked,
}

/// A completed work session waiting for save or discard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSession {
    pub started_at: i64,
    pub ended_at: i64,
    /// Configured work minutes at completion, not the measured span
    pub duration: u32,
    pub commitment: Option<String>,
}

pub struct Controller<C: Clock + Clone = SystemClock> {
    engine: TimerEngine<C>,
    clock: C,
    settings: Settings,
    history: History,
    cues: Box<dyn CueSink>,
    active_task: Option<String>,
    mode: TimerMode,
    completed_sessions: u32,
    pending: Option<PendingSession>,
    commitment: Option<String>,
    work_started_at: Option<i64>,
    /// Last value delivered through the engine's tick callback
    shown_secs: Arc<AtomicU64>,
    /// Raised by the engine's completion callback, consumed by `poll`
    finished: Arc<AtomicBool>,
}

impl Controller<SystemClock> {
    pub fn new(settings: Settings, history: History, cues: Box<dyn CueSink>) -> Self {
        Self::with_clock(SystemClock, settings, history, cues)
    }
}

impl<C: Clock + Clone> Controller<C> {
    pub fn with_clock(clock: C, settings: Settings, history: History, cues: Box<dyn CueSink>) -> Self {
        let duration = settings.mode_duration_secs(TimerMode::Work);
        let shown_secs = Arc::new(AtomicU64::new(duration));
        let finished = Arc::new(AtomicBool::new(false));

        let shown = shown_secs.clone();
        let done = finished.clone();
        let engine = TimerEngine::with_clock(
            clock.clone(),
            duration,
            move |secs| shown.store(secs, Ordering::SeqCst),
            move || done.store(true, Ordering::SeqCst),
        );

        Self {
            engine,
            clock,
            settings,
            history,
            cues,
            active_task: None,
            mode: TimerMode::Work,
            completed_sessions: 0,
            pending: None,
            commitment: None,
            work_started_at: None,
            shown_secs,
            finished,
        }
    }

    /// Start or pause, the single play/pause control
    pub fn toggle(&mut self) -> ToggleOutcome {
        if self.engine.is_running() {
            self.engine.pause();
            return ToggleOutcome::Paused;
        }
        if self.pending.is_some() {
            return ToggleOutcome::Blocked;
        }
        if self.mode == TimerMode::Work && self.is_clean_start() {
            return ToggleOutcome::NeedsCommitment;
        }
        self.begin();
        ToggleOutcome::Started
    }

    /// Record why this session matters and start it. Blank reasons are
    /// dropped.
    pub fn commit(&mut self, reason: impl Into<String>) -> ToggleOutcome {
        if self.engine.is_running() {
            return ToggleOutcome::Started;
        }
        if self.pending.is_some() {
            return ToggleOutcome::Blocked;
        }
        let reason = reason.into();
        let reason = reason.trim();
        self.commitment = (!reason.is_empty()).then(|| reason.to_string());
        self.begin();
        ToggleOutcome::Started
    }

    /// Stop and restore the full duration of the current mode
    pub fn reset(&mut self) {
        self.engine.reset(None);
        self.work_started_at = None;
        self.commitment = None;
        self.finished.store(false, Ordering::SeqCst);
    }

    /// Abandon the current countdown and move on without recording anything.
    /// A finished session still waiting for save is discarded.
    pub fn skip(&mut self) {
        if self.discard_session() {
            return;
        }
        self.engine.stop();
        let next = match self.mode {
            TimerMode::Work => TimerMode::ShortBreak,
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        };
        self.apply_mode(next);
    }

    /// Switch mode while idle. Returns false while a countdown is running.
    pub fn switch_mode(&mut self, mode: TimerMode) -> bool {
        if self.engine.is_running() {
            return false;
        }
        self.apply_mode(mode);
        true
    }

    /// Replace settings; when not running the countdown picks up the new
    /// duration for the current mode.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        if !self.engine.is_running() {
            let secs = self.settings.mode_duration_secs(self.mode);
            self.engine.reset(Some(secs));
            self.work_started_at = None;
        }
    }

    /// One scheduling iteration; handles completion when it happens
    pub fn poll(&mut self) -> PollOutcome {
        let outcome = self.engine.poll();
        if self.finished.swap(false, Ordering::SeqCst) {
            self.on_complete();
        }
        outcome
    }

    /// Save the pending session with a note and move on to the break
    pub fn save_session(&mut self, note: impl Into<String>) -> Option<&SessionRecord> {
        let pending = self.pending.take()?;
        let session = NewSession::new(pending.started_at, pending.ended_at, pending.duration)
            .with_note(note)
            .with_task(self.active_task.clone())
            .with_commitment(pending.commitment);
        self.advance_after_work();
        let record = self.history.add(session);
        info!(id = %record.id, minutes = record.minutes(), "session saved");
        Some(record)
    }

    /// Drop the pending session and move on to the break
    pub fn discard_session(&mut self) -> bool {
        if self.pending.take().is_none() {
            return false;
        }
        self.advance_after_work();
        true
    }

    pub fn set_active_task(&mut self, task_id: Option<String>) {
        self.active_task = task_id;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    /// Remaining seconds as last reported to observers
    pub fn remaining_secs(&self) -> u64 {
        self.shown_secs.load(Ordering::SeqCst)
    }

    /// Full length of the current mode in seconds
    pub fn total_secs(&self) -> u64 {
        self.settings.mode_duration_secs(self.mode)
    }

    /// Share of the current countdown already done, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 1.0;
        }
        let remaining = self.remaining_secs().min(total);
        1.0 - remaining as f64 / total as f64
    }

    pub fn completed_sessions(&self) -> u32 {
        self.completed_sessions
    }

    /// (completed this run, daily goal)
    pub fn goal_progress(&self) -> (u32, u32) {
        (self.completed_sessions, self.settings.daily_goal)
    }

    pub fn pending_session(&self) -> Option<&PendingSession> {
        self.pending.as_ref()
    }

    pub fn commitment(&self) -> Option<&str> {
        self.commitment.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    fn is_clean_start(&self) -> bool {
        let full = self.settings.mode_duration_secs(TimerMode::Work);
        self.remaining_secs().abs_diff(full) <= self.settings.clean_start_tolerance_secs
    }

    fn begin(&mut self) {
        if self.mode == TimerMode::Work && self.work_started_at.is_none() {
            self.work_started_at = Some(self.clock.now_ms());
        }
        self.cues.play(Cue::Start);
        self.engine.start();
    }

    fn on_complete(&mut self) {
        match self.mode {
            TimerMode::Work => {
                self.cues.play(Cue::Complete);
                let now = self.clock.now_ms();
                let duration = self.settings.work_duration;
                let started_at = self
                    .work_started_at
                    .take()
                    .unwrap_or_else(|| now - i64::from(duration) * 60_000);
                debug!(duration, "work session finished");
                self.pending = Some(PendingSession {
                    started_at,
                    ended_at: now,
                    duration,
                    commitment: self.commitment.clone(),
                });
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                self.cues.play(Cue::Break);
                self.apply_mode(TimerMode::Work);
            }
        }
    }

    fn advance_after_work(&mut self) {
        self.commitment = None;
        self.completed_sessions += 1;
        let next = if self.completed_sessions % self.settings.long_break_every() == 0 {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        };
        self.apply_mode(next);
    }

    fn apply_mode(&mut self, mode: TimerMode) {
        debug!(from = self.mode.as_str(), to = mode.as_str(), "mode change");
        self.mode = mode;
        self.work_started_at = None;
        self.finished.store(false, Ordering::SeqCst);
        self.engine.reset(Some(self.settings.mode_duration_secs(mode)));
    }
}
