//! Countdown engine
//!
//! Measures wall-clock time against a target duration. Remaining time is
//! always recomputed from the absolute start timestamp, never decremented per
//! iteration, so a late or irregular scheduler cannot make the timer drift.
//!
//! The engine does no scheduling of its own: a host calls [`TimerEngine::poll`]
//! at whatever cadence it has (see `driver`). While the engine is not running
//! no iteration is outstanding and `poll` does nothing, so `pause`, `stop` and
//! `reset` cancel synchronously.

use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Called with the remaining whole seconds (rounded up)
pub type TickFn = Box<dyn FnMut(u64) + Send>;
/// Called once when the countdown reaches zero
pub type CompleteFn = Box<dyn FnMut() + Send>;

/// Result of one scheduling iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing scheduled; no callback fired
    Idle,
    /// `on_tick` fired with this many seconds left
    Tick(u64),
    /// `on_tick(0)` and `on_complete` fired; the engine is stopped
    Completed,
}

/// Observable engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// Stopped with the full duration left
    Idle,
    Running,
    /// Stopped part way; remaining time is kept
    Paused,
    /// Ran down to zero
    Finished,
}

pub struct TimerEngine<C: Clock = SystemClock> {
    clock: C,
    duration_ms: u64,
    remaining_ms: u64,
    /// Set while an iteration is scheduled
    started_at: Option<i64>,
    /// Set when the countdown ran out, cleared by start/reset
    finished: bool,
    on_tick: TickFn,
    on_complete: CompleteFn,
}

impl TimerEngine<SystemClock> {
    pub fn new(
        duration_secs: u64,
        on_tick: impl FnMut(u64) + Send + 'static,
        on_complete: impl FnMut() + Send + 'static,
    ) -> Self {
        Self::with_clock(SystemClock, duration_secs, on_tick, on_complete)
    }
}

impl<C: Clock> TimerEngine<C> {
    pub fn with_clock(
        clock: C,
        duration_secs: u64,
        on_tick: impl FnMut(u64) + Send + 'static,
        on_complete: impl FnMut() + Send + 'static,
    ) -> Self {
        let duration_ms = secs_to_ms(duration_secs);
        Self {
            clock,
            duration_ms,
            remaining_ms: duration_ms,
            started_at: None,
            finished: false,
            on_tick: Box::new(on_tick),
            on_complete: Box::new(on_complete),
        }
    }

    /// Begin (or resume) counting down. No-op while already running.
    pub fn start(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        let now = self.clock.now_ms();
        debug!(remaining_ms = self.remaining_ms, "timer started");
        self.started_at = Some(now);
        self.finished = false;
    }

    /// Run one iteration of the countdown loop.
    pub fn poll(&mut self) -> PollOutcome {
        let Some(started_at) = self.started_at else {
            return PollOutcome::Idle;
        };

        let elapsed = self.elapsed_since(started_at);
        let current = self.remaining_ms.saturating_sub(elapsed);
        let secs = ceil_secs(current);
        (self.on_tick)(secs);

        if current == 0 {
            self.remaining_ms = 0;
            self.stop();
            self.finished = true;
            debug!("timer completed");
            (self.on_complete)();
            PollOutcome::Completed
        } else {
            PollOutcome::Tick(secs)
        }
    }

    /// Freeze the countdown, keeping what is left. No-op unless running.
    pub fn pause(&mut self) {
        let Some(started_at) = self.started_at else {
            return;
        };
        let elapsed = self.elapsed_since(started_at);
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
        self.started_at = None;
        debug!(remaining_ms = self.remaining_ms, "timer paused");
    }

    /// Stop and restore the full duration, optionally replacing it first.
    /// Observers are told the new value immediately.
    pub fn reset(&mut self, new_duration_secs: Option<u64>) {
        self.stop();
        if let Some(secs) = new_duration_secs {
            self.duration_ms = secs_to_ms(secs);
        }
        self.remaining_ms = self.duration_ms;
        self.finished = false;
        (self.on_tick)(ceil_secs(self.remaining_ms));
    }

    /// Cancel the scheduled iteration without touching remaining time.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Change the configured duration. When idle the countdown restarts from
    /// the new duration and observers are told; while running the remaining
    /// time is only capped to the new duration.
    pub fn set_duration(&mut self, secs: u64) {
        self.duration_ms = secs_to_ms(secs);
        if self.started_at.is_none() {
            self.remaining_ms = self.duration_ms;
            self.finished = false;
            (self.on_tick)(secs);
        } else {
            self.remaining_ms = self.remaining_ms.min(self.duration_ms);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn status(&self) -> TimerStatus {
        if self.started_at.is_some() {
            TimerStatus::Running
        } else if self.finished {
            TimerStatus::Finished
        } else if self.remaining_ms == self.duration_ms {
            TimerStatus::Idle
        } else {
            TimerStatus::Paused
        }
    }

    /// Milliseconds left right now, including a running stretch
    pub fn remaining_ms(&self) -> u64 {
        match self.started_at {
            Some(started_at) => self
                .remaining_ms
                .saturating_sub(self.elapsed_since(started_at)),
            None => self.remaining_ms,
        }
    }

    /// Whole seconds left, rounded up like the tick values
    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.remaining_ms())
    }

    pub fn duration_secs(&self) -> u64 {
        ceil_secs(self.duration_ms)
    }

    fn elapsed_since(&self, started_at: i64) -> u64 {
        // A clock that stepped backwards counts as no time passing
        u64::try_from(self.clock.now_ms().saturating_sub(started_at)).unwrap_or(0)
    }
}

impl<C: Clock> std::fmt::Debug for TimerEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("duration_ms", &self.duration_ms)
            .field("remaining_ms", &self.remaining_ms)
            .field("started_at", &self.started_at)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

fn secs_to_ms(secs: u64) -> u64 {
    secs.saturating_mul(1000)
}

fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::{Arc, Mutex};

    /// Engine plus the callback values it produced
    struct Harness {
        engine: TimerEngine<ManualClock>,
        clock: ManualClock,
        ticks: Arc<Mutex<Vec<u64>>>,
        completions: Arc<Mutex<u32>>,
    }

    impl Harness {
        fn new(duration_secs: u64) -> Self {
            let clock = ManualClock::new(1_700_000_000_000);
            let ticks = Arc::new(Mutex::new(Vec::new()));
            let completions = Arc::new(Mutex::new(0));
            let t = ticks.clone();
            let c = completions.clone();
            let engine = TimerEngine::with_clock(
                clock.clone(),
                duration_secs,
                move |secs| t.lock().unwrap().push(secs),
                move || *c.lock().unwrap() += 1,
            );
            Self {
                engine,
                clock,
                ticks,
                completions,
            }
        }

        fn ticks(&self) -> Vec<u64> {
            self.ticks.lock().unwrap().clone()
        }

        fn completions(&self) -> u32 {
            *self.completions.lock().unwrap()
        }

        /// Advance the clock in fixed steps, polling after each
        fn run_for(&mut self, total_ms: i64, step_ms: i64) {
            let mut spent = 0;
            while spent < total_ms {
                self.clock.advance(step_ms);
                spent += step_ms;
                self.engine.poll();
            }
        }
    }

    #[test]
    fn test_five_second_countdown() {
        let mut h = Harness::new(5);
        h.engine.start();
        h.engine.poll();
        h.run_for(5_200, 1_000);

        // 5 at the start, then 4..1, then 0 at completion
        assert_eq!(h.ticks(), vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(h.completions(), 1);
        assert_eq!(h.engine.status(), TimerStatus::Finished);

        // nothing more is delivered once complete
        h.run_for(3_000, 1_000);
        assert_eq!(h.ticks().len(), 6);
        assert_eq!(h.completions(), 1);
    }

    #[test]
    fn test_completion_fires_once_for_many_durations() {
        for duration in [0, 1, 7, 60, 1500] {
            let mut h = Harness::new(duration);
            h.engine.start();
            h.run_for(duration as i64 * 1000 + 3_000, 700);
            assert_eq!(h.completions(), 1, "duration {}", duration);
            assert_eq!(h.ticks().last(), Some(&0), "duration {}", duration);
        }
    }

    #[test]
    fn test_zero_duration_reports_finished_after_completion() {
        let mut h = Harness::new(0);
        assert_eq!(h.engine.status(), TimerStatus::Idle);
        h.engine.start();
        h.engine.poll();
        assert_eq!(h.engine.status(), TimerStatus::Finished);

        h.engine.reset(None);
        assert_eq!(h.engine.status(), TimerStatus::Idle);
    }

    #[test]
    fn test_system_clock_engine_completes_zero_duration() {
        let done = Arc::new(Mutex::new(false));
        let flag = done.clone();
        let mut engine = TimerEngine::new(0, |_| {}, move || *flag.lock().unwrap() = true);
        engine.start();
        assert_eq!(engine.poll(), PollOutcome::Completed);
        assert!(*done.lock().unwrap());
        assert_eq!(engine.status(), TimerStatus::Finished);

        let mut long = TimerEngine::new(600, |_| {}, || {});
        long.start();
        assert!(matches!(long.poll(), PollOutcome::Tick(secs) if secs > 590));
        assert_eq!(long.status(), TimerStatus::Running);
        long.stop();
        assert!(long.remaining_secs() <= 600);
    }

    #[test]
    fn test_zero_duration_completes_on_first_poll() {
        let mut h = Harness::new(0);
        assert_eq!(h.engine.poll(), PollOutcome::Idle);
        h.engine.start();
        assert_eq!(h.engine.poll(), PollOutcome::Completed);
        assert_eq!(h.ticks(), vec![0]);
        assert_eq!(h.completions(), 1);
    }

    #[test]
    fn test_late_scheduler_catches_up_with_single_completion() {
        let mut h = Harness::new(10);
        h.engine.start();
        h.clock.advance(60_000);
        assert_eq!(h.engine.poll(), PollOutcome::Completed);
        assert_eq!(h.engine.poll(), PollOutcome::Idle);
        assert_eq!(h.ticks(), vec![0]);
        assert_eq!(h.completions(), 1);
    }

    #[test]
    fn test_tick_rounds_up() {
        let mut h = Harness::new(3);
        h.engine.start();
        h.clock.advance(1);
        assert_eq!(h.engine.poll(), PollOutcome::Tick(3));
        h.clock.advance(1_998);
        assert_eq!(h.engine.poll(), PollOutcome::Tick(2));
        h.clock.advance(2);
        assert_eq!(h.engine.poll(), PollOutcome::Tick(1));
    }

    #[test]
    fn test_pause_resume_conserves_running_time() {
        let mut h = Harness::new(10);
        h.engine.start();
        h.clock.advance(3_000); // t1
        h.engine.pause();
        assert_eq!(h.engine.remaining_ms(), 7_000);

        h.clock.advance(100_000); // t2, paused
        assert_eq!(h.engine.poll(), PollOutcome::Idle);
        assert_eq!(h.engine.remaining_ms(), 7_000);
        assert_eq!(h.engine.status(), TimerStatus::Paused);

        h.engine.start();
        h.clock.advance(6_999); // t3
        assert_eq!(h.engine.poll(), PollOutcome::Tick(1));
        h.clock.advance(1);
        assert_eq!(h.engine.poll(), PollOutcome::Completed);
        assert_eq!(h.completions(), 1);
    }

    #[test]
    fn test_start_twice_does_not_restart_anchor() {
        let mut h = Harness::new(10);
        h.engine.start();
        h.clock.advance(4_000);
        h.engine.start();
        h.clock.advance(1_000);
        assert_eq!(h.engine.remaining_ms(), 5_000);
    }

    #[test]
    fn test_reset_restores_full_duration_from_any_state() {
        let mut h = Harness::new(10);

        h.engine.reset(None);
        assert_eq!(h.engine.remaining_ms(), 10_000);

        h.engine.start();
        h.clock.advance(4_000);
        h.engine.reset(None);
        assert_eq!(h.engine.remaining_ms(), 10_000);
        assert!(!h.engine.is_running());

        h.engine.start();
        h.clock.advance(2_000);
        h.engine.pause();
        h.engine.reset(None);
        h.engine.reset(None);
        assert_eq!(h.engine.remaining_ms(), 10_000);
        assert_eq!(h.engine.status(), TimerStatus::Idle);

        assert_eq!(h.ticks(), vec![10, 10, 10, 10]);
    }

    #[test]
    fn test_reset_with_new_duration() {
        let mut h = Harness::new(10);
        h.engine.reset(Some(300));
        assert_eq!(h.engine.duration_secs(), 300);
        assert_eq!(h.engine.remaining_secs(), 300);
        assert_eq!(h.ticks(), vec![300]);

        h.engine.reset(Some(0));
        assert_eq!(h.engine.duration_secs(), 0);
    }

    #[test]
    fn test_no_callbacks_after_cancellation() {
        let mut h = Harness::new(5);
        h.engine.start();
        h.clock.advance(1_000);
        h.engine.poll();
        h.engine.stop();
        h.run_for(10_000, 1_000);
        assert_eq!(h.ticks(), vec![4]);
        assert_eq!(h.completions(), 0);
        // stop keeps the base remaining time
        assert_eq!(h.engine.remaining_ms(), 5_000);
    }

    #[test]
    fn test_controls_after_completion_are_safe() {
        let mut h = Harness::new(1);
        h.engine.start();
        h.run_for(2_000, 500);
        assert_eq!(h.completions(), 1);

        h.engine.pause();
        h.engine.stop();
        assert_eq!(h.engine.remaining_ms(), 0);
        assert_eq!(h.completions(), 1);

        h.engine.reset(None);
        assert_eq!(h.engine.remaining_secs(), 1);
    }

    #[test]
    fn test_set_duration_when_idle_and_running() {
        let mut h = Harness::new(10);
        h.engine.set_duration(20);
        assert_eq!(h.engine.remaining_secs(), 20);
        assert_eq!(h.ticks(), vec![20]);

        h.engine.start();
        h.clock.advance(2_000);
        h.engine.set_duration(30);
        // running: no reset, no tick
        assert_eq!(h.engine.remaining_secs(), 18);
        assert_eq!(h.ticks(), vec![20]);

        h.engine.set_duration(5);
        assert!(h.engine.remaining_ms() <= 5_000);
    }

    #[test]
    fn test_clock_going_backwards_counts_as_no_time() {
        let mut h = Harness::new(10);
        h.engine.start();
        h.clock.advance(-5_000);
        assert_eq!(h.engine.poll(), PollOutcome::Tick(10));
        h.engine.pause();
        assert_eq!(h.engine.remaining_ms(), 10_000);
    }
}
