//! Periodic scheduling on tokio
//!
//! A ticker task polls a shared engine or controller on a fixed interval and
//! forwards every non-idle outcome over a channel. Irregular intervals are
//! harmless since the engine recomputes from absolute timestamps.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::clock::Clock;
use crate::controller::Controller;
use crate::timer::{PollOutcome, TimerEngine};

/// Anything that advances when polled
pub trait Pollable: Send + 'static {
    fn poll(&mut self) -> PollOutcome;
}

impl<C: Clock + 'static> Pollable for TimerEngine<C> {
    fn poll(&mut self) -> PollOutcome {
        TimerEngine::poll(self)
    }
}

impl<C: Clock + Clone + 'static> Pollable for Controller<C> {
    fn poll(&mut self) -> PollOutcome {
        Controller::poll(self)
    }
}

/// Handle to a running ticker task. Dropping it stops the task.
#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("ticker stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll `target` every `every` and forward what happened.
///
/// The task ends on its own once the receiver is dropped.
pub fn spawn_ticker<T: Pollable>(
    target: Arc<Mutex<T>>,
    every: Duration,
) -> (Ticker, mpsc::Receiver<PollOutcome>) {
    let (tx, rx) = mpsc::channel(16);

    let handle = tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            let outcome = target.lock().await.poll();
            if outcome == PollOutcome::Idle {
                continue;
            }
            if tx.send(outcome).await.is_err() {
                break;
            }
        }
    });

    (Ticker { handle: Some(handle) }, rx)
}
