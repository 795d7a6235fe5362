//! Drives [`PollCycle`] repeatedly with a fixed delay until shut down.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::config::PollConfig;
use crate::poller::PollCycle;

/// Stops a running [`PollScheduler`]. Dropping the handle stops it as well.
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Requests shutdown. An in-flight long-poll is abandoned with the offset untouched; a batch
    /// already being dispatched finishes first.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }
}

/// Owns the cycle, so at most one cycle (and one fetch) is ever in flight.
pub struct PollScheduler {
    cycle: PollCycle,
    cycle_delay: Duration,
    max_backoff: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PollScheduler {
    pub fn new(cycle: PollCycle) -> (Self, ShutdownHandle) {
        let (tx, rx) = watch::channel(false);
        let PollConfig {
            cycle_delay,
            max_backoff,
            ..
        } = cycle.config().clone();
        let scheduler = Self {
            cycle,
            cycle_delay,
            max_backoff,
            shutdown: rx,
        };
        (scheduler, ShutdownHandle { tx })
    }

    /// Polls until shutdown and returns the final offset.
    ///
    /// After a failed fetch the delay doubles from one second up to `max_backoff` (never below
    /// the fixed cycle delay); the next successful fetch resets it.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> i64 {
        let mut backoff = Duration::ZERO;
        info!(offset = self.cycle.offset(), "Poller started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            // Only the long poll is cancellable; a fetched batch is always dispatched and acked.
            let response = tokio::select! {
                response = self.cycle.fetch() => response,
                _ = self.shutdown.changed() => {
                    info!(offset = self.cycle.offset(), "Poller cancelled during fetch");
                    break;
                }
            };
            let report = self.cycle.process_batch(response).await;

            let delay = if report.transport_failed {
                backoff = next_backoff(backoff, self.max_backoff);
                warn!(backoff_ms = backoff.as_millis() as u64, "Fetch failed, backing off");
                backoff.max(self.cycle_delay)
            } else {
                backoff = Duration::ZERO;
                self.cycle_delay
            };

            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.shutdown.changed() => break,
                }
            }
        }

        info!(offset = self.cycle.offset(), "Poller stopped");
        self.cycle.offset()
    }
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    if current.is_zero() {
        Duration::from_secs(1).min(max)
    } else {
        (current * 2).min(max)
    }
}
