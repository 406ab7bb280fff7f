//! Repeating detection poller.
//!
//! Owns the wall-clock tick timer for a monitor session. Every tick issues
//! one independent fetch; a slow response never delays the next tick, so
//! requests may overlap. Outcomes are delivered into a bounded queue in
//! completion order, each stamped with its tick sequence.

use crate::detection::client::DetectionClient;
use crate::detection::types::Detection;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// The product of one poll tick: a detection result or the error that
/// replaced it. An error means "no new information", never "not detected".
#[derive(Debug)]
pub struct TickOutcome {
    pub seq: u64,
    pub outcome: Result<Detection>,
}

/// Repeating poller over a detection client.
pub struct Poller;

impl Poller {
    /// Starts polling and returns the handle that owns the tick timer.
    ///
    /// The first tick fires immediately, then every `interval` after the
    /// previous tick's start. Each tick's fetch runs as its own task and
    /// reports through `outcome_tx`; a failed tick is delivered as an error
    /// outcome and polling continues (the next scheduled tick is the retry).
    pub fn start(
        client: Arc<dyn DetectionClient>,
        interval: Duration,
        outcome_tx: mpsc::Sender<TickOutcome>,
    ) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let ticker = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut seq: u64 = 0;
            let mut inflight: Vec<JoinHandle<()>> = Vec::new();

            loop {
                inflight.retain(|handle| !handle.is_finished());

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticks.tick() => {
                        let client = client.clone();
                        let tx = outcome_tx.clone();
                        let tick_seq = seq;
                        seq += 1;

                        inflight.push(tokio::spawn(async move {
                            let outcome = client.fetch().await;
                            // Receiver gone means the session is over.
                            tx.send(TickOutcome { seq: tick_seq, outcome }).await.ok();
                        }));
                    }
                }
            }

            // Abandon in-flight fetches so nothing is delivered after stop().
            for handle in inflight {
                handle.abort();
                handle.await.ok();
            }
        });

        PollerHandle {
            shutdown_tx,
            ticker,
        }
    }
}

/// Handle to a running poller. Exactly one exists per monitor session.
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    ticker: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the tick timer deterministically.
    ///
    /// After this returns, no new tick fires and no outcome - not even from
    /// a request that was in flight - is delivered to the outcome queue.
    pub async fn stop(self) {
        self.shutdown_tx.send(true).ok();
        if let Err(e) = self.ticker.await
            && !e.is_cancelled()
        {
            eprintln!("safestep: poller task failed: {e}");
        }
    }

    /// Returns true while the tick timer is live.
    pub fn is_running(&self) -> bool {
        !*self.shutdown_tx.borrow() && !self.ticker.is_finished()
    }
}
