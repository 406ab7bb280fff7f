//! Monitor composition root.
//!
//! Wires the poller, the announcement state machine, an output channel,
//! and an optional camera into one running loop. Tick outcomes flow
//! through a single applier task, so the machine only ever has one
//! writer; readers see it through the shared snapshot.

pub mod events;
pub mod reporter;

pub use events::{MonitorEvent, render_event};
pub use reporter::{ErrorReporter, LogReporter, MonitorError};

use crate::announce::channel::{AnnouncementChannel, SpeechChannel};
use crate::announce::machine::{Announcer, Effect};
use crate::announce::projection::{self, SharedSnapshot, Snapshot};
use crate::camera::CameraSource;
use crate::config::Config;
use crate::defaults;
use crate::detection::client::{DetectionClient, HttpDetectionClient};
use crate::detection::poller::{Poller, PollerHandle, TickOutcome};
use crate::detection::types::DetectionResult;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Builder for a crosswalk monitor run.
pub struct Monitor {
    config: Config,
    client: Option<Arc<dyn DetectionClient>>,
    channel: Option<Box<dyn AnnouncementChannel>>,
    camera: Option<Box<dyn CameraSource>>,
    reporter: Arc<dyn ErrorReporter>,
    event_tx: Option<crossbeam_channel::Sender<MonitorEvent>>,
}

impl Monitor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            client: None,
            channel: None,
            camera: None,
            reporter: Arc::new(LogReporter),
            event_tx: None,
        }
    }

    /// Replace the detection client (defaults to HTTP against the
    /// configured endpoint).
    pub fn with_client(mut self, client: Arc<dyn DetectionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replace the announcement channel (defaults to speech).
    pub fn with_channel(mut self, channel: Box<dyn AnnouncementChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attach a camera source, acquired on start and released on stop.
    pub fn with_camera(mut self, camera: Box<dyn CameraSource>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Forward monitor events to an external consumer. Delivery is
    /// best-effort; a full channel drops the event.
    pub fn with_event_sender(mut self, tx: crossbeam_channel::Sender<MonitorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Starts polling. Fails fast if the camera cannot be acquired or the
    /// HTTP client cannot be built; detection errors after this point are
    /// recoverable and reported instead.
    pub fn start(self) -> Result<MonitorHandle> {
        let Monitor {
            config,
            client,
            channel,
            mut camera,
            reporter,
            event_tx,
        } = self;

        let client = match client {
            Some(client) => client,
            None => Arc::new(HttpDetectionClient::new(
                config.detection.endpoint.clone(),
                config.detection.request_timeout(),
            )?),
        };
        let mut channel =
            channel.unwrap_or_else(|| Box::new(SpeechChannel::new(&config.announce)));

        if let Some(camera) = camera.as_mut() {
            camera.acquire()?;
        }

        let snapshot = projection::shared();
        let running = Arc::new(AtomicBool::new(true));

        let (outcome_tx, mut outcome_rx) = mpsc::channel::<TickOutcome>(defaults::OUTCOME_BUFFER);
        emit(&event_tx, MonitorEvent::Started {
            endpoint: config.detection.endpoint.clone(),
        });
        let poller = Poller::start(client, config.detection.poll_interval(), outcome_tx);

        let applier_snapshot = Arc::clone(&snapshot);
        let applier_running = Arc::clone(&running);
        let mut announcer = Announcer::new(config.announce.clone());
        let message = config.announce.message.clone();
        let applier: JoinHandle<()> = tokio::spawn(async move {
            while let Some(tick) = outcome_rx.recv().await {
                match tick.outcome {
                    Ok(detection) => {
                        let result = DetectionResult::from_wire(detection, tick.seq);
                        let was_visible = announcer.state().message_visible;
                        let effect = announcer.apply(result);
                        let state = announcer.state();

                        emit(&event_tx, MonitorEvent::Tick {
                            seq: tick.seq,
                            detected: state.detected,
                            confidence: state.confidence,
                        });

                        match effect {
                            Some(Effect::Announce(text)) => {
                                if let Err(e) = channel.announce(&text) {
                                    reporter.report(
                                        channel.name(),
                                        &MonitorError::Recoverable(e.to_string()),
                                    );
                                    emit(&event_tx, MonitorEvent::Error {
                                        message: e.to_string(),
                                    });
                                } else {
                                    emit(&event_tx, MonitorEvent::Announced { message: text });
                                }
                            }
                            None => {
                                if was_visible && !state.detected {
                                    if let Err(e) = channel.cancel() {
                                        reporter.report(
                                            channel.name(),
                                            &MonitorError::Recoverable(e.to_string()),
                                        );
                                    }
                                    emit(&event_tx, MonitorEvent::Cleared);
                                }
                            }
                        }

                        publish(
                            &applier_snapshot,
                            Snapshot::capture(&announcer, &message).with_seq(tick.seq),
                        );
                    }
                    Err(e) => {
                        let severity = MonitorError::classify(&e);
                        reporter.report("detector", &severity);
                        emit(&event_tx, MonitorEvent::Error {
                            message: e.to_string(),
                        });
                        if severity.is_fatal() {
                            break;
                        }
                        // Transient: announcement state is left exactly as
                        // the previous tick set it.
                    }
                }
            }

            // The run is over, either because the poller stopped and every
            // in-flight request settled, or because a fatal fault broke the
            // loop. Wind down to idle.
            if let Err(e) = channel.cancel() {
                reporter.report(channel.name(), &MonitorError::Recoverable(e.to_string()));
            }
            if let Some(camera) = camera.as_mut()
                && let Err(e) = camera.release()
            {
                reporter.report(camera.name(), &MonitorError::classify(&e));
            }
            announcer.reset();
            publish(&applier_snapshot, Snapshot::default());
            emit(&event_tx, MonitorEvent::Stopped);
            applier_running.store(false, Ordering::SeqCst);
        });

        Ok(MonitorHandle {
            poller,
            applier,
            snapshot,
            running,
        })
    }
}

fn publish(cell: &SharedSnapshot, snapshot: Snapshot) {
    let mut guard = cell.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = snapshot;
}

fn emit(tx: &Option<crossbeam_channel::Sender<MonitorEvent>>, event: MonitorEvent) {
    if let Some(tx) = tx {
        // A full or disconnected consumer drops the event.
        tx.try_send(event).ok();
    }
}

/// Handle to a running monitor.
pub struct MonitorHandle {
    poller: PollerHandle,
    applier: JoinHandle<()>,
    snapshot: SharedSnapshot,
    running: Arc<AtomicBool>,
}

impl MonitorHandle {
    /// Current projection of the announcement state.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Shared snapshot cell, for readers that outlive the handle.
    pub fn snapshot_cell(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops polling and waits for the applier to drain.
    ///
    /// When this returns, no further announcement can be delivered, the
    /// camera is released, and the snapshot reads idle.
    pub async fn stop(self) {
        self.poller.stop().await;
        if let Err(e) = self.applier.await
            && !e.is_cancelled()
        {
            eprintln!("safestep: applier task failed: {}", e);
        }
    }
}
