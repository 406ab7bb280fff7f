//! Read-side view of the announcement state.
//!
//! The applier publishes a fresh snapshot after every applied tick;
//! status output and library callers read it without touching the
//! machine itself.

use crate::announce::machine::{Announcer, Phase};
use crate::clock::Clock;
use std::sync::{Arc, RwLock};

/// Immutable view of the monitor state at one applied tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub detected: bool,
    pub confidence: f32,
    /// Set while the announcement message is showing.
    pub message: Option<String>,
    /// Sequence number of the last applied tick.
    pub last_seq: Option<u64>,
}

/// Snapshot storage shared between the applier and readers.
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            detected: false,
            confidence: 0.0,
            message: None,
            last_seq: None,
        }
    }
}

impl Snapshot {
    /// Projects the machine state, attaching the message while visible.
    pub fn capture<C: Clock>(announcer: &Announcer<C>, message: &str) -> Self {
        let state = announcer.state();
        Self {
            phase: announcer.phase(),
            detected: state.detected,
            confidence: state.confidence,
            message: state.message_visible.then(|| message.to_string()),
            last_seq: None,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.last_seq = Some(seq);
        self
    }

    /// One-line status rendering for verbose output.
    pub fn status_line(&self) -> String {
        match &self.message {
            Some(message) => format!("crosswalk detected ({:.2}): {}", self.confidence, message),
            None if self.detected => format!("crosswalk detected ({:.2})", self.confidence),
            None => "no crosswalk".to_string(),
        }
    }
}

/// Creates a shared snapshot cell holding the idle state.
pub fn shared() -> SharedSnapshot {
    Arc::new(RwLock::new(Snapshot::default()))
}
