//! Announcement state machine.
//!
//! Turns the stream of per-tick detection results into debounced
//! announcement effects: one trigger per detection episode, a suppression
//! window between repeats, and an unconditional reset the moment detection
//! ends. The transition function describes side effects instead of
//! performing them, so the hard logic tests without a speech or network
//! backend.

use crate::clock::{Clock, SystemClock};
use crate::config::AnnounceConfig;
use crate::detection::types::DetectionResult;
use std::time::Instant;

/// The announcement flags owned by the state machine.
///
/// Mutated only through [`Announcer::apply`] and window expiry; everything
/// else reads derived snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnnouncementState {
    pub detected: bool,
    pub confidence: f32,
    pub announced: bool,
    pub message_visible: bool,
}

/// Observable phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No crosswalk in view.
    Idle,
    /// Detected but not announced: the next applied detection announces.
    /// Entered when a suppression window expires under continuous detection.
    Pending,
    /// Announcement issued, suppression window active.
    Announced,
}

/// A side effect described by a transition, performed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Speak the crosswalk message.
    Announce(String),
}

/// Announcement state machine.
///
/// Single-writer by construction: the owner applies results serially; a
/// stale result (older tick sequence than the last applied one) is
/// discarded so an out-of-order "not detected" cannot clear a fresher
/// detection.
pub struct Announcer<C: Clock = SystemClock> {
    config: AnnounceConfig,
    state: AnnouncementState,
    /// Suppression window deadline; at most one window is ever active.
    window: Option<Instant>,
    last_seq: Option<u64>,
    clock: C,
}

impl<C: Clock> Announcer<C> {
    /// Creates an announcer with the given configuration and clock.
    pub fn with_clock(config: AnnounceConfig, clock: C) -> Self {
        Self {
            config,
            state: AnnouncementState::default(),
            window: None,
            last_seq: None,
            clock,
        }
    }

    /// Applies one detection result and returns the effect to perform, if any.
    ///
    /// Rules, in order:
    /// 1. Results older than the last applied tick are discarded.
    /// 2. An elapsed suppression window is retired first.
    /// 3. `detected == false` clears everything, including a live window.
    /// 4. `detected == true` announces once, then only refreshes confidence
    ///    until the window has elapsed.
    pub fn apply(&mut self, result: DetectionResult) -> Option<Effect> {
        if let Some(last) = self.last_seq
            && result.seq < last
        {
            return None;
        }
        self.last_seq = Some(result.seq);

        self.expire_window();

        // Unconditional across every branch below.
        self.state.confidence = result.confidence;

        if !result.detected {
            // Detection ending cancels the window immediately: never announce
            // a crosswalk that is no longer visible.
            self.state.detected = false;
            self.state.announced = false;
            self.state.message_visible = false;
            self.window = None;
            return None;
        }

        self.state.detected = true;
        if self.state.announced {
            return None;
        }

        self.state.announced = true;
        self.state.message_visible = true;
        self.window = Some(self.clock.now() + self.config.suppression());
        Some(Effect::Announce(self.config.message.clone()))
    }

    /// Retires the suppression window if it has elapsed.
    ///
    /// The boundary is exclusive: at exactly the suppression duration the
    /// episode is still suppressed; strictly after it, `announced` and
    /// `message_visible` clear and the next applied detection re-announces.
    /// Returns true when the window expired on this call.
    pub fn expire_window(&mut self) -> bool {
        match self.window {
            Some(deadline) if self.clock.now() > deadline => {
                self.window = None;
                self.state.announced = false;
                self.state.message_visible = false;
                true
            }
            _ => false,
        }
    }

    /// Deadline of the active suppression window, if one is running.
    pub fn window_deadline(&self) -> Option<Instant> {
        self.window
    }

    /// Returns the current state flags.
    pub fn state(&self) -> AnnouncementState {
        self.state
    }

    /// Returns the observable phase.
    pub fn phase(&self) -> Phase {
        if !self.state.detected {
            Phase::Idle
        } else if self.state.announced {
            Phase::Announced
        } else {
            Phase::Pending
        }
    }

    /// Resets to idle, dropping any active window and sequence history.
    pub fn reset(&mut self) {
        self.state = AnnouncementState::default();
        self.window = None;
        self.last_seq = None;
    }
}

impl Announcer<SystemClock> {
    /// Creates an announcer using the system clock.
    pub fn new(config: AnnounceConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}
