//! Default configuration constants for safestep.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Default detection endpoint.
///
/// The detection service exposes a single GET route returning
/// `{"detected": bool, "confidence": number}`.
pub const DETECTION_ENDPOINT: &str = "http://localhost:5000/api/crosswalk";

/// Default poll interval in milliseconds.
///
/// Ticks are wall-clock periodic: the interval runs between the start of one
/// tick and the start of the next, independent of request latency. One second
/// keeps announcements timely without hammering the detection service.
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Default per-request timeout in milliseconds.
///
/// A hung request must not wedge a tick forever; ten seconds is generous for
/// a local inference service while still bounding the in-flight window.
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Default suppression window in milliseconds.
///
/// After an announcement, repeats for the same detection episode are held
/// back for this long. When detection persists past the window, the next
/// tick re-announces; this periodic reminder is deliberate.
pub const SUPPRESSION_MS: u64 = 5000;

/// The spoken crosswalk message.
pub const CROSSWALK_MESSAGE: &str = "Crosswalk detected, it is safe to cross.";

/// Speech pitch on the speech-dispatcher scale (-100..100).
///
/// Slightly lowered pitch reads as calm rather than alarming.
pub const SPEECH_PITCH: i8 = -25;

/// Speech rate on the speech-dispatcher scale (-100..100).
///
/// Slightly slower than the default so the message is easy to catch
/// in street noise.
pub const SPEECH_RATE: i8 = -10;

/// Speech volume on the speech-dispatcher scale (-100..100).
pub const SPEECH_VOLUME: i8 = 100;

/// Default camera device node.
pub const CAMERA_DEVICE: &str = "/dev/video0";

/// Buffer size for the tick-outcome queue between poller and applier.
///
/// Outcomes are small; the queue only needs enough depth to absorb a burst
/// of late responses resolving together.
pub const OUTCOME_BUFFER: usize = 16;
