//! Detection result types.

use serde::Deserialize;

/// Wire payload returned by the detection service.
///
/// Confidence is in 0.0..=1.0 by the service's own guarantee; the client
/// rejects malformed bodies but does not re-validate the range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Detection {
    pub detected: bool,
    pub confidence: f32,
}

/// A wire payload stamped with the poll tick that produced it.
///
/// The sequence number is monotonic per poll session. The state machine
/// discards results whose sequence is older than the last applied one, so a
/// stale "not detected" resolving late cannot clear a fresher detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult {
    pub detected: bool,
    pub confidence: f32,
    pub seq: u64,
}

impl DetectionResult {
    pub fn new(detected: bool, confidence: f32, seq: u64) -> Self {
        Self {
            detected,
            confidence,
            seq,
        }
    }

    pub fn from_wire(detection: Detection, seq: u64) -> Self {
        Self {
            detected: detection.detected,
            confidence: detection.confidence,
            seq,
        }
    }
}
