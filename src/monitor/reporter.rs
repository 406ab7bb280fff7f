//! Error severity for the monitor loop.
//!
//! Tick faults are split by how the applier must react: recoverable ones
//! are logged and skipped (the next scheduled tick is the retry), fatal
//! ones end the run. The split comes from [`SafestepError::is_transient`],
//! so the classification lives in one place.

use crate::error::SafestepError;
use std::fmt;

/// A monitor fault, classified by what the loop does next.
#[derive(Debug, Clone)]
pub enum MonitorError {
    /// Logged and skipped; polling continues.
    Recoverable(String),
    /// Ends the run; the applier winds down to idle.
    Fatal(String),
}

impl MonitorError {
    /// Classify a crate error by its transience: transient faults are
    /// recoverable ticks, everything else ends the run.
    pub fn classify(error: &SafestepError) -> Self {
        if error.is_transient() {
            MonitorError::Recoverable(error.to_string())
        } else {
            MonitorError::Fatal(error.to_string())
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::Fatal(_))
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Recoverable(msg) => write!(f, "recoverable: {}", msg),
            MonitorError::Fatal(msg) => write!(f, "fatal: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {}

/// Trait for reporting monitor errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a named component.
    fn report(&self, component: &str, error: &MonitorError);
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, component: &str, error: &MonitorError) {
        eprintln!("safestep [{}]: {}", component, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transient_faults_as_recoverable() {
        let error = MonitorError::classify(&SafestepError::DetectionUnavailable {
            message: "connection refused".to_string(),
        });
        assert!(!error.is_fatal());
        assert_eq!(error.to_string(), "recoverable: Detection service unavailable: connection refused");

        let decode = MonitorError::classify(&SafestepError::DetectionDecode {
            message: "missing field `detected`".to_string(),
        });
        assert!(!decode.is_fatal());
    }

    #[test]
    fn classifies_hard_faults_as_fatal() {
        let camera = MonitorError::classify(&SafestepError::CameraAcquisition {
            message: "/dev/video0 busy".to_string(),
        });
        assert!(camera.is_fatal());

        let other = MonitorError::classify(&SafestepError::Other("client fault".to_string()));
        assert!(other.is_fatal());
        assert_eq!(other.to_string(), "fatal: client fault");
    }

    #[test]
    fn log_reporter_does_not_panic() {
        let reporter = LogReporter;
        reporter.report(
            "detector",
            &MonitorError::Recoverable("test error".to_string()),
        );
        reporter.report("camera", &MonitorError::Fatal("test error".to_string()));
    }
}
