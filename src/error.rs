//! Error types for safestep.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafestepError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Detection service errors
    #[error("Detection service unavailable: {message}")]
    DetectionUnavailable { message: String },

    #[error("Failed to decode detection response: {message}")]
    DetectionDecode { message: String },

    // Camera errors
    #[error("Camera acquisition failed: {message}")]
    CameraAcquisition { message: String },

    // Speech synthesis errors
    #[error("Speech synthesis failed: {message}")]
    Speech { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl SafestepError {
    /// True for faults the poller treats as "no new information":
    /// the tick is reported and skipped, the previous state is kept.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SafestepError::DetectionUnavailable { .. } | SafestepError::DetectionDecode { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SafestepError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = SafestepError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = SafestepError::ConfigInvalidValue {
            key: "poll_interval_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for poll_interval_ms: must be positive"
        );
    }

    #[test]
    fn test_detection_unavailable_display() {
        let error = SafestepError::DetectionUnavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Detection service unavailable: connection refused"
        );
    }

    #[test]
    fn test_detection_decode_display() {
        let error = SafestepError::DetectionDecode {
            message: "missing field `confidence`".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to decode detection response: missing field `confidence`"
        );
    }

    #[test]
    fn test_camera_acquisition_display() {
        let error = SafestepError::CameraAcquisition {
            message: "/dev/video0 busy".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Camera acquisition failed: /dev/video0 busy"
        );
    }

    #[test]
    fn test_speech_display() {
        let error = SafestepError::Speech {
            message: "spd-say not found".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Speech synthesis failed: spd-say not found"
        );
    }

    #[test]
    fn test_other_display() {
        let error = SafestepError::Other("unexpected error".to_string());
        assert_eq!(error.to_string(), "unexpected error");
    }

    #[test]
    fn test_transient_classification() {
        assert!(
            SafestepError::DetectionUnavailable {
                message: "timeout".to_string()
            }
            .is_transient()
        );
        assert!(
            SafestepError::DetectionDecode {
                message: "bad json".to_string()
            }
            .is_transient()
        );
        assert!(
            !SafestepError::CameraAcquisition {
                message: "busy".to_string()
            }
            .is_transient()
        );
        assert!(!SafestepError::Other("x".to_string()).is_transient());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: SafestepError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: SafestepError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<SafestepError>();
        assert_sync::<SafestepError>();
    }
}
