use crate::defaults;
use crate::error::{Result, SafestepError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub announce: AnnounceConfig,
    pub camera: CameraConfig,
}

/// Detection polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Endpoint returning `{"detected": bool, "confidence": number}`
    pub endpoint: String,
    /// Wall-clock interval between tick starts
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_ms: u64,
}

/// Announcement configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnounceConfig {
    /// Suppression window after each announcement
    pub suppression_ms: u64,
    /// The spoken message
    pub message: String,
    /// Prosody on the speech-dispatcher scale (-100..100)
    pub pitch: i8,
    pub rate: i8,
    pub volume: i8,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Device node to hold open for the session
    pub device: String,
    /// Disable to run without a local camera (detection service has its own feed)
    pub enabled: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DETECTION_ENDPOINT.to_string(),
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            request_timeout_ms: defaults::REQUEST_TIMEOUT_MS,
        }
    }
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            suppression_ms: defaults::SUPPRESSION_MS,
            message: defaults::CROSSWALK_MESSAGE.to_string(),
            pitch: defaults::SPEECH_PITCH,
            rate: defaults::SPEECH_RATE,
            volume: defaults::SPEECH_VOLUME,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: defaults::CAMERA_DEVICE.to_string(),
            enabled: true,
        }
    }
}

impl DetectionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AnnounceConfig {
    pub fn suppression(&self) -> Duration {
        Duration::from_millis(self.suppression_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SafestepError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SafestepError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file is missing
    ///
    /// Only returns defaults for a missing file; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(SafestepError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.detection.poll_interval_ms == 0 {
            return Err(SafestepError::ConfigInvalidValue {
                key: "detection.poll_interval_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.announce.suppression_ms == 0 {
            return Err(SafestepError::ConfigInvalidValue {
                key: "announce.suppression_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.announce.message.trim().is_empty() {
            return Err(SafestepError::ConfigInvalidValue {
                key: "announce.message".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SAFESTEP_ENDPOINT → detection.endpoint
    /// - SAFESTEP_MESSAGE → announce.message
    /// - SAFESTEP_CAMERA_DEVICE → camera.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("SAFESTEP_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.detection.endpoint = endpoint;
        }

        if let Ok(message) = std::env::var("SAFESTEP_MESSAGE")
            && !message.is_empty()
        {
            self.announce.message = message;
        }

        if let Ok(device) = std::env::var("SAFESTEP_CAMERA_DEVICE")
            && !device.is_empty()
        {
            self.camera.device = device;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/safestep/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("safestep")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_safestep_env() {
        remove_env("SAFESTEP_ENDPOINT");
        remove_env("SAFESTEP_MESSAGE");
        remove_env("SAFESTEP_CAMERA_DEVICE");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(
            config.detection.endpoint,
            "http://localhost:5000/api/crosswalk"
        );
        assert_eq!(config.detection.poll_interval_ms, 1000);
        assert_eq!(config.detection.request_timeout_ms, 10_000);

        assert_eq!(config.announce.suppression_ms, 5000);
        assert_eq!(
            config.announce.message,
            "Crosswalk detected, it is safe to cross."
        );
        assert_eq!(config.announce.pitch, -25);
        assert_eq!(config.announce.rate, -10);
        assert_eq!(config.announce.volume, 100);

        assert_eq!(config.camera.device, "/dev/video0");
        assert!(config.camera.enabled);
    }

    #[test]
    fn test_duration_accessors() {
        let config = Config::default();
        assert_eq!(config.detection.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.detection.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.announce.suppression(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [detection]
            endpoint = "http://192.168.1.10:5000/api/crosswalk"
            poll_interval_ms = 500
            request_timeout_ms = 2000

            [announce]
            suppression_ms = 8000
            message = "Passage clouté détecté."
            pitch = 0
            rate = 0
            volume = 80

            [camera]
            device = "/dev/video2"
            enabled = false
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(
            config.detection.endpoint,
            "http://192.168.1.10:5000/api/crosswalk"
        );
        assert_eq!(config.detection.poll_interval_ms, 500);
        assert_eq!(config.detection.request_timeout_ms, 2000);

        assert_eq!(config.announce.suppression_ms, 8000);
        assert_eq!(config.announce.message, "Passage clouté détecté.");
        assert_eq!(config.announce.pitch, 0);
        assert_eq!(config.announce.volume, 80);

        assert_eq!(config.camera.device, "/dev/video2");
        assert!(!config.camera.enabled);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [announce]
            suppression_ms = 3000
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        // Only suppression should be overridden
        assert_eq!(config.announce.suppression_ms, 3000);

        // Everything else should be defaults
        assert_eq!(config.detection.poll_interval_ms, 1000);
        assert_eq!(
            config.announce.message,
            "Crosswalk detected, it is safe to cross."
        );
        assert_eq!(config.camera.device, "/dev/video0");
    }

    #[test]
    fn test_env_override_endpoint() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_safestep_env();

        set_env("SAFESTEP_ENDPOINT", "http://10.0.0.5:5000/api/crosswalk");
        let config = Config::default().with_env_overrides();

        assert_eq!(
            config.detection.endpoint,
            "http://10.0.0.5:5000/api/crosswalk"
        );
        // Not overridden
        assert_eq!(
            config.announce.message,
            "Crosswalk detected, it is safe to cross."
        );

        clear_safestep_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_safestep_env();

        set_env("SAFESTEP_ENDPOINT", "http://detector.local/api/crosswalk");
        set_env("SAFESTEP_MESSAGE", "Safe to cross now.");
        set_env("SAFESTEP_CAMERA_DEVICE", "/dev/video1");

        let config = Config::default().with_env_overrides();

        assert_eq!(
            config.detection.endpoint,
            "http://detector.local/api/crosswalk"
        );
        assert_eq!(config.announce.message, "Safe to cross now.");
        assert_eq!(config.camera.device, "/dev/video1");

        clear_safestep_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_safestep_env();

        set_env("SAFESTEP_ENDPOINT", "");
        let config = Config::default().with_env_overrides();

        // Empty string should not override default
        assert_eq!(
            config.detection.endpoint,
            "http://localhost:5000/api/crosswalk"
        );

        clear_safestep_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [detection
            endpoint = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let toml_content = r#"
            [detection]
            poll_interval_ms = 0
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        match Config::load(temp_file.path()) {
            Err(SafestepError::ConfigInvalidValue { key, .. }) => {
                assert_eq!(key, "detection.poll_interval_ms");
            }
            other => panic!("Expected ConfigInvalidValue, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut config = Config::default();
        config.announce.message = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("safestep"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_safestep_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let invalid_toml = r#"
            [detection
            endpoint = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        // Invalid TOML is an error, not a silent fallback to defaults
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }
}
