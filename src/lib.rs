//! safestep - Crosswalk announcement aid
//!
//! Polls a crosswalk detection service and announces safe-to-cross
//! conditions, with a suppression window between repeat announcements.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod announce;
pub mod camera;
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod detection;
pub mod error;
pub mod monitor;

// Core traits (client → machine → channel)
pub use announce::channel::{AnnouncementChannel, CollectorChannel, SpeechChannel, StdoutChannel};
pub use announce::machine::{AnnouncementState, Announcer, Effect, Phase};
pub use announce::projection::{SharedSnapshot, Snapshot};
pub use camera::{CameraSource, DeviceCamera, MockCameraSource};
pub use clock::{Clock, MockClock, SystemClock};
pub use detection::client::{DetectionClient, HttpDetectionClient, ScriptedClient, ScriptedReply};
pub use detection::poller::{Poller, PollerHandle, TickOutcome};
pub use detection::types::{Detection, DetectionResult};

// Composition root
pub use monitor::{Monitor, MonitorHandle};

// Error handling
pub use error::{Result, SafestepError};
pub use monitor::reporter::{ErrorReporter, LogReporter, MonitorError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
