//! Camera stream acquisition.
//!
//! The monitor never inspects frames; it only holds the stream handle open
//! for the lifetime of a session so the detection service and the operator
//! share one camera, and releases it deterministically on teardown.

use crate::error::{Result, SafestepError};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Trait for camera stream ownership.
///
/// This trait allows swapping implementations (real device vs mock).
pub trait CameraSource: Send {
    /// Acquire the stream handle. Called once when a monitor session starts.
    fn acquire(&mut self) -> Result<()>;

    /// Release the stream handle. Must be safe to call after a failed acquire.
    fn release(&mut self) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "camera"
    }
}

/// Camera backed by a V4L2 device node.
///
/// Holding the file open marks the device as in use for the session; the
/// handle itself is opaque to the rest of the system.
pub struct DeviceCamera {
    path: PathBuf,
    handle: Option<File>,
}

impl DeviceCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            handle: None,
        }
    }
}

impl CameraSource for DeviceCamera {
    fn acquire(&mut self) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| SafestepError::CameraAcquisition {
            message: format!("{}: {}", self.path.display(), e),
        })?;
        self.handle = Some(file);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.handle = None;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "device-camera"
    }
}

/// Mock camera for testing.
#[derive(Debug, Clone, Default)]
pub struct MockCameraSource {
    acquired: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
    should_fail: bool,
}

impl MockCameraSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on acquire
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl CameraSource for MockCameraSource {
    fn acquire(&mut self) -> Result<()> {
        if self.should_fail {
            return Err(SafestepError::CameraAcquisition {
                message: "mock acquisition failure".to_string(),
            });
        }
        self.acquired.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock-camera"
    }
}
