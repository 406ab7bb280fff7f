//! Pluggable announcement outputs.
//!
//! The state machine emits effects; a channel performs them. Production
//! runs speak through speech-dispatcher, pipe mode prints to stdout, and
//! tests collect into memory.

use crate::config::AnnounceConfig;
use crate::error::{Result, SafestepError};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

/// Output handler for announcement effects.
/// Pairs with DetectionClient for input - this handles the spoken side.
pub trait AnnouncementChannel: Send + 'static {
    /// Deliver one announcement. Called at most once per detection episode
    /// until the suppression window elapses.
    fn announce(&mut self, message: &str) -> Result<()>;

    /// Cut off any in-progress delivery. Called when detection ends and on
    /// shutdown. Default is a no-op for channels with nothing to cut.
    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Speaks through `spd-say` (speech-dispatcher).
///
/// A new announcement replaces the previous one: the old child process is
/// killed first so overlapping speech never stacks up.
pub struct SpeechChannel {
    pitch: i8,
    rate: i8,
    volume: i8,
    current: Option<Child>,
}

impl SpeechChannel {
    pub fn new(config: &AnnounceConfig) -> Self {
        Self {
            pitch: config.pitch,
            rate: config.rate,
            volume: config.volume,
            current: None,
        }
    }

    /// Block until the current utterance finishes. Used by one-shot
    /// speech, not by the monitor loop.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(mut child) = self.current.take() {
            child.wait().map_err(|e| SafestepError::Speech {
                message: format!("failed to wait for spd-say: {}", e),
            })?;
        }
        Ok(())
    }

    fn kill_current(&mut self) {
        if let Some(mut child) = self.current.take() {
            // Already-exited children return InvalidInput here; either way
            // the handle must be reaped.
            child.kill().ok();
            child.wait().ok();
        }
    }
}

impl AnnouncementChannel for SpeechChannel {
    fn announce(&mut self, message: &str) -> Result<()> {
        self.kill_current();

        // -w keeps the child alive for the whole utterance, so its
        // lifetime tracks playback and kill_current can supersede it.
        let child = Command::new("spd-say")
            .arg("-w")
            .arg("-p")
            .arg(self.pitch.to_string())
            .arg("-r")
            .arg(self.rate.to_string())
            .arg("-i")
            .arg(self.volume.to_string())
            .arg("--")
            .arg(message)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SafestepError::Speech {
                message: format!("failed to launch spd-say: {}", e),
            })?;

        self.current = Some(child);
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.kill_current();
        // Killing the client does not silence speech already dispatched.
        let _stop = Command::new("spd-say")
            .arg("-S")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "speech"
    }
}

impl Drop for SpeechChannel {
    fn drop(&mut self) {
        self.kill_current();
    }
}

/// Pipe mode channel that prints announcements to stdout.
pub struct StdoutChannel;

impl AnnouncementChannel for StdoutChannel {
    fn announce(&mut self, message: &str) -> Result<()> {
        println!("{}", message);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Collects announcements in memory for tests and library use.
///
/// Clones share storage, so a clone kept by the test observes messages
/// delivered through the instance handed to the monitor.
#[derive(Clone)]
pub struct CollectorChannel {
    messages: Arc<Mutex<Vec<String>>>,
    cancels: Arc<Mutex<usize>>,
    fail_next: Arc<Mutex<bool>>,
}

impl CollectorChannel {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            cancels: Arc::new(Mutex::new(0)),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Messages delivered so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of cancel calls observed.
    pub fn cancel_count(&self) -> usize {
        *self
            .cancels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make the next announce call fail.
    pub fn fail_next(&self) {
        *self
            .fail_next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = true;
    }
}

impl Default for CollectorChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnouncementChannel for CollectorChannel {
    fn announce(&mut self, message: &str) -> Result<()> {
        let mut fail = self
            .fail_next
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *fail {
            *fail = false;
            return Err(SafestepError::Speech {
                message: "collector failure".to_string(),
            });
        }
        drop(fail);

        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        *self
            .cancels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
