//! Observable monitor events and their terminal rendering.
//!
//! Verbose mode streams these to stderr; the JSON form is for log capture
//! and scripted consumers.

use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

/// Events emitted by the monitor loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Monitor started polling.
    Started { endpoint: String },
    /// One detection tick was applied.
    Tick {
        seq: u64,
        detected: bool,
        confidence: f32,
    },
    /// An announcement was delivered.
    Announced { message: String },
    /// Detection ended and the announcement state was cleared.
    Cleared,
    /// A recoverable error occurred; polling continues.
    Error { message: String },
    /// Monitor stopped.
    Stopped,
}

impl MonitorEvent {
    /// Serialize event to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Render an event to stderr for verbose output.
pub fn render_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::Started { endpoint } => {
            eprintln!("{} polling {}", "started".green(), endpoint);
        }
        MonitorEvent::Tick {
            seq,
            detected,
            confidence,
        } => {
            if *detected {
                eprintln!(
                    "{}",
                    format!("tick {} detected ({:.2})", seq, confidence).green()
                );
            } else {
                eprintln!("{}", format!("tick {} clear", seq).dimmed());
            }
        }
        MonitorEvent::Announced { message } => {
            eprintln!("{} {}", "announce".green().bold(), message);
        }
        MonitorEvent::Cleared => {
            eprintln!("{}", "cleared".dimmed());
        }
        MonitorEvent::Error { message } => {
            eprintln!("{} {}", "error".red(), message);
        }
        MonitorEvent::Stopped => {
            eprintln!("{}", "stopped".dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_round_trip() {
        let event = MonitorEvent::Tick {
            seq: 7,
            detected: true,
            confidence: 0.85,
        };
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"tick\""));
        assert_eq!(MonitorEvent::from_json(&json).unwrap(), event);
    }

    #[test]
    fn announced_event_tags_snake_case() {
        let event = MonitorEvent::Announced {
            message: "cross now".to_string(),
        };
        let json = event.to_json().unwrap();
        assert!(json.contains("\"type\":\"announced\""));
        assert!(json.contains("cross now"));
    }

    #[test]
    fn unknown_event_type_rejected() {
        let result = MonitorEvent::from_json("{\"type\":\"bogus\"}");
        assert!(result.is_err());
    }

    #[test]
    fn render_does_not_panic() {
        render_event(&MonitorEvent::Started {
            endpoint: "http://localhost:5000".to_string(),
        });
        render_event(&MonitorEvent::Cleared);
        render_event(&MonitorEvent::Stopped);
    }
}
