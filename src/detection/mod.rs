//! Detection service integration.
//!
//! A client issues one independent request per poll tick; the poller owns
//! the repeating timer and stamps each outcome with a monotonic tick
//! sequence before handing it to the announcement state machine.

pub mod client;
pub mod poller;
pub mod types;

pub use client::{DetectionClient, HttpDetectionClient, ScriptedClient, ScriptedReply};
pub use poller::{Poller, PollerHandle, TickOutcome};
pub use types::{Detection, DetectionResult};
