//! Announcement side: state machine, output channels, and the read-side
//! snapshot projection.

pub mod channel;
pub mod machine;
pub mod projection;

pub use channel::{AnnouncementChannel, CollectorChannel, SpeechChannel, StdoutChannel};
pub use machine::{AnnouncementState, Announcer, Effect, Phase};
pub use projection::{SharedSnapshot, Snapshot};
