//! Chat platform adapters.
//!
//! `LocalPlatform` is an in-process platform: state is seeded by the caller,
//! events are pushed in by hand and outbound messages are recorded. The
//! console runner and the test suites both drive the bot through it.

mod local;

pub use local::{LocalPlatform, OutboundTap};
