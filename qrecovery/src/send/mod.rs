//! The stream sender: the downward-facing capability set a connection
//! exposes so a stream can queue control frames and announce
//! readiness/completion edges upward.

mod sender;

pub use sender::{StreamSender, UniStreamSender};
