//! Stream and flow-control plane of the QUIC transport engine.
//!
//! Per-stream and per-connection receive credit accounting
//! ([`flowcontrol`]), the window-update announcement queue that decides
//! when to emit MAX_DATA / MAX_STREAM_DATA frames, the stream map used to
//! resolve a stream id to its receive-side state ([`recv`]), and the
//! stream sender abstraction a stream uses to talk back to its connection
//! ([`send`]).

pub mod error;
pub mod flowcontrol;
pub mod recv;
pub mod send;
