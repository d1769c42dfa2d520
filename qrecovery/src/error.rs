//! Errors produced by the stream and flow-control plane.

/// Everything that can go wrong in this crate's upward-facing callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An upward callback (`queue_ctrl_frame`, `on_has_stream_data`,
    /// `on_stream_completed`) refused the frame or event it was handed.
    #[error("stream sender callback failed")]
    CallbackFailed,
}
