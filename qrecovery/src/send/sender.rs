//! Stream sender: the downward-facing capability set a connection exposes
//! so a stream can queue control frames and announce readiness/completion
//! edges, without that stream knowing who it's talking to.

use qbase::frame::Frame;

use crate::error::Error;

/// The base sender contract. A stream holds one of these (typically
/// `Box<dyn StreamSender>`) rather than a concrete connection type.
pub trait StreamSender {
    /// Queues a control frame for transmission.
    fn queue_ctrl_frame(&self, frame: Frame);

    /// Signals that `stream_id` has data ready to send.
    fn on_has_stream_data(&self, stream_id: u64);

    /// Signals that `stream_id` has completed (all data sent and acked, or
    /// reset). Propagates any failure from the upward callback.
    fn on_stream_completed(&self, stream_id: u64) -> Result<(), Error>;
}

/// Wraps a base [`StreamSender`] and overrides `on_stream_completed` to
/// ignore the stream id and invoke a zero-argument callback instead —
/// modeling a uni-directional stream's sender, which learns of completion
/// without caring which id it was.
pub struct UniStreamSender<S> {
    base: S,
    on_completed: Box<dyn Fn() -> Result<(), Error> + Send + Sync>,
}

impl<S: StreamSender> UniStreamSender<S> {
    /// Builds a uni-directional sender prototyped from `base`, substituting
    /// `on_completed` for the base's `on_stream_completed`.
    pub fn new(base: S, on_completed: impl Fn() -> Result<(), Error> + Send + Sync + 'static) -> Self {
        Self {
            base,
            on_completed: Box::new(on_completed),
        }
    }
}

impl<S: StreamSender> StreamSender for UniStreamSender<S> {
    fn queue_ctrl_frame(&self, frame: Frame) {
        self.base.queue_ctrl_frame(frame)
    }

    fn on_has_stream_data(&self, stream_id: u64) {
        self.base.on_has_stream_data(stream_id)
    }

    fn on_stream_completed(&self, _stream_id: u64) -> Result<(), Error> {
        (self.on_completed)().map_err(|_| Error::CallbackFailed)
    }
}
