//! Receive-stream lookup: the stream map a connection consults to resolve
//! a stream id to the object carrying that stream's receive-side flow
//! control, on the inbound path (STREAM frames) and from the window-update
//! queue's drain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::flowcontrol::{StreamFlowController, WindowUpdate};

/// Default initial receive window offered to every newly opened stream,
/// matching [`crate::flowcontrol::ConnFlowController`]'s typical sizing.
pub const DEFAULT_STREAM_RECEIVE_WINDOW: u64 = 1 << 20;

/// The receive-side state of a single stream this endpoint is receiving
/// data on: for the scope of this crate, just its flow controller. A full
/// stack would also hang the reassembly buffer and stream state machine
/// off this type; those are out of scope here (see `qrecovery::recv`'s
/// entry in SPEC_FULL.md).
#[derive(Debug)]
pub struct RecvStream {
    flow_ctrl: StreamFlowController,
}

impl RecvStream {
    fn new(max_receive_window: u64) -> Self {
        Self {
            flow_ctrl: StreamFlowController::new(max_receive_window),
        }
    }

    /// This stream's receive-side flow controller.
    pub fn flow_ctrl(&self) -> &StreamFlowController {
        &self.flow_ctrl
    }
}

impl WindowUpdate for RecvStream {
    fn get_wnd_update(&self) -> u64 {
        self.flow_ctrl.get_wnd_update()
    }
}

/// Looks up, opening lazily, the receive stream for a given id.
///
/// Kept as a narrow trait (rather than requiring a concrete `StreamMap`)
/// so [`crate::flowcontrol::WindowUpdateQueue`] does not need to know how
/// its caller represents streams.
pub trait RecvStreamGetter {
    /// The per-stream handle returned for an open stream.
    type Stream: WindowUpdate;

    /// Looks up (opening if necessary) the receive stream for `id`.
    fn get_or_open_recv_stream(&self, id: u64) -> Option<Self::Stream>;
}

/// A connection's table of open receive streams, keyed by stream id.
///
/// Every lookup opens the stream lazily if it does not already exist —
/// this crate does not track stream concurrency limits or id parity
/// (bidirectional vs. unidirectional, client- vs. server-initiated), both
/// out of scope here; a real endpoint layers those checks in front of
/// `open`.
pub struct StreamMap {
    streams: Mutex<HashMap<u64, Arc<RecvStream>>>,
    max_receive_window: u64,
}

impl StreamMap {
    /// Builds an empty stream map; every stream it opens is given an
    /// initial receive window of `max_receive_window` bytes.
    pub fn new(max_receive_window: u64) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            max_receive_window,
        }
    }

    /// Looks up the receive stream for `id`, opening a fresh one (with a
    /// full receive window) if this is the first reference to it.
    pub fn open(&self, id: u64) -> Arc<RecvStream> {
        self.streams
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(|| Arc::new(RecvStream::new(self.max_receive_window)))
            .clone()
    }

    /// Removes a stream from the map, e.g. once it has been fully consumed
    /// and acknowledged. Returns the removed stream, if it was present.
    pub fn remove(&self, id: u64) -> Option<Arc<RecvStream>> {
        self.streams.lock().unwrap().remove(&id)
    }

    /// Number of streams currently tracked.
    pub fn len(&self) -> usize {
        self.streams.lock().unwrap().len()
    }

    /// Whether the map currently tracks no streams.
    pub fn is_empty(&self) -> bool {
        self.streams.lock().unwrap().is_empty()
    }
}

impl RecvStreamGetter for StreamMap {
    type Stream = Arc<RecvStream>;

    fn get_or_open_recv_stream(&self, id: u64) -> Option<Arc<RecvStream>> {
        Some(self.open(id))
    }
}
