//! Per-stream and per-connection flow-control credit accounting.
//!
//! Both variants share the same contract: track how much data has been
//! read, how much has been received, and derive a *window update offset* —
//! the next absolute limit to advertise via MAX_STREAM_DATA / MAX_DATA.
//! `0` is the sentinel for "no update needed".

use std::cell::Cell;

/// Implemented by both [`StreamFlowController`] and [`ConnFlowController`].
/// `&self` is sufficient because advertising a window update only ever
/// raises the internally cached `receive_window` limit, a monotonic,
/// idempotent bookkeeping step rather than state a caller needs `&mut`
/// access to coordinate.
pub trait WindowUpdate {
    /// Returns the next absolute offset to advertise, or `0` if no update
    /// is pending yet.
    fn get_wnd_update(&self) -> u64;
}

impl<T: WindowUpdate + ?Sized> WindowUpdate for std::sync::Arc<T> {
    fn get_wnd_update(&self) -> u64 {
        (**self).get_wnd_update()
    }
}

/// A window is re-advertised once the unconsumed credit drops to half of
/// the configured window size. Matches the auto-tuning threshold real QUIC
/// stacks use to avoid advertising on every single read.
fn is_pending(bytes_read: u64, receive_window: u64, max_receive_window: u64) -> bool {
    receive_window - bytes_read <= max_receive_window / 2
}

/// Per-stream receive-side flow control state.
#[derive(Debug)]
pub struct StreamFlowController {
    bytes_read: Cell<u64>,
    highest_received: Cell<u64>,
    receive_window: Cell<u64>,
    max_receive_window: u64,
}

impl StreamFlowController {
    /// Creates a controller with an initial advertised window of
    /// `max_receive_window` bytes.
    pub fn new(max_receive_window: u64) -> Self {
        Self {
            bytes_read: Cell::new(0),
            highest_received: Cell::new(0),
            receive_window: Cell::new(max_receive_window),
            max_receive_window,
        }
    }

    /// Records that the application has consumed `n` more bytes.
    pub fn on_data_read(&self, n: u64) {
        self.bytes_read.set(self.bytes_read.get() + n);
    }

    /// Records that the peer has sent data up to `end_offset`.
    pub fn on_data_received(&self, end_offset: u64) {
        if end_offset > self.highest_received.get() {
            self.highest_received.set(end_offset);
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.get()
    }

    pub fn highest_received(&self) -> u64 {
        self.highest_received.get()
    }

    pub fn receive_window(&self) -> u64 {
        self.receive_window.get()
    }

    pub fn max_receive_window(&self) -> u64 {
        self.max_receive_window
    }
}

impl WindowUpdate for StreamFlowController {
    fn get_wnd_update(&self) -> u64 {
        let bytes_read = self.bytes_read.get();
        let receive_window = self.receive_window.get();
        if !is_pending(bytes_read, receive_window, self.max_receive_window) {
            return 0;
        }
        let new_limit = bytes_read + self.max_receive_window;
        self.receive_window.set(new_limit);
        new_limit
    }
}

/// Connection-level receive-side flow control state. Identical contract to
/// [`StreamFlowController`]; kept as a distinct type since the two are
/// never interchangeable at a call site (one speaks MAX_DATA, the other
/// MAX_STREAM_DATA).
#[derive(Debug)]
pub struct ConnFlowController {
    bytes_read: Cell<u64>,
    highest_received: Cell<u64>,
    receive_window: Cell<u64>,
    max_receive_window: u64,
}

impl ConnFlowController {
    pub fn new(max_receive_window: u64) -> Self {
        Self {
            bytes_read: Cell::new(0),
            highest_received: Cell::new(0),
            receive_window: Cell::new(max_receive_window),
            max_receive_window,
        }
    }

    pub fn on_data_read(&self, n: u64) {
        self.bytes_read.set(self.bytes_read.get() + n);
    }

    pub fn on_data_received(&self, end_offset: u64) {
        if end_offset > self.highest_received.get() {
            self.highest_received.set(end_offset);
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.get()
    }

    pub fn highest_received(&self) -> u64 {
        self.highest_received.get()
    }

    pub fn receive_window(&self) -> u64 {
        self.receive_window.get()
    }

    pub fn max_receive_window(&self) -> u64 {
        self.max_receive_window
    }
}

impl WindowUpdate for ConnFlowController {
    fn get_wnd_update(&self) -> u64 {
        let bytes_read = self.bytes_read.get();
        let receive_window = self.receive_window.get();
        if !is_pending(bytes_read, receive_window, self.max_receive_window) {
            return 0;
        }
        let new_limit = bytes_read + self.max_receive_window;
        self.receive_window.set(new_limit);
        new_limit
    }
}
