//! The window-update announcement queue: decides which streams (plus the
//! connection as a whole) owe the peer a MAX_STREAM_DATA / MAX_DATA frame,
//! and drains that set into frames on demand.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use qbase::frame::{Frame, MaxDataFrame, MaxStreamDataFrame};
use qbase::varint::VarInt;

use super::controller::WindowUpdate;
use crate::recv::RecvStreamGetter;

/// Receives every control frame this queue emits during a drain.
pub trait DeliverFrame {
    fn deliver(&self, frame: Frame);
}

impl<F: Fn(Frame)> DeliverFrame for F {
    fn deliver(&self, frame: Frame) {
        self(frame)
    }
}

struct Inner {
    streams: BTreeSet<u64>,
    queue_conn: bool,
}

/// The window-update queue. A single `Mutex` covers both the stream-id set
/// and the `queue_conn` flag; no other lock is held while invoking the
/// delivery callback or a collaborator.
pub struct WindowUpdateQueue<G, C, D> {
    inner: Mutex<Inner>,
    stream_getter: G,
    conn_flow_ctrl: Arc<C>,
    cb: D,
}

impl<G, C, D> WindowUpdateQueue<G, C, D>
where
    G: RecvStreamGetter,
    C: WindowUpdate,
    D: DeliverFrame,
{
    /// Builds an empty queue bound to its collaborators.
    pub fn new(stream_getter: G, conn_flow_ctrl: Arc<C>, cb: D) -> Self {
        Self {
            inner: Mutex::new(Inner {
                streams: BTreeSet::new(),
                queue_conn: false,
            }),
            stream_getter,
            conn_flow_ctrl,
            cb,
        }
    }

    /// Marks `id` as possibly owing a MAX_STREAM_DATA. Idempotent: calling
    /// this twice for the same id before a drain has no additional effect.
    pub fn add_stream(&self, id: u64) {
        self.inner.lock().unwrap().streams.insert(id);
    }

    /// Marks the connection as possibly owing a MAX_DATA.
    pub fn add_conn(&self) {
        self.inner.lock().unwrap().queue_conn = true;
    }

    /// Drains the queue, emitting a MAX_DATA (if the connection was
    /// flagged) followed by MAX_STREAM_DATA frames in ascending stream-id
    /// order. Streams whose controller reports no pending update (`0`)
    /// are left in the set, to be retried on the next drain.
    pub fn queue_all(&self) {
        let mut inner = self.inner.lock().unwrap();

        let mut emitted_conn = false;
        if inner.queue_conn {
            let bound = self.conn_flow_ctrl.get_wnd_update();
            self.cb.deliver(Frame::MaxData(MaxDataFrame::new(
                VarInt::from_u64(bound).unwrap_or(VarInt::from_u32(0)),
            )));
            inner.queue_conn = false;
            emitted_conn = true;
        }

        // Mirrors the original C's `del` list: ids to remove once the
        // traversal over `streams` completes, so we never mutate the set
        // we're iterating. Unlike a C intrusive list, this `Vec` owns
        // itself outright — there is no second "traversal anchor" list
        // whose release could be confused with this one's.
        let mut to_remove = Vec::new();
        for &id in inner.streams.iter() {
            let Some(stream) = self.stream_getter.get_or_open_recv_stream(id) else {
                continue;
            };
            let offset = stream.get_wnd_update();
            if offset == 0 {
                continue;
            }
            self.cb.deliver(Frame::MaxStreamData(MaxStreamDataFrame::new(
                VarInt::from_u64(id).unwrap_or(VarInt::from_u32(0)),
                VarInt::from_u64(offset).unwrap_or(VarInt::from_u32(0)),
            )));
            to_remove.push(id);
        }

        tracing::trace!(
            emitted_conn,
            stream_updates = to_remove.len(),
            still_pending = inner.streams.len() - to_remove.len(),
            "window-update queue drained"
        );

        for id in to_remove {
            inner.streams.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;

    struct FixedController(u64);

    impl WindowUpdate for FixedController {
        fn get_wnd_update(&self) -> u64 {
            self.0
        }
    }

    // The queue only needs `G::Stream: WindowUpdate`; stubbing it as the
    // pending-update value itself (looked up per id by the getter below)
    // keeps the fixtures small without a real stream map.
    impl WindowUpdate for u64 {
        fn get_wnd_update(&self) -> u64 {
            *self
        }
    }

    fn recorder() -> (impl DeliverFrame, Arc<StdMutex<Vec<Frame>>>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = log.clone();
        (move |frame: Frame| sink.lock().unwrap().push(frame), log)
    }

    #[test]
    fn add_stream_is_idempotent() {
        struct EmptyGetter;
        impl RecvStreamGetter for EmptyGetter {
            type Stream = u64;
            fn get_or_open_recv_stream(&self, _id: u64) -> Option<u64> {
                None
            }
        }
        let (cb, _log) = recorder();
        let queue = WindowUpdateQueue::new(EmptyGetter, Arc::new(FixedController(0)), cb);
        queue.add_stream(4);
        queue.add_stream(4);
        assert_eq!(queue.inner.lock().unwrap().streams.len(), 1);
    }

    #[test]
    fn drain_mixed_readiness_matches_e4() {
        struct Getter {
            // maps stream id -> next get_wnd_update() result
            values: std::collections::HashMap<u64, u64>,
        }
        impl RecvStreamGetter for Getter {
            type Stream = u64;
            fn get_or_open_recv_stream(&self, id: u64) -> Option<u64> {
                self.values.get(&id).copied()
            }
        }

        let mut values = std::collections::HashMap::new();
        values.insert(4, 0);
        values.insert(8, 4096);
        let getter = Getter { values };

        let (cb, log) = recorder();
        let queue = WindowUpdateQueue::new(getter, Arc::new(FixedController(65536)), cb);
        queue.add_stream(4);
        queue.add_stream(8);
        queue.add_conn();

        queue.queue_all();

        let delivered = log.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        match &delivered[0] {
            Frame::MaxData(f) => assert_eq!(f.max_data().into_inner(), 65536),
            _ => panic!("expected MaxData first"),
        }
        match &delivered[1] {
            Frame::MaxStreamData(f) => {
                assert_eq!(f.stream_id().into_inner(), 8);
                assert_eq!(f.max_stream_data().into_inner(), 4096);
            }
            _ => panic!("expected MaxStreamData for stream 8"),
        }

        let remaining = queue.inner.lock().unwrap();
        assert!(remaining.streams.contains(&4));
        assert!(!remaining.streams.contains(&8));
        assert!(!remaining.queue_conn);
    }
}
