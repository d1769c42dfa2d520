//! STREAM_DATA_BLOCKED frame: tells the peer the sender has data to write
//! on a stream but is blocked by that stream's flow-control limit.

use bytes::BufMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varints};

/// The STREAM_DATA_BLOCKED frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct StreamDataBlockedFrame {
    stream_id: VarInt,
    limit: VarInt,
}

impl StreamDataBlockedFrame {
    /// Builds a STREAM_DATA_BLOCKED frame reporting `stream_id` blocked at
    /// `limit` bytes.
    pub fn new(stream_id: VarInt, limit: VarInt) -> Self {
        Self { stream_id, limit }
    }

    /// The blocked stream's id.
    pub fn stream_id(&self) -> VarInt {
        self.stream_id
    }

    /// The stream flow-control limit the sender is blocked on.
    pub fn limit(&self) -> VarInt {
        self.limit
    }
}

impl GetFrameType for StreamDataBlockedFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::StreamDataBlocked
    }
}

impl EncodeFrame for StreamDataBlockedFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.stream_id.encoding_size() + self.limit.encoding_size()
    }

    fn encoding_size(&self) -> usize {
        1 + self.stream_id.encoding_size() + self.limit.encoding_size()
    }
}

pub(super) fn be_stream_data_blocked_frame(
    input: &[u8],
) -> Result<(&[u8], StreamDataBlockedFrame), Error> {
    let (remain, [stream_id, limit]) = be_varints(input).map_err(|_| Error::ShortBuffer)?;
    Ok((remain, StreamDataBlockedFrame::new(stream_id, limit)))
}

pub(super) fn write_stream_data_blocked_frame<T: BufMut>(
    buf: &mut T,
    frame: &StreamDataBlockedFrame,
) {
    buf.put_u8(0x15);
    buf.put_varint(&frame.stream_id);
    buf.put_varint(&frame.limit);
}
