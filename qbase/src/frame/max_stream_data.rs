//! MAX_STREAM_DATA frame: advertises a per-stream flow-control limit.

use bytes::BufMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varints};

/// The MAX_STREAM_DATA frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MaxStreamDataFrame {
    stream_id: VarInt,
    max_stream_data: VarInt,
}

impl MaxStreamDataFrame {
    /// Builds a MAX_STREAM_DATA frame advertising a limit of
    /// `max_stream_data` bytes on `stream_id`.
    pub fn new(stream_id: VarInt, max_stream_data: VarInt) -> Self {
        Self {
            stream_id,
            max_stream_data,
        }
    }

    /// The stream this update applies to.
    pub fn stream_id(&self) -> VarInt {
        self.stream_id
    }

    /// The advertised per-stream limit.
    pub fn max_stream_data(&self) -> VarInt {
        self.max_stream_data
    }
}

impl GetFrameType for MaxStreamDataFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::MaxStreamData
    }
}

impl EncodeFrame for MaxStreamDataFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.stream_id.encoding_size() + self.max_stream_data.encoding_size()
    }

    fn encoding_size(&self) -> usize {
        1 + self.stream_id.encoding_size() + self.max_stream_data.encoding_size()
    }
}

pub(super) fn be_max_stream_data_frame(
    input: &[u8],
) -> Result<(&[u8], MaxStreamDataFrame), Error> {
    let (remain, [stream_id, max_stream_data]) =
        be_varints(input).map_err(|_| Error::ShortBuffer)?;
    Ok((remain, MaxStreamDataFrame::new(stream_id, max_stream_data)))
}

pub(super) fn write_max_stream_data_frame<T: BufMut>(buf: &mut T, frame: &MaxStreamDataFrame) {
    buf.put_u8(0x11);
    buf.put_varint(&frame.stream_id);
    buf.put_varint(&frame.max_stream_data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::io::WriteFrame;

    #[test]
    fn round_trip() {
        let frame = MaxStreamDataFrame::new(VarInt::from_u32(8), VarInt::from_u32(4096));
        let mut buf = bytes::BytesMut::new();
        buf.put_frame(&frame);

        let (remain, parsed) = be_max_stream_data_frame(&buf[1..]).unwrap();
        assert!(remain.is_empty());
        assert_eq!(parsed, frame);
    }
}
