//! MAX_DATA frame: advertises the connection-level flow-control limit.

use bytes::BufMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varint};

/// The MAX_DATA frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MaxDataFrame {
    max_data: VarInt,
}

impl MaxDataFrame {
    /// Builds a MAX_DATA frame advertising a connection-level limit of
    /// `max_data` bytes.
    pub fn new(max_data: VarInt) -> Self {
        Self { max_data }
    }

    /// The advertised connection-level limit.
    pub fn max_data(&self) -> VarInt {
        self.max_data
    }
}

impl GetFrameType for MaxDataFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::MaxData
    }
}

impl EncodeFrame for MaxDataFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.max_data.encoding_size()
    }

    fn encoding_size(&self) -> usize {
        1 + self.max_data.encoding_size()
    }
}

pub(super) fn be_max_data_frame(input: &[u8]) -> Result<(&[u8], MaxDataFrame), Error> {
    let (remain, max_data) = be_varint(input).map_err(|_| Error::ShortBuffer)?;
    Ok((remain, MaxDataFrame::new(max_data)))
}

pub(super) fn write_max_data_frame<T: BufMut>(buf: &mut T, frame: &MaxDataFrame) {
    buf.put_u8(0x10);
    buf.put_varint(&frame.max_data);
}
