//! RETIRE_CONNECTION_ID frame: tells the peer a previously issued
//! connection ID, identified by sequence number, is no longer in use.

use bytes::BufMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varint};

/// The RETIRE_CONNECTION_ID frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetireConnectionIdFrame {
    sequence: VarInt,
}

impl RetireConnectionIdFrame {
    /// Builds a RETIRE_CONNECTION_ID frame for the connection ID issued
    /// with `sequence`.
    pub fn new(sequence: VarInt) -> Self {
        Self { sequence }
    }

    /// The sequence number of the connection ID being retired.
    pub fn sequence(&self) -> VarInt {
        self.sequence
    }
}

impl GetFrameType for RetireConnectionIdFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::RetireConnectionId
    }
}

impl EncodeFrame for RetireConnectionIdFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.sequence.encoding_size()
    }

    fn encoding_size(&self) -> usize {
        1 + self.sequence.encoding_size()
    }
}

pub(super) fn be_retire_connection_id_frame(
    input: &[u8],
) -> Result<(&[u8], RetireConnectionIdFrame), Error> {
    let (remain, sequence) = be_varint(input).map_err(|_| Error::ShortBuffer)?;
    Ok((remain, RetireConnectionIdFrame::new(sequence)))
}

pub(super) fn write_retire_connection_id_frame<T: BufMut>(
    buf: &mut T,
    frame: &RetireConnectionIdFrame,
) {
    buf.put_u8(0x19);
    buf.put_varint(&frame.sequence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::io::WriteFrame;

    #[test]
    fn round_trip() {
        let frame = RetireConnectionIdFrame::new(VarInt::from_u32(7));
        let mut buf = bytes::BytesMut::new();
        buf.put_frame(&frame);

        let (remain, parsed) = be_retire_connection_id_frame(&buf[1..]).unwrap();
        assert!(remain.is_empty());
        assert_eq!(parsed, frame);
    }
}
