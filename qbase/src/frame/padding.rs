//! PADDING frame: a single zero byte, used to pad a packet out to a target
//! size. Implemented as a flyweight zero-sized type — there is nothing to
//! allocate, so there is nothing to free.

use bytes::BufMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;

/// The PADDING frame. A `Copy` unit struct: every instance is identical and
/// owns nothing, so the "one static singleton, never freed" property falls
/// out of being a zero-sized type rather than out of a manually managed
/// static.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct PaddingFrame;

impl GetFrameType for PaddingFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Padding
    }
}

impl EncodeFrame for PaddingFrame {
    fn max_encoding_size(&self) -> usize {
        1
    }

    fn encoding_size(&self) -> usize {
        1
    }
}

pub(super) fn be_padding_frame(input: &[u8]) -> Result<(&[u8], PaddingFrame), Error> {
    Ok((input, PaddingFrame))
}

pub(super) fn write_padding_frame<T: BufMut>(buf: &mut T, _frame: &PaddingFrame) {
    buf.put_u8(0x00);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::io::WriteFrame;

    #[test]
    fn round_trip() {
        let mut buf = bytes::BytesMut::new();
        buf.put_frame(&PaddingFrame);
        assert_eq!(&buf[..], &[0x00]);

        let (remain, frame) = be_padding_frame(&buf[1..]).unwrap();
        assert!(remain.is_empty());
        assert_eq!(frame, PaddingFrame);
        assert_eq!(frame.encoding_size(), 1);
    }
}
