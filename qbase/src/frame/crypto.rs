//! CRYPTO frame: carries a contiguous slice of the TLS handshake byte
//! stream at a given offset.

use bytes::{BufMut, Bytes};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varint};

/// The CRYPTO frame header: offset and length of the handshake data that
/// follows it. The payload bytes themselves are carried alongside this
/// struct in [`super::Frame::Crypto`], not inside it — deserialization
/// allocates owned storage for the payload (a `Bytes` slice sharing the
/// packet's backing buffer) and `Drop` releases it automatically.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CryptoFrame {
    offset: VarInt,
    length: VarInt,
}

impl CryptoFrame {
    /// Builds a CRYPTO frame header for `length` bytes of handshake data
    /// starting at `offset` in the handshake byte stream.
    pub fn new(offset: VarInt, length: VarInt) -> Self {
        Self { offset, length }
    }

    /// Offset into the handshake byte stream this frame's data begins at.
    pub fn offset(&self) -> VarInt {
        self.offset
    }

    /// Number of data bytes carried alongside this frame.
    pub fn length(&self) -> VarInt {
        self.length
    }
}

impl GetFrameType for CryptoFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::Crypto
    }
}

impl EncodeFrame for CryptoFrame {
    fn max_encoding_size(&self) -> usize {
        1 + self.offset.encoding_size() + self.length.encoding_size()
    }

    fn encoding_size(&self) -> usize {
        1 + self.offset.encoding_size() + self.length.encoding_size()
    }
}

pub(super) fn be_crypto_frame(input: &[u8]) -> Result<(&[u8], (CryptoFrame, Bytes)), Error> {
    let (remain, offset) = be_varint(input).map_err(|_| Error::ShortBuffer)?;
    let (remain, length) = be_varint(remain).map_err(|_| Error::ShortBuffer)?;
    let len = length.into_inner() as usize;
    if remain.len() < len {
        return Err(Error::FrameOverflow);
    }
    let data = Bytes::copy_from_slice(&remain[..len]);
    Ok((&remain[len..], (CryptoFrame::new(offset, length), data)))
}

pub(super) fn write_crypto_frame<T: BufMut>(buf: &mut T, frame: &CryptoFrame) {
    buf.put_u8(0x06);
    buf.put_varint(&frame.offset);
    buf.put_varint(&frame.length);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::io::WriteFrame;

    #[test]
    fn round_trip_matches_spec_example() {
        // off=0x1234, len=3, data=[0x41,0x42,0x43] -> 06 52 34 03 41 42 43
        let frame = CryptoFrame::new(VarInt::from_u32(0x1234), VarInt::from_u32(3));
        let data = Bytes::from_static(&[0x41, 0x42, 0x43]);

        let mut buf = bytes::BytesMut::new();
        buf.put_frame(&frame);
        buf.put_slice(&data);
        assert_eq!(&buf[..], &[0x06, 0x52, 0x34, 0x03, 0x41, 0x42, 0x43]);

        let (remain, (parsed, parsed_data)) = be_crypto_frame(&buf[1..]).unwrap();
        assert!(remain.is_empty());
        assert_eq!(parsed.offset().into_inner(), 0x1234);
        assert_eq!(parsed.length().into_inner(), 3);
        assert_eq!(parsed_data, data);
    }

    #[test]
    fn short_buffer_when_declared_length_exceeds_input() {
        let mut buf = bytes::BytesMut::new();
        buf.put_varint(&VarInt::from_u32(0));
        buf.put_varint(&VarInt::from_u32(10));
        buf.put_slice(&[0x01, 0x02]);
        assert_eq!(be_crypto_frame(&buf), Err(Error::FrameOverflow));
    }
}
