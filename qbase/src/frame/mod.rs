//! Frame codec: the polymorphic wire record format carried inside every
//! QUIC packet payload, scoped to the seven frame types this crate's
//! transport plane needs — PADDING, CRYPTO, NEW_TOKEN,
//! RETIRE_CONNECTION_ID, STREAM_DATA_BLOCKED, MAX_DATA, MAX_STREAM_DATA.
//!
//! The full RFC 9000 frame catalog (ACK, STREAM, RESET_STREAM,
//! MAX_STREAMS, PATH_CHALLENGE/RESPONSE, CONNECTION_CLOSE,
//! HANDSHAKE_DONE, DATAGRAM, …) belongs to loss recovery, stream data
//! transfer, path validation and connection teardown, none of which this
//! crate implements.

use std::fmt::Debug;

use bytes::{Buf, BufMut, Bytes};
use derive_more::{Deref, DerefMut};
use io::WriteFrame;

use crate::error::Error;
use crate::varint::VarInt;

mod crypto;
mod max_data;
mod max_stream_data;
mod new_token;
mod padding;
mod retire_connection_id;
mod stream_data_blocked;

/// IO module for frame encoding and decoding
pub mod io;

pub use crypto::CryptoFrame;
pub use max_data::MaxDataFrame;
pub use max_stream_data::MaxStreamDataFrame;
pub use new_token::NewTokenFrame;
pub use padding::PaddingFrame;
pub use retire_connection_id::RetireConnectionIdFrame;
pub use stream_data_blocked::StreamDataBlockedFrame;

/// Defines the basic behaviors for all kinds of frames.
pub trait GetFrameType: Debug {
    /// Returns the type of frame.
    fn frame_type(&self) -> FrameType;
}

pub trait EncodeFrame {
    /// Returns the max number of bytes needed to encode this value.
    fn max_encoding_size(&self) -> usize {
        1
    }

    /// Returns the exact number of bytes needed to encode this value.
    fn encoding_size(&self) -> usize {
        1
    }
}

/// The wire type tag of a frame this crate knows how to codec.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FrameType {
    /// PADDING frame, see [`PaddingFrame`].
    Padding,
    /// CRYPTO frame, see [`CryptoFrame`].
    Crypto,
    /// NEW_TOKEN frame, see [`NewTokenFrame`].
    NewToken,
    /// MAX_DATA frame, see [`MaxDataFrame`].
    MaxData,
    /// MAX_STREAM_DATA frame, see [`MaxStreamDataFrame`].
    MaxStreamData,
    /// STREAM_DATA_BLOCKED frame, see [`StreamDataBlockedFrame`].
    StreamDataBlocked,
    /// RETIRE_CONNECTION_ID frame, see [`RetireConnectionIdFrame`].
    RetireConnectionId,
}

impl TryFrom<VarInt> for FrameType {
    type Error = Error;

    fn try_from(frame_type: VarInt) -> Result<Self, Self::Error> {
        Ok(match frame_type.into_inner() {
            0x00 => FrameType::Padding,
            0x06 => FrameType::Crypto,
            0x07 => FrameType::NewToken,
            0x10 => FrameType::MaxData,
            0x11 => FrameType::MaxStreamData,
            0x15 => FrameType::StreamDataBlocked,
            0x19 => FrameType::RetireConnectionId,
            _ => return Err(Self::Error::InvalidType(frame_type)),
        })
    }
}

impl From<FrameType> for VarInt {
    fn from(frame_type: FrameType) -> Self {
        match frame_type {
            FrameType::Padding => VarInt::from_u32(0x00),
            FrameType::Crypto => VarInt::from_u32(0x06),
            FrameType::NewToken => VarInt::from_u32(0x07),
            FrameType::MaxData => VarInt::from_u32(0x10),
            FrameType::MaxStreamData => VarInt::from_u32(0x11),
            FrameType::StreamDataBlocked => VarInt::from_u32(0x15),
            FrameType::RetireConnectionId => VarInt::from_u32(0x19),
        }
    }
}

/// Parses the frame type from the input buffer,
/// [nom](https://docs.rs/nom/latest/nom/) parser style.
pub fn be_frame_type(input: &[u8]) -> nom::IResult<&[u8], FrameType, Error> {
    let (remain, frame_type) =
        crate::varint::be_varint(input).map_err(|_| nom::Err::Error(Error::ShortBuffer))?;
    let frame_type = FrameType::try_from(frame_type).map_err(nom::Err::Error)?;
    Ok((remain, frame_type))
}

/// Sum type of every frame this crate codecs.
///
/// Variable-length payloads own their bytes directly (`Bytes`); there is no
/// manual `init`/`dtor` pair, `Drop` runs automatically.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Frame {
    /// PADDING frame, see [`PaddingFrame`].
    Padding(PaddingFrame),
    /// CRYPTO frame and its data, see [`CryptoFrame`].
    Crypto(CryptoFrame, Bytes),
    /// NEW_TOKEN frame, see [`NewTokenFrame`].
    NewToken(NewTokenFrame),
    /// MAX_DATA frame, see [`MaxDataFrame`].
    MaxData(MaxDataFrame),
    /// MAX_STREAM_DATA frame, see [`MaxStreamDataFrame`].
    MaxStreamData(MaxStreamDataFrame),
    /// STREAM_DATA_BLOCKED frame, see [`StreamDataBlockedFrame`].
    StreamDataBlocked(StreamDataBlockedFrame),
    /// RETIRE_CONNECTION_ID frame, see [`RetireConnectionIdFrame`].
    RetireConnectionId(RetireConnectionIdFrame),
}

// `Crypto` carries its payload alongside the frame rather than inside
// it, so a generic derive can't produce these impls; hand-rolled instead.
impl GetFrameType for Frame {
    fn frame_type(&self) -> FrameType {
        match self {
            Frame::Padding(f) => f.frame_type(),
            Frame::Crypto(f, _) => f.frame_type(),
            Frame::NewToken(f) => f.frame_type(),
            Frame::MaxData(f) => f.frame_type(),
            Frame::MaxStreamData(f) => f.frame_type(),
            Frame::StreamDataBlocked(f) => f.frame_type(),
            Frame::RetireConnectionId(f) => f.frame_type(),
        }
    }
}

impl EncodeFrame for Frame {
    fn max_encoding_size(&self) -> usize {
        match self {
            Frame::Padding(f) => f.max_encoding_size(),
            Frame::Crypto(f, data) => f.max_encoding_size() + data.len(),
            Frame::NewToken(f) => f.max_encoding_size(),
            Frame::MaxData(f) => f.max_encoding_size(),
            Frame::MaxStreamData(f) => f.max_encoding_size(),
            Frame::StreamDataBlocked(f) => f.max_encoding_size(),
            Frame::RetireConnectionId(f) => f.max_encoding_size(),
        }
    }

    fn encoding_size(&self) -> usize {
        match self {
            Frame::Padding(f) => f.encoding_size(),
            Frame::Crypto(f, data) => f.encoding_size() + data.len(),
            Frame::NewToken(f) => f.encoding_size(),
            Frame::MaxData(f) => f.encoding_size(),
            Frame::MaxStreamData(f) => f.encoding_size(),
            Frame::StreamDataBlocked(f) => f.encoding_size(),
            Frame::RetireConnectionId(f) => f.encoding_size(),
        }
    }
}

/// Reads frames from a buffer until it is exhausted.
#[derive(Deref, DerefMut)]
pub struct FrameReader {
    #[deref]
    #[deref_mut]
    payload: Bytes,
}

impl FrameReader {
    /// Creates a [`FrameReader`] over `payload`.
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }
}

impl Iterator for FrameReader {
    type Item = Result<(Frame, FrameType), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.payload.is_empty() {
            return None;
        }

        match io::be_frame(&self.payload) {
            Ok((consumed, frame, frame_type)) => {
                self.payload.advance(consumed);
                Some(Ok((frame, frame_type)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl<T: BufMut> WriteFrame<Frame> for T {
    fn put_frame(&mut self, frame: &Frame) {
        match frame {
            Frame::Padding(f) => self.put_frame(f),
            Frame::Crypto(f, data) => {
                self.put_frame(f);
                self.put_slice(data);
            }
            Frame::NewToken(f) => self.put_frame(f),
            Frame::MaxData(f) => self.put_frame(f),
            Frame::MaxStreamData(f) => self.put_frame(f),
            Frame::StreamDataBlocked(f) => self.put_frame(f),
            Frame::RetireConnectionId(f) => self.put_frame(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::WriteVarInt;

    #[test]
    fn test_frame_type_conversion() {
        let frame_types = [
            FrameType::Padding,
            FrameType::Crypto,
            FrameType::NewToken,
            FrameType::MaxData,
            FrameType::MaxStreamData,
            FrameType::StreamDataBlocked,
            FrameType::RetireConnectionId,
        ];

        for frame_type in frame_types {
            let byte: VarInt = frame_type.into();
            assert_eq!(FrameType::try_from(byte).unwrap(), frame_type);
        }
    }

    #[test]
    fn test_invalid_frame_type() {
        assert!(FrameType::try_from(VarInt::from_u32(0xff)).is_err());
    }

    #[test]
    fn test_frame_reader_padding_then_max_data() {
        let mut buf = bytes::BytesMut::new();
        buf.put_frame(&PaddingFrame);
        buf.put_frame(&MaxDataFrame::new(VarInt::from_u32(65536)));

        let mut reader = FrameReader::new(buf.freeze());

        let (frame, frame_type) = reader.next().unwrap().unwrap();
        assert!(matches!(frame, Frame::Padding(_)));
        assert_eq!(frame_type, FrameType::Padding);

        let (frame, frame_type) = reader.next().unwrap().unwrap();
        assert_eq!(frame_type, FrameType::MaxData);
        match frame {
            Frame::MaxData(f) => assert_eq!(f.max_data().into_inner(), 65536),
            _ => panic!("expected MaxData"),
        }

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_frame_reader_unknown_tag_errors() {
        let mut buf = bytes::BytesMut::new();
        buf.put_varint(&VarInt::from_u32(0xff));
        let mut reader = FrameReader::new(buf.freeze());
        assert!(matches!(reader.next(), Some(Err(Error::InvalidType(_)))));
    }
}
