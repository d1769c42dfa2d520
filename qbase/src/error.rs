//! Errors produced while parsing or encoding the wire formats in this crate.

use crate::varint::VarInt;

/// Everything that can go wrong decoding or encoding a frame or packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Not enough bytes remained in the input to complete a parse.
    #[error("buffer too short")]
    ShortBuffer,
    /// A frame's declared length field disagreed with the bytes that followed it.
    #[error("frame length overflowed the containing packet")]
    FrameOverflow,
    /// A frame type tag did not match any frame type recognized by this crate.
    #[error("unrecognized frame type {0:?}")]
    InvalidType(VarInt),
}

impl<'i> nom::error::ParseError<&'i [u8]> for Error {
    fn from_error_kind(_input: &'i [u8], _kind: nom::error::ErrorKind) -> Self {
        Error::ShortBuffer
    }

    fn append(_input: &'i [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}
