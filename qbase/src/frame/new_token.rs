//! NEW_TOKEN frame: delivers an address-validation token the client can
//! present on a future connection to skip a retry round trip.

use bytes::{BufMut, Bytes};

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::error::Error;
use crate::varint::{VarInt, WriteVarInt, be_varint};

/// The NEW_TOKEN frame. Owns its token bytes directly; dropping the frame
/// releases them exactly once.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTokenFrame {
    token: Bytes,
}

impl NewTokenFrame {
    /// Builds a NEW_TOKEN frame carrying `token`.
    pub fn new(token: Bytes) -> Self {
        Self { token }
    }

    /// The address-validation token.
    pub fn token(&self) -> &Bytes {
        &self.token
    }
}

impl GetFrameType for NewTokenFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::NewToken
    }
}

impl EncodeFrame for NewTokenFrame {
    fn max_encoding_size(&self) -> usize {
        1 + VarInt::from_u64(self.token.len() as u64)
            .map(|v| v.encoding_size())
            .unwrap_or(8)
            + self.token.len()
    }

    fn encoding_size(&self) -> usize {
        self.max_encoding_size()
    }
}

pub(super) fn be_new_token_frame(input: &[u8]) -> Result<(&[u8], NewTokenFrame), Error> {
    let (remain, len) = be_varint(input).map_err(|_| Error::ShortBuffer)?;
    let len = len.into_inner() as usize;
    if remain.len() < len {
        return Err(Error::FrameOverflow);
    }
    let token = Bytes::copy_from_slice(&remain[..len]);
    Ok((&remain[len..], NewTokenFrame::new(token)))
}

pub(super) fn write_new_token_frame<T: BufMut>(buf: &mut T, frame: &NewTokenFrame) {
    buf.put_u8(0x07);
    buf.put_varint(&VarInt::from_u64(frame.token.len() as u64).expect("token fits in a varint"));
    buf.put_slice(&frame.token);
}
