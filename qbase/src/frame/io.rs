//! Frame encoding/decoding glue: the generic `put_frame`/`be_frame`
//! entry points `FrameReader` and callers build on.

use bytes::BufMut;

use super::{
    CryptoFrame, Frame, FrameType, MaxDataFrame, MaxStreamDataFrame, NewTokenFrame, PaddingFrame,
    RetireConnectionIdFrame, StreamDataBlockedFrame, be_frame_type,
};
use crate::error::Error;

/// Writes a frame of type `T` to a `bytes::BufMut`-backed writer.
pub trait WriteFrame<T> {
    /// Appends the wire encoding of `frame`.
    fn put_frame(&mut self, frame: &T);
}

/// Parses one frame from the front of `input`, dispatching on its leading
/// type tag. Returns the number of bytes consumed along with the parsed
/// [`Frame`] and its [`FrameType`].
pub fn be_frame(input: &[u8]) -> Result<(usize, Frame, FrameType), Error> {
    let origin_len = input.len();
    let (remain, frame_type) = be_frame_type(input).map_err(|_| Error::ShortBuffer)?;

    let parsed = match frame_type {
        FrameType::Padding => super::padding::be_padding_frame(remain).map(|(r, f)| (r, Frame::Padding(f))),
        FrameType::Crypto => {
            super::crypto::be_crypto_frame(remain).map(|(r, (f, data))| (r, Frame::Crypto(f, data)))
        }
        FrameType::NewToken => {
            super::new_token::be_new_token_frame(remain).map(|(r, f)| (r, Frame::NewToken(f)))
        }
        FrameType::MaxData => {
            super::max_data::be_max_data_frame(remain).map(|(r, f)| (r, Frame::MaxData(f)))
        }
        FrameType::MaxStreamData => super::max_stream_data::be_max_stream_data_frame(remain)
            .map(|(r, f)| (r, Frame::MaxStreamData(f))),
        FrameType::StreamDataBlocked => super::stream_data_blocked::be_stream_data_blocked_frame(remain)
            .map(|(r, f)| (r, Frame::StreamDataBlocked(f))),
        FrameType::RetireConnectionId => super::retire_connection_id::be_retire_connection_id_frame(remain)
            .map(|(r, f)| (r, Frame::RetireConnectionId(f))),
    };

    let (remain, frame) = parsed.map_err(|e| {
        tracing::trace!(?frame_type, error = ?e, "failed to parse frame body");
        e
    })?;

    let consumed = origin_len - remain.len();
    Ok((consumed, frame, frame_type))
}

impl<T: BufMut> WriteFrame<PaddingFrame> for T {
    fn put_frame(&mut self, frame: &PaddingFrame) {
        super::padding::write_padding_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<CryptoFrame> for T {
    fn put_frame(&mut self, frame: &CryptoFrame) {
        super::crypto::write_crypto_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<NewTokenFrame> for T {
    fn put_frame(&mut self, frame: &NewTokenFrame) {
        super::new_token::write_new_token_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<MaxDataFrame> for T {
    fn put_frame(&mut self, frame: &MaxDataFrame) {
        super::max_data::write_max_data_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<MaxStreamDataFrame> for T {
    fn put_frame(&mut self, frame: &MaxStreamDataFrame) {
        super::max_stream_data::write_max_stream_data_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<StreamDataBlockedFrame> for T {
    fn put_frame(&mut self, frame: &StreamDataBlockedFrame) {
        super::stream_data_blocked::write_stream_data_blocked_frame(self, frame)
    }
}

impl<T: BufMut> WriteFrame<RetireConnectionIdFrame> for T {
    fn put_frame(&mut self, frame: &RetireConnectionIdFrame) {
        super::retire_connection_id::write_retire_connection_id_frame(self, frame)
    }
}
