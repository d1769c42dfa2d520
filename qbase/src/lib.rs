//! Wire codec core of the QUIC transport engine.
//!
//! This crate implements the parts of the QUIC wire format that do not
//! depend on any particular connection's live state: variable-length
//! integers, the frame codec, and packet header machinery (including the
//! zero-copy connection-ID demultiplex probe run before a datagram is
//! associated with a connection).

pub mod cid;
pub mod error;
pub mod frame;
pub mod packet;
pub mod varint;
