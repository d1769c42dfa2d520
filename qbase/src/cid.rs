//! Connection IDs: the opaque, variable-length identifiers QUIC endpoints
//! use to route packets to the right connection independent of the
//! network-layer 4-tuple.

/// The largest connection ID QUIC allows, in bytes.
pub const MAX_CID_SIZE: usize = 20;

/// An owned QUIC connection ID: 0 to 20 bytes, stored inline.
///
/// Packet headers carry connection IDs by value, so an inline buffer avoids
/// an allocation per header parsed; [`Deref`] exposes the active bytes as a
/// plain `&[u8]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    len: u8,
    bytes: [u8; MAX_CID_SIZE],
}

impl std::ops::Deref for ConnectionId {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl ConnectionId {
    /// Builds a connection ID from a byte slice.
    ///
    /// Returns `None` if `bytes` is longer than [`MAX_CID_SIZE`].
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_CID_SIZE {
            return None;
        }
        let mut buf = [0u8; MAX_CID_SIZE];
        buf[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            len: bytes.len() as u8,
            bytes: buf,
        })
    }

    /// The zero-length connection ID, valid on its own as a short-header CID
    /// when both peers have agreed to omit connection IDs.
    pub fn empty() -> Self {
        Self {
            len: 0,
            bytes: [0u8; MAX_CID_SIZE],
        }
    }

    /// Length of this connection ID in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether this connection ID is the empty (zero-length) one.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows this connection ID's bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl std::fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId(")?;
        for byte in self.as_slice() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl From<&[u8]> for ConnectionId {
    fn from(bytes: &[u8]) -> Self {
        // Callers that hand us an over-long slice have already broken the
        // wire contract; keep construction infallible here and truncate.
        Self::from_slice(&bytes[..bytes.len().min(MAX_CID_SIZE)]).expect("truncated to fit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_slice() {
        let cid = ConnectionId::from_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(&*cid, &[1, 2, 3, 4]);
        assert_eq!(cid.len(), 4);
    }

    #[test]
    fn rejects_oversized_slice() {
        let bytes = [0u8; MAX_CID_SIZE + 1];
        assert!(ConnectionId::from_slice(&bytes).is_none());
    }

    #[test]
    fn empty_is_zero_length() {
        let cid = ConnectionId::empty();
        assert!(cid.is_empty());
        assert_eq!(cid.len(), 0);
    }
}
