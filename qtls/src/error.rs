//! Errors produced by the TLS record-layer half-connection and the client
//! session resumption loader.

/// Everything that can go wrong protecting or unprotecting a TLS record,
/// or loading a cached client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Decryption's authentication check (AEAD tag or STREAM-suite MAC)
    /// failed. Fatal to the connection.
    #[error("record authentication failed")]
    BadRecordMAC,
    /// The half-connection's `(version, suite)` pair has no defined
    /// encrypt/decrypt behavior. Fatal; indicates a misconfiguration.
    #[error("unsupported cipher suite/version combination")]
    UnsupportedSuite,
    /// The per-direction record sequence number wrapped past `0xFF..FF`.
    /// Fatal; the half-connection is unusable from this point on.
    #[error("half-connection sequence number exhausted")]
    SeqOverflow,
    /// A cached session's stored server certificate did not parse as DER.
    #[error("cached server certificate did not parse")]
    InvalidCertificate,
}
