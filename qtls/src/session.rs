//! Client session resumption: assembling a ClientHello's ticket/PSK
//! fields from a cached session, and the cache-eviction rules that guard
//! stale or no-longer-trustworthy entries.
//!
//! Early-secret / binder-key derivation belongs to the handshake state
//! machine and is out of scope here; this module only assembles the
//! identity the handshake later binds.

use std::time::SystemTime;

use bytes::Bytes;

use crate::error::Error;
use crate::half_conn::TLS1_3;

/// A single cached client session, keyed by server name (or, absent a
/// configured server name, the peer network address).
#[derive(Debug, Clone)]
pub struct ClientSessionState {
    /// TLS version this session was negotiated under.
    pub ver: u16,
    /// Cipher suite this session was negotiated under. Only consulted for
    /// pre-1.3 resumption, where the suite must still be offered.
    pub cipher_suite: u16,
    /// The opaque session ticket handed to the server on resumption.
    pub sess_ticket: Bytes,
    /// DER-encoded certificate chain the server presented, leaf first.
    pub ser_certs: Vec<Bytes>,
    /// Whether `ser_certs` was successfully chain-validated when received.
    pub verified_chain: bool,
    /// Absolute expiry of the session ticket (TLS 1.3 only).
    pub use_by: SystemTime,
    /// When this entry was cached, used to compute the obfuscated ticket
    /// age offered in the PSK identity (TLS 1.3 only).
    pub recv_at: SystemTime,
    /// Per-ticket obfuscation salt added to the computed ticket age.
    pub age_add: u32,
}

/// The key a [`ClientSessionCache`] is looked up and evicted by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the cache key for a connection: `cfg.ser_name` if
    /// non-empty, otherwise the peer's network address.
    pub fn derive(ser_name: &str, peer_addr: &str) -> Self {
        if ser_name.is_empty() {
            Self(peer_addr.to_string())
        } else {
            Self(ser_name.to_string())
        }
    }
}

/// A client-side TLS session cache, keyed by [`CacheKey`].
pub trait ClientSessionCache {
    /// Looks up a cached session. `None` on a cache miss.
    fn get(&self, key: &CacheKey) -> Option<ClientSessionState>;

    /// Stores (or, with `None`, evicts) the entry for `key`.
    fn put(&self, key: &CacheKey, entry: Option<ClientSessionState>);
}

/// The knobs [`load_session`] reads from the endpoint's TLS configuration.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// The server name this connection is dialing, used both for SNI and
    /// as the session cache key when non-empty.
    pub ser_name: String,
    /// Skip certificate validation (notAfter / commonName) before trusting
    /// a cached session enough to offer PSK resumption on it.
    pub insecure_skip_verify: bool,
    /// Disable session-ticket resumption entirely.
    pub sess_ticket_disabled: bool,
}

/// A TLS 1.3 PSK identity offered in a ClientHello: the opaque ticket
/// label plus an obfuscated ticket age (RFC 8446 §4.2.11).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PskIdentity {
    /// The session ticket being offered as a PSK label.
    pub label: Bytes,
    /// `(now - recv_at) + age_add`, truncating to milliseconds, wrapping
    /// on overflow per RFC 8446's 32-bit `obfuscated_ticket_age`.
    pub obfuscated_ticket_age: u32,
}

/// The subset of a ClientHello this module reads and mutates. A full
/// handshake state machine owns a much larger message; only the fields
/// session resumption touches are modeled here.
#[derive(Debug, Clone, Default)]
pub struct ClientHelloMsg {
    /// TLS versions offered, highest-preference first.
    pub supported_versions: Vec<u16>,
    /// Cipher suites offered.
    pub cipher_suites: Vec<u16>,
    /// Whether this ClientHello advertises ticket-based resumption.
    pub ticket_supported: bool,
    /// PSK key-exchange modes offered (`0x01` = `psk_dhe_ke`).
    pub psk_modes: Vec<u8>,
    /// The legacy (pre-1.3) session ticket extension value.
    pub sess_ticket: Bytes,
    /// TLS 1.3 PSK identities offered for resumption.
    pub psk_identities: Vec<PskIdentity>,
}

/// Assembles `hello`'s ticket/PSK fields from the cached session for this
/// connection, evicting entries that have expired or gone untrustworthy.
///
/// `handshakes` is the number of handshakes already attempted on this
/// connection; a nonzero value means this is a retry after a
/// HelloRetryRequest, and ticket binding is skipped to avoid binding a
/// PSK across two different ClientHellos.
pub fn load_session(
    hello: &mut ClientHelloMsg,
    cfg: &TlsConfig,
    peer_addr: &str,
    handshakes: u32,
    cache: &dyn ClientSessionCache,
    now: SystemTime,
) -> Result<(), Error> {
    if cfg.sess_ticket_disabled {
        return Ok(());
    }

    hello.ticket_supported = true;
    if hello.supported_versions.first() == Some(&TLS1_3) {
        hello.psk_modes = vec![0x01];
    }

    if handshakes != 0 {
        return Ok(());
    }

    let key = CacheKey::derive(&cfg.ser_name, peer_addr);
    let Some(sess) = cache.get(&key) else {
        return Ok(());
    };

    if !hello.supported_versions.contains(&sess.ver) {
        return Ok(());
    }

    if !cfg.insecure_skip_verify {
        if !sess.verified_chain {
            return Ok(());
        }
        let Some(leaf_der) = sess.ser_certs.first() else {
            return Ok(());
        };
        // `x509_parser` parses the DER slice read-only (unlike a mutating
        // C `d2i_X509`-style parser that advances the pointer it's given),
        // so there is nothing to copy out of the cache entry first.
        let (_, cert) = x509_parser::parse_x509_certificate(leaf_der).map_err(|_| Error::InvalidCertificate)?;

        let not_after: SystemTime = cert
            .validity()
            .not_after
            .to_datetime()
            .try_into()
            .map_err(|_| Error::InvalidCertificate)?;
        if not_after <= now {
            cache.put(&key, None);
            return Ok(());
        }

        let cn_matches = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .is_some_and(|cn| cn == cfg.ser_name);
        if !cn_matches {
            return Ok(());
        }
    }

    if sess.ver != TLS1_3 {
        if hello.cipher_suites.contains(&sess.cipher_suite) {
            hello.sess_ticket = sess.sess_ticket.clone();
        }
        return Ok(());
    }

    if now > sess.use_by {
        cache.put(&key, None);
        return Ok(());
    }

    let ticket_age_ms = now
        .duration_since(sess.recv_at)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0);
    hello.psk_identities.push(PskIdentity {
        label: sess.sess_ticket.clone(),
        obfuscated_ticket_age: ticket_age_ms.wrapping_add(sess.age_add),
    });

    Ok(())
}
