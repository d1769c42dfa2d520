//! The TLS record-layer half-connection: the AEAD / legacy-stream record
//! encrypt-decrypt path QUIC packet protection is built on top of.
//!
//! One [`HalfConn`] exists per direction (send, receive) per connection.
//! It owns a monotonically increasing sequence number, the currently
//! installed cipher [`Suite`], and invokes a caller-supplied hook every
//! time a new key is installed via [`HalfConn::set_key`].

use std::cell::Cell;

use bytes::Bytes;
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce, Tag};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// TLS 1.2, `0x0303`.
pub const TLS1_2: u16 = 0x0303;
/// TLS 1.3, `0x0304`.
pub const TLS1_3: u16 = 0x0304;

const SEQ_LEN: usize = 8;
const AEAD_KEY_LEN: usize = 32;
const AEAD_FIXED_IV_LEN: usize = 4;
const AEAD_EXPLICIT_NONCE_LEN: usize = 8;
const AEAD_TAG_LEN: usize = 16;
const RECORD_HEADER_LEN: usize = 5;
/// `application_data`, the only TLS 1.3 record content type this crate
/// ever emits on the wire (post-handshake, every record is this type; the
/// real content type is carried inside the encrypted payload instead).
const RECORD_TYPE_APP_DATA: u8 = 0x17;

/// A category of cipher suite, set once a handshake has negotiated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteKind {
    /// No suite negotiated yet; records are sent and received unprotected.
    Unknown,
    /// A legacy MAC-then-stream-cipher suite.
    Stream,
    /// An AEAD suite (the only kind QUIC 1-RTT/0-RTT/Handshake keys use).
    Aead,
}

/// A keystream generator standing in for a legacy stream cipher.
///
/// This pack carries no legacy stream-cipher crate (RC4, the suite real
/// gQUIC paired with `STREAM`, is both deprecated and absent from the
/// dependency stack), so the keystream is instead built from repeated
/// applications of HMAC-SHA256 over an internal block counter — the same
/// `hmac`/`sha2` crates this crate already pulls in for the `STREAM`
/// suite's MAC. The counter is internal, connection-lifetime state (a
/// real stream cipher's internal state plays the same role), so encrypt
/// and decrypt must be called in matching order on either side, exactly
/// like the record sequence number they run alongside.
#[derive(Debug)]
struct Keystream {
    key: [u8; AEAD_KEY_LEN],
    block: Cell<u64>,
}

impl Keystream {
    fn new(key: [u8; AEAD_KEY_LEN]) -> Self {
        Self { key, block: Cell::new(0) }
    }

    fn apply(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        let mut block = self.block.get();
        while out.len() < data.len() {
            let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
            mac.update(&block.to_be_bytes());
            out.extend_from_slice(&mac.finalize().into_bytes());
            block += 1;
        }
        out.truncate(data.len());
        self.block.set(block);
        out.iter().zip(data).map(|(k, d)| k ^ d).collect()
    }
}

/// The `STREAM` suite: a keystream cipher plus an optional MAC.
#[derive(Debug)]
pub struct StreamSuite {
    keystream: Keystream,
    mac_key: Option<[u8; 32]>,
}

/// The `AEAD` suite: a 256-bit ChaCha20-Poly1305 key plus a 4-byte fixed
/// IV that is concatenated with an 8-byte per-record explicit nonce to
/// form the 12-byte AEAD nonce (the pre-TLS-1.3 "explicit nonce" AEAD
/// construction, e.g. AES-GCM in TLS 1.2).
#[derive(Debug)]
pub struct AeadSuite {
    key: [u8; AEAD_KEY_LEN],
    fixed_iv: [u8; AEAD_FIXED_IV_LEN],
}

/// The negotiated cipher suite of a [`HalfConn`], or [`Suite::Unknown`]
/// before any keys have been installed.
#[derive(Debug)]
pub enum Suite {
    /// No suite negotiated; records pass through unprotected.
    Unknown,
    /// See [`StreamSuite`].
    Stream(StreamSuite),
    /// See [`AeadSuite`].
    Aead(AeadSuite),
}

impl Suite {
    /// Builds a `STREAM` suite from a keystream key and an optional MAC key.
    pub fn stream(enc_key: [u8; 32], mac_key: Option<[u8; 32]>) -> Self {
        Suite::Stream(StreamSuite { keystream: Keystream::new(enc_key), mac_key })
    }

    /// Builds an `AEAD` suite from a ChaCha20-Poly1305 key and fixed IV.
    pub fn aead(key: [u8; 32], fixed_iv: [u8; 4]) -> Self {
        Suite::Aead(AeadSuite { key, fixed_iv })
    }

    /// This suite's category.
    pub fn kind(&self) -> SuiteKind {
        match self {
            Suite::Unknown => SuiteKind::Unknown,
            Suite::Stream(_) => SuiteKind::Stream,
            Suite::Aead(_) => SuiteKind::Aead,
        }
    }
}

/// A per-direction TLS record sequence number: 8 big-endian bytes,
/// incremented by exactly one after every successful encrypt or decrypt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Seq([u8; SEQ_LEN]);

impl Seq {
    /// The all-zero sequence number a freshly keyed half-connection starts at.
    pub fn zero() -> Self {
        Self([0; SEQ_LEN])
    }

    /// This sequence number's big-endian byte representation.
    pub fn as_bytes(&self) -> &[u8; SEQ_LEN] {
        &self.0
    }

    /// Increments by one, as a big-endian integer. Fails with
    /// [`Error::SeqOverflow`] on wraparound from all-`0xFF` to all-zero;
    /// the caller must treat the half-connection as unusable afterward.
    pub fn increment(&mut self) -> Result<(), Error> {
        for byte in self.0.iter_mut().rev() {
            if *byte == 0xff {
                *byte = 0;
                continue;
            }
            *byte += 1;
            return Ok(());
        }
        tracing::error!("half-connection record sequence number exhausted");
        Err(Error::SeqOverflow)
    }
}

/// A TLS traffic secret: opaque keying material handed to [`HalfConn::set_key`].
pub type TrafficSecret = Bytes;

/// Receiving end of the handshake's keying-material callback: whatever
/// the handshake state machine holds a reference to in order to push a
/// freshly derived secret into a half-connection, without depending on
/// this crate's concrete `HalfConn` type.
pub trait KeyInstall {
    /// Installs `suite`/`secret` as this half-connection's current keys.
    fn set_key(&mut self, suite: Suite, secret: TrafficSecret);
}

impl KeyInstall for HalfConn {
    fn set_key(&mut self, suite: Suite, secret: TrafficSecret) {
        HalfConn::set_key(self, suite, secret)
    }
}

/// One direction (send or receive) of a TLS record layer: its sequence
/// number, currently installed suite, and a hook invoked on every key
/// install.
pub struct HalfConn {
    ver: u16,
    suite: Suite,
    seq: Seq,
    traffic_secret: TrafficSecret,
    on_set_key: Option<Box<dyn FnMut(&Suite, &TrafficSecret) + Send>>,
}

impl std::fmt::Debug for HalfConn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HalfConn")
            .field("ver", &self.ver)
            .field("suite", &self.suite)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

impl HalfConn {
    /// Builds an unkeyed half-connection for `ver` (e.g. [`TLS1_3`]).
    /// Records sent/received through it are unprotected until
    /// [`HalfConn::set_key`] installs a suite.
    pub fn new(ver: u16) -> Self {
        Self {
            ver,
            suite: Suite::Unknown,
            seq: Seq::zero(),
            traffic_secret: Bytes::new(),
            on_set_key: None,
        }
    }

    /// Registers a hook invoked every time [`HalfConn::set_key`] installs
    /// a new suite and secret.
    pub fn on_set_key(&mut self, hook: impl FnMut(&Suite, &TrafficSecret) + Send + 'static) {
        self.on_set_key = Some(Box::new(hook));
    }

    /// The currently installed suite.
    pub fn suite(&self) -> &Suite {
        &self.suite
    }

    /// The current record sequence number.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// Installs a new suite and secret, resetting the sequence number to
    /// zero. Idempotent: calling this twice with an equivalent `(suite,
    /// secret)` leaves the half-connection in the same observable state
    /// (sequence at zero, that suite installed) both times.
    pub fn set_key(&mut self, suite: Suite, secret: TrafficSecret) {
        if let Some(hook) = self.on_set_key.as_mut() {
            hook(&suite, &secret);
        }
        self.suite = suite;
        self.traffic_secret = secret;
        self.seq = Seq::zero();
        tracing::debug!(ver = self.ver, suite = ?self.suite.kind(), "half-connection key installed");
    }

    /// Protects `payload` for transmission under `record_header` (a
    /// 5-byte TLS record header: 1-byte type, 2-byte legacy version,
    /// 2-byte length — the length field is overwritten by this call).
    ///
    /// Returns the complete on-wire record (header plus protected
    /// payload). Increments the sequence number by one on success.
    pub fn encrypt(&mut self, record_header: &[u8; RECORD_HEADER_LEN], payload: &[u8]) -> Result<Vec<u8>, Error> {
        let mut ret = match &self.suite {
            Suite::Unknown => {
                let mut ret = Vec::with_capacity(record_header.len() + payload.len());
                ret.extend_from_slice(record_header);
                ret.extend_from_slice(payload);
                ret
            }
            Suite::Stream(stream) => {
                let mac = match stream.mac_key {
                    Some(key) => Some(hmac_over(&key, &[self.seq.as_bytes(), record_header, payload])),
                    None => None,
                };
                let mut msg = Vec::with_capacity(SEQ_LEN + payload.len() + mac.as_ref().map_or(0, Vec::len));
                msg.extend_from_slice(self.seq.as_bytes());
                msg.extend_from_slice(payload);
                if let Some(mac) = &mac {
                    msg.extend_from_slice(mac);
                }
                let sealed = stream.keystream.apply(&msg);

                let mut ret = Vec::with_capacity(record_header.len() + sealed.len());
                ret.extend_from_slice(record_header);
                ret.extend_from_slice(&sealed);
                ret
            }
            Suite::Aead(aead) => {
                if self.ver != TLS1_3 {
                    return Err(Error::UnsupportedSuite);
                }
                let mut internal_header = [0u8; RECORD_HEADER_LEN];
                internal_header[0] = RECORD_TYPE_APP_DATA;
                internal_header[1..3].copy_from_slice(&record_header[1..3]);
                let aead_len = (1 + AEAD_EXPLICIT_NONCE_LEN + AEAD_TAG_LEN + payload.len()) as u16;
                internal_header[3..5].copy_from_slice(&aead_len.to_be_bytes());

                let mut explicit_nonce = [0u8; AEAD_EXPLICIT_NONCE_LEN];
                rand::rng().fill_bytes(&mut explicit_nonce);
                let mut nonce_bytes = [0u8; 12];
                nonce_bytes[..AEAD_FIXED_IV_LEN].copy_from_slice(&aead.fixed_iv);
                nonce_bytes[AEAD_FIXED_IV_LEN..].copy_from_slice(&explicit_nonce);

                let cipher = ChaCha20Poly1305::new(Key::from_slice(&aead.key));
                let mut buf = payload.to_vec();
                let tag = cipher
                    .encrypt_in_place_detached(Nonce::from_slice(&nonce_bytes), &internal_header, &mut buf)
                    .map_err(|_| Error::UnsupportedSuite)?;

                let mut ret = Vec::with_capacity(RECORD_HEADER_LEN + 1 + AEAD_EXPLICIT_NONCE_LEN + AEAD_TAG_LEN + buf.len());
                ret.extend_from_slice(&internal_header);
                ret.push(AEAD_EXPLICIT_NONCE_LEN as u8);
                ret.extend_from_slice(&explicit_nonce);
                ret.extend_from_slice(&tag);
                ret.extend_from_slice(&buf);
                ret
            }
        };

        let payload_len = (ret.len() - RECORD_HEADER_LEN) as u16;
        ret[3..5].copy_from_slice(&payload_len.to_be_bytes());
        self.seq.increment()?;
        Ok(ret)
    }

    /// Unprotects a complete on-wire `record` (header plus payload).
    /// Returns the record's content type byte and the recovered
    /// plaintext. Increments the sequence number by one on success.
    pub fn decrypt(&mut self, record: &[u8]) -> Result<(u8, Vec<u8>), Error> {
        if record.len() < RECORD_HEADER_LEN {
            return Err(Error::BadRecordMAC);
        }
        let record_type = record[0];
        let payload = &record[RECORD_HEADER_LEN..];

        let plaintext = match &self.suite {
            Suite::Unknown => payload.to_vec(),
            Suite::Stream(stream) => {
                let record_header: [u8; RECORD_HEADER_LEN] = record[..RECORD_HEADER_LEN].try_into().unwrap();
                let msg = stream.keystream.apply(payload);
                let mac_size = stream.mac_key.map_or(0, |_| 32);
                if msg.len() < SEQ_LEN + mac_size {
                    return Err(Error::BadRecordMAC);
                }
                let body = &msg[SEQ_LEN..msg.len() - mac_size];
                if let Some(key) = stream.mac_key {
                    let remote_mac = &msg[msg.len() - mac_size..];
                    let local_mac = hmac_over(&key, &[self.seq.as_bytes(), &record_header, body]);
                    if !constant_time_eq(&local_mac, remote_mac) {
                        return Err(Error::BadRecordMAC);
                    }
                }
                body.to_vec()
            }
            Suite::Aead(aead) => {
                if self.ver != TLS1_3 {
                    return Err(Error::UnsupportedSuite);
                }
                if payload.is_empty() {
                    return Err(Error::BadRecordMAC);
                }
                let nonce_len = payload[0] as usize;
                if nonce_len != AEAD_EXPLICIT_NONCE_LEN {
                    return Err(Error::BadRecordMAC);
                }
                if payload.len() < 1 + nonce_len + AEAD_TAG_LEN {
                    return Err(Error::BadRecordMAC);
                }
                let explicit_nonce = &payload[1..1 + nonce_len];
                let rest = &payload[1 + nonce_len..];
                let tag = &rest[..AEAD_TAG_LEN];
                let ciphertext = &rest[AEAD_TAG_LEN..];

                let mut nonce_bytes = [0u8; 12];
                nonce_bytes[..AEAD_FIXED_IV_LEN].copy_from_slice(&aead.fixed_iv);
                nonce_bytes[AEAD_FIXED_IV_LEN..].copy_from_slice(explicit_nonce);

                let addata = &record[..RECORD_HEADER_LEN];
                let cipher = ChaCha20Poly1305::new(Key::from_slice(&aead.key));
                let mut buf = ciphertext.to_vec();
                cipher
                    .decrypt_in_place_detached(Nonce::from_slice(&nonce_bytes), addata, &mut buf, Tag::from_slice(tag))
                    .map_err(|_| Error::BadRecordMAC)?;
                buf
            }
        };

        self.seq.increment()?;
        Ok((record_type, plaintext))
    }
}

fn hmac_over(key: &[u8; 32], parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time byte comparison, to avoid leaking MAC-mismatch timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aead_pair(ver: u16) -> (HalfConn, HalfConn) {
        let key = [0x42u8; 32];
        let fixed_iv = [0x01u8; 4];
        let mut tx = HalfConn::new(ver);
        let mut rx = HalfConn::new(ver);
        tx.set_key(Suite::aead(key, fixed_iv), Bytes::from_static(b"secret"));
        rx.set_key(Suite::aead(key, fixed_iv), Bytes::from_static(b"secret"));
        (tx, rx)
    }

    #[test]
    fn unkeyed_half_conn_passes_through_unprotected() {
        let mut hc = HalfConn::new(TLS1_3);
        let header = [0x16, 0x03, 0x03, 0x00, 0x00];
        let payload = b"client hello bytes";
        let record = hc.encrypt(&header, payload).unwrap();
        assert_eq!(&record[..5], &header);
        assert_eq!(&record[5..], payload);
        assert_eq!(hc.seq().as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn aead_encrypt_decrypt_round_trip_matches_e5() {
        let (mut tx, mut rx) = aead_pair(TLS1_3);
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        let payload = [0xAAu8; 32];

        let record = tx.encrypt(&header, &payload).unwrap();
        // 5 (header) + 1 (nonce len) + 8 (nonce) + 16 (tag) + 32 (payload)
        assert_eq!(record.len(), 5 + 1 + 8 + 16 + 32);
        assert_eq!(record[5], 0x08);

        let (record_type, plaintext) = rx.decrypt(&record).unwrap();
        assert_eq!(record_type, 0x17);
        assert_eq!(plaintext, payload);
        assert_eq!(rx.seq().as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn aead_seq_increments_by_one_per_encrypt() {
        let (mut tx, _rx) = aead_pair(TLS1_3);
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        tx.encrypt(&header, b"one").unwrap();
        assert_eq!(tx.seq().as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);
        tx.encrypt(&header, b"two").unwrap();
        assert_eq!(tx.seq().as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn flipped_ciphertext_byte_fails_decrypt() {
        let (mut tx, mut rx) = aead_pair(TLS1_3);
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        let mut record = tx.encrypt(&header, b"hello").unwrap();
        *record.last_mut().unwrap() ^= 0xFF;
        assert_eq!(rx.decrypt(&record), Err(Error::BadRecordMAC));
    }

    #[test]
    fn flipped_aad_byte_fails_decrypt() {
        let (mut tx, mut rx) = aead_pair(TLS1_3);
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        let mut record = tx.encrypt(&header, b"hello").unwrap();
        record[1] ^= 0xFF;
        assert_eq!(rx.decrypt(&record), Err(Error::BadRecordMAC));
    }

    #[test]
    fn aead_rejects_tls12() {
        let mut hc = HalfConn::new(TLS1_2);
        hc.set_key(Suite::aead([0u8; 32], [0u8; 4]), Bytes::new());
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        assert_eq!(hc.encrypt(&header, b"x"), Err(Error::UnsupportedSuite));
    }

    #[test]
    fn stream_suite_round_trips_with_mac() {
        let mut tx = HalfConn::new(TLS1_2);
        let mut rx = HalfConn::new(TLS1_2);
        let enc_key = [0x11u8; 32];
        let mac_key = [0x22u8; 32];
        tx.set_key(Suite::stream(enc_key, Some(mac_key)), Bytes::new());
        rx.set_key(Suite::stream(enc_key, Some(mac_key)), Bytes::new());

        let header = [0x17, 0x03, 0x01, 0x00, 0x00];
        let payload = b"stream suite payload";
        let record = tx.encrypt(&header, payload).unwrap();
        let (record_type, plaintext) = rx.decrypt(&record).unwrap();
        assert_eq!(record_type, 0x17);
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn stream_suite_without_mac_round_trips() {
        let mut tx = HalfConn::new(TLS1_2);
        let mut rx = HalfConn::new(TLS1_2);
        let enc_key = [0x33u8; 32];
        tx.set_key(Suite::stream(enc_key, None), Bytes::new());
        rx.set_key(Suite::stream(enc_key, None), Bytes::new());

        let header = [0x17, 0x03, 0x01, 0x00, 0x00];
        let payload = b"no mac here";
        let record = tx.encrypt(&header, payload).unwrap();
        let (_, plaintext) = rx.decrypt(&record).unwrap();
        assert_eq!(plaintext, payload);
    }

    #[test]
    fn stream_suite_tampered_mac_fails() {
        let mut tx = HalfConn::new(TLS1_2);
        let mut rx = HalfConn::new(TLS1_2);
        let enc_key = [0x44u8; 32];
        let mac_key = [0x55u8; 32];
        tx.set_key(Suite::stream(enc_key, Some(mac_key)), Bytes::new());
        rx.set_key(Suite::stream(enc_key, Some(mac_key)), Bytes::new());

        let header = [0x17, 0x03, 0x01, 0x00, 0x00];
        let mut record = tx.encrypt(&header, b"tamper me").unwrap();
        *record.last_mut().unwrap() ^= 0x01;
        assert_eq!(rx.decrypt(&record), Err(Error::BadRecordMAC));
    }

    #[test]
    fn set_key_resets_seq_and_is_idempotent() {
        let mut hc = HalfConn::new(TLS1_3);
        let key = [0x01u8; 32];
        let iv = [0x02u8; 4];
        hc.set_key(Suite::aead(key, iv), Bytes::from_static(b"s1"));
        let header = [0x17, 0x03, 0x03, 0x00, 0x00];
        hc.encrypt(&header, b"payload").unwrap();
        assert_eq!(hc.seq().as_bytes(), &[0, 0, 0, 0, 0, 0, 0, 1]);

        hc.set_key(Suite::aead(key, iv), Bytes::from_static(b"s1"));
        assert_eq!(hc.seq(), Seq::zero());
    }

    #[test]
    fn seq_overflow_is_fatal() {
        let mut seq = Seq([0xff; SEQ_LEN]);
        assert_eq!(seq.increment(), Err(Error::SeqOverflow));
    }

    #[test]
    fn seq_increments_with_carry() {
        let mut seq = Seq([0, 0, 0, 0, 0, 0, 0, 0xff]);
        seq.increment().unwrap();
        assert_eq!(seq.as_bytes(), &[0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn set_key_invokes_hook() {
        use std::sync::{Arc, Mutex};
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let mut hc = HalfConn::new(TLS1_3);
        hc.on_set_key(move |suite, secret| {
            *seen_clone.lock().unwrap() = Some((suite.kind(), secret.clone()));
        });
        hc.set_key(Suite::aead([0u8; 32], [0u8; 4]), Bytes::from_static(b"ticket"));
        let (kind, secret) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(kind, SuiteKind::Aead);
        assert_eq!(secret, Bytes::from_static(b"ticket"));
    }
}
