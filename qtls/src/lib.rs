//! TLS record-layer half-connections and client session resumption for
//! the QUIC transport engine.
//!
//! [`half_conn`] protects and unprotects individual TLS records once a
//! traffic secret has been installed; [`session`] assembles the
//! ticket/PSK fields of an outbound ClientHello from a cached session.

pub mod error;
pub mod half_conn;
pub mod session;
