//! Packet header machinery: the long/short header dichotomy, packet-number
//! and length mutation, and the connection-ID demultiplex probe.

pub mod header;
pub mod signal;
#[path = "type.rs"]
pub mod r#type;

pub use header::{deserialize_conn_id, Header, LongHeader, ShortHeader};
pub use r#type::{LongType, Type};
