//! Decoder for the contact-logging UDP datagrams emitted by the digital-mode
//! application.
//!
//! Every datagram is self-contained: a fixed 16-byte header (magic, schema,
//! packet type, client id length) followed by the client id and a
//! type-specific payload. Only heartbeat, status and logged-ADIF packets
//! carry anything the log consumes; everything else decodes to an error the
//! caller drops after diagnostic logging.

/// Bounds-checked big-endian reader.
pub mod cursor;
/// Datagram header and payload decoding.
pub mod datagram;
/// Datagram builder for tests and replay tools.
pub mod encode;
/// Contact assembly from logged-ADIF tags.
pub mod ingest;
/// ADIF tag tokenizer and typed tag map.
pub mod tags;

pub use datagram::{Packet, decode};
pub use ingest::{IngestRules, contact_from_tags};
pub use tags::TagMap;

/// Magic constant opening every datagram.
pub const MAGIC: u32 = 0xADBC_CBDA;
/// Fixed header length preceding the client id bytes.
pub const HEADER_LEN: usize = 16;

/// Packet type: heartbeat.
pub const TYPE_HEARTBEAT: u32 = 0;
/// Packet type: status.
pub const TYPE_STATUS: u32 = 1;
/// Packet type: decode.
pub const TYPE_DECODE: u32 = 2;
/// Packet type: logged ADIF.
pub const TYPE_LOGGED_ADIF: u32 = 12;

/// Reasons a datagram is dropped. Never surfaced past diagnostic logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A read ran past the end of the datagram.
    #[error("truncated datagram: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        /// Offset of the failed read.
        offset: usize,
        /// Bytes requested.
        needed: usize,
        /// Bytes left.
        available: usize,
    },
    /// The first four bytes are not [`MAGIC`].
    #[error("bad magic 0x{0:08X}")]
    BadMagic(u32),
    /// Packet type the log does not consume.
    #[error("unsupported packet type {0}")]
    UnsupportedType(u32),
    /// Text field is not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),
    /// Logged-ADIF payload has no `<call:` marker.
    #[error("no <call: marker in logged ADIF payload")]
    MissingCallMarker,
    /// Tag header could not be parsed.
    #[error("malformed ADIF tag: {0}")]
    MalformedTag(String),
    /// A tag the contact needs is absent.
    #[error("missing required tag {0}")]
    MissingTag(&'static str),
    /// A tag value could not be interpreted.
    #[error("bad value for {tag}: {value:?}")]
    BadValue {
        /// Tag name.
        tag: &'static str,
        /// Offending value.
        value: String,
    },
    /// `SRX_STRING` is not exactly `<class> <section>`.
    #[error("malformed exchange: {0:?}")]
    MalformedExchange(String),
}
