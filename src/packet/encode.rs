use bytes::{BufMut, Bytes, BytesMut};

use super::{MAGIC, TYPE_HEARTBEAT, TYPE_LOGGED_ADIF, TYPE_STATUS};

/// Schema version stamped on built datagrams.
pub const SCHEMA: u32 = 2;

/// Builds datagrams in the same layout [`super::decode`] reads.
#[derive(Debug)]
pub struct DatagramBuilder {
    buf: BytesMut,
}

impl DatagramBuilder {
    /// Starts a datagram with the fixed header and client id.
    pub fn new(packet_type: u32, client_id: &str) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u32(MAGIC);
        buf.put_u32(SCHEMA);
        buf.put_u32(packet_type);
        let mut builder = Self { buf };
        builder.put_utf8(client_id);
        builder
    }

    pub fn put_u32(&mut self, v: u32) -> &mut Self {
        self.buf.put_u32(v);
        self
    }

    pub fn put_u64(&mut self, v: u64) -> &mut Self {
        self.buf.put_u64(v);
        self
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_utf8(&mut self, s: &str) -> &mut Self {
        self.buf.put_i32(s.len() as i32);
        self.buf.put_slice(s.as_bytes());
        self
    }

    /// Raw bytes with no length prefix.
    pub fn put_raw(&mut self, raw: &[u8]) -> &mut Self {
        self.buf.put_slice(raw);
        self
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn heartbeat(client_id: &str, max_schema: u32, version: &str) -> Bytes {
        let mut b = Self::new(TYPE_HEARTBEAT, client_id);
        b.put_u32(max_schema).put_utf8(version);
        b.finish()
    }

    pub fn status(client_id: &str, dial_freq_hz: u64, mode: &str, dx_call: &str) -> Bytes {
        let mut b = Self::new(TYPE_STATUS, client_id);
        b.put_u64(dial_freq_hz).put_utf8(mode).put_utf8(dx_call);
        b.finish()
    }

    /// Logged-ADIF packet; the ADIF text follows a length prefix as the
    /// sending application writes it.
    pub fn logged_adif(client_id: &str, adif: &str) -> Bytes {
        let mut b = Self::new(TYPE_LOGGED_ADIF, client_id);
        b.put_utf8(adif);
        b.finish()
    }
}
