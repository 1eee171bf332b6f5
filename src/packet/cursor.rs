use super::ProtocolError;

/// Forward-only reader over one datagram. Every read is bounds-checked and
/// fails closed with [`ProtocolError::Truncated`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(ProtocolError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_be_bytes(raw))
    }

    /// Length-prefixed UTF-8 string. A negative length encodes a null
    /// string and reads as empty.
    pub fn read_utf8(&mut self, field: &'static str) -> Result<&'a str, ProtocolError> {
        let len = self.read_i32()?;
        if len <= 0 {
            return Ok("");
        }
        let bytes = self.take(len as usize)?;
        std::str::from_utf8(bytes).map_err(|_| ProtocolError::Utf8(field))
    }
}
