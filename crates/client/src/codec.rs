//! Bounds-checked cursors over fixed-layout binary buffers.
//!
//! The device firmware parses every message at fixed offsets, so all
//! encoders write into preallocated buffers of exactly the wire size.
//! Writing past a buffer's declared capacity is a contract violation
//! and fails loudly; nothing is ever silently truncated. Both
//! endiannesses appear on the wire: big-endian for envelope header
//! fields and derivation path indices, little-endian for key/value and
//! session numerics.

use crate::error::{Error, Result};

/// Forward-only writer over a fixed-capacity buffer.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    /// Wrap a preallocated buffer. The buffer length is the capacity.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::Codec("write past end of fixed buffer"))?;
        let slot = &mut self.buf[self.pos..end];
        self.pos = end;
        Ok(slot)
    }

    /// Write one byte.
    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.reserve(1)?[0] = value;
        Ok(())
    }

    /// Write a big-endian u16.
    pub fn put_u16_be(&mut self, value: u16) -> Result<()> {
        self.reserve(2)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Write a big-endian u32.
    pub fn put_u32_be(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Write a little-endian u32.
    pub fn put_u32_le(&mut self, value: u32) -> Result<()> {
        self.reserve(4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Write raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Write an ASCII string into a fixed-width slot, NUL-padded.
    /// The string must fit with at least one trailing NUL.
    pub fn put_str_slot(&mut self, s: &str, slot_len: usize) -> Result<()> {
        if !s.is_ascii() {
            return Err(Error::Codec("string slot must be ASCII"));
        }
        if s.len() >= slot_len {
            return Err(Error::Codec("string too long for fixed slot"));
        }
        let slot = self.reserve(slot_len)?;
        slot[..s.len()].copy_from_slice(s.as_bytes());
        slot[s.len()..].fill(0);
        Ok(())
    }

    /// Skip `n` bytes, leaving them zeroed as allocated.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.reserve(n).map(|_| ())
    }
}

/// Forward-only reader over a received buffer.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wrap a received buffer.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `n` bytes and advance.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(Error::Response("truncated message"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Read one byte.
    pub fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian u16.
    pub fn take_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    /// Read a big-endian u32.
    pub fn take_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a little-endian u32.
    pub fn take_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a fixed-size array.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        Ok(self.take(N)?.try_into().unwrap())
    }

    /// Read a fixed-width NUL-padded ASCII slot into an owned string.
    pub fn take_str_slot(&mut self, slot_len: usize) -> Result<String> {
        let slot = self.take(slot_len)?;
        let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        let s = &slot[..end];
        if !s.is_ascii() {
            return Err(Error::Response("non-ASCII bytes in string slot"));
        }
        // Unwrap is fine: ASCII is valid UTF-8.
        Ok(String::from_utf8(s.to_vec()).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_mixed_endianness() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        w.put_u8(0xAB).unwrap();
        w.put_u16_be(0x0102).unwrap();
        w.put_u32_be(0xDEADBEEF).unwrap();
        w.put_u32_le(0xDEADBEEF).unwrap();
        assert_eq!(w.position(), 11);

        let mut r = Reader::new(&buf);
        assert_eq!(r.take_u8().unwrap(), 0xAB);
        assert_eq!(r.take_u16_be().unwrap(), 0x0102);
        assert_eq!(r.take_u32_be().unwrap(), 0xDEADBEEF);
        assert_eq!(r.take_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(&buf[3..7], &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(&buf[7..11], &[0xEF, 0xBE, 0xAD, 0xDE]);
    }

    #[test]
    fn write_past_capacity_is_an_error() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        w.put_u32_be(1).unwrap();
        assert!(matches!(w.put_u8(0), Err(Error::Codec(_))));
    }

    #[test]
    fn string_slots_are_nul_padded_and_bounded() {
        let mut buf = [0xFFu8; 8];
        let mut w = Writer::new(&mut buf);
        w.put_str_slot("abc", 8).unwrap();
        assert_eq!(&buf, b"abc\0\0\0\0\0");

        let mut r = Reader::new(&buf);
        assert_eq!(r.take_str_slot(8).unwrap(), "abc");

        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        assert!(w.put_str_slot("abcd", 4).is_err());
        let mut w = Writer::new(&mut buf);
        assert!(w.put_str_slot("héllo", 4).is_err());
    }

    #[test]
    fn reader_rejects_truncated_input() {
        let buf = [0u8; 3];
        let mut r = Reader::new(&buf);
        assert!(r.take_u32_be().is_err());
    }
}
