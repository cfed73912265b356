//! Little-endian byte reader and writer for chunk payloads.
//!
//! Alle Container-Formate sind byte-aligned und little-endian. Der Reader
//! arbeitet auf einem geliehenen Slice (kein Kopieren), der Writer auf einem
//! wachsenden `Vec<u8>` und unterstützt das nachträgliche Überschreiben
//! reservierter Bereiche (Offset-Patching).

use crate::{Error, Result};

/// Reads little-endian primitives from a byte slice.
#[derive(Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    /// Nächstes ungelesenes Byte in data.
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a new `ByteReader` over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining to be read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// `true` wenn alle Bytes gelesen wurden.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Liest `n` Bytes als Slice (zero-copy).
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        // Upfront-Check: State bleibt unverändert bei Fehler
        if n > self.remaining() {
            return Err(Error::PrematureEndOfPayload {
                position: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Liest ein Array fester Länge.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Returns all unread bytes and moves to the end.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Liest drei f32 (x, y, z).
    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }
}

/// Writes little-endian primitives into a growable byte buffer.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    /// Creates a new empty `ByteWriter`.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    /// Current write position (= number of bytes written so far).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_vec3(&mut self, v: [f32; 3]) {
        for c in v {
            self.write_f32(c);
        }
    }

    /// Reserviert `n` Null-Bytes und gibt deren Startposition zurück.
    ///
    /// Der Bereich wird später per [`ByteWriter::overwrite_at`] gefüllt.
    pub fn reserve_zeroed(&mut self, n: usize) -> usize {
        let start = self.buf.len();
        self.buf.resize(start + n, 0);
        start
    }

    /// Overwrites previously written bytes starting at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if the range `pos..pos + bytes.len()` has not been written yet.
    /// Aufrufer prüfen die Größe vorher (siehe Offset-Patching).
    pub fn overwrite_at(&mut self, pos: usize, bytes: &[u8]) {
        assert!(
            pos + bytes.len() <= self.buf.len(),
            "overwrite_at({pos}, {}) überschreitet Buffer-Länge {}",
            bytes.len(),
            self.buf.len()
        );
        self.buf[pos..pos + bytes.len()].copy_from_slice(bytes);
    }

    /// Returns a reference to the written bytes so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Finalises the writer and returns the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut w = ByteWriter::new();
        w.write_u16(0x0102);
        w.write_u32(0x0304_0506);
        w.write_i16(-2);
        assert_eq!(w.as_slice(), &[0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0xFE, 0xFF]);

        let data = w.into_vec();
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_u16().unwrap(), 0x0102);
        assert_eq!(r.read_u32().unwrap(), 0x0304_0506);
        assert_eq!(r.read_i16().unwrap(), -2);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_reports_position_and_keeps_state() {
        let data = [1u8, 2, 3];
        let mut r = ByteReader::new(&data);
        r.read_u8().unwrap();
        let err = r.read_u32().unwrap_err();
        assert_eq!(err, Error::PrematureEndOfPayload { position: 1, needed: 4, available: 2 });
        // Lesezeiger unverändert
        assert_eq!(r.position(), 1);
        assert_eq!(r.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn vec3_and_f32() {
        let mut w = ByteWriter::new();
        w.write_vec3([1.0, -2.5, 3.25]);
        let data = w.into_vec();
        assert_eq!(data.len(), 12);
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_vec3().unwrap(), [1.0, -2.5, 3.25]);
    }

    #[test]
    fn reserve_then_overwrite() {
        let mut w = ByteWriter::new();
        w.write_u8(0xAA);
        let slot = w.reserve_zeroed(4);
        w.write_u8(0xBB);
        assert_eq!(slot, 1);
        assert_eq!(w.as_slice(), &[0xAA, 0, 0, 0, 0, 0xBB]);
        w.overwrite_at(slot, &7u32.to_le_bytes());
        assert_eq!(w.as_slice(), &[0xAA, 7, 0, 0, 0, 0xBB]);
    }

    #[test]
    #[should_panic(expected = "overwrite_at")]
    fn overwrite_past_end_panics() {
        let mut w = ByteWriter::new();
        w.reserve_zeroed(2);
        w.overwrite_at(1, &[1, 2]);
    }

    #[test]
    fn read_rest_consumes_everything() {
        let data = [9u8, 8, 7, 6];
        let mut r = ByteReader::new(&data);
        r.read_u8().unwrap();
        assert_eq!(r.read_rest(), &[8, 7, 6]);
        assert_eq!(r.remaining(), 0);
    }
}
