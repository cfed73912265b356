//! Texture blob payloads (TXVR, TXBT, TXMD).
//!
//! TXBT ist ein Offset-Index: jeder Eintrag zeigt relativ auf einen
//! TXMD-Frame, der hinter dem Index geschrieben wird.

use crate::byteio::{ByteReader, ByteWriter};
use crate::chunk::{Chunk, ChunkContext, OffsetIndex};
use crate::formats::{expect_end, read_entries, write_entries, Entry};
use crate::signature::Signature;
use crate::{Error, Result};

/// Texture blob version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Txvr {
    pub version: u32,
}

impl Chunk for Txvr {
    const SIGNATURE: Signature = Signature::new(*b"TXVR");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        let mut r = ByteReader::new(payload);
        let version = r.read_u32()?;
        expect_end(Self::SIGNATURE, &r)?;
        Ok(Self { version })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(self.version.to_le_bytes().to_vec())
    }
}

/// One texture entry of the blob index (12 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxbtEntry {
    pub filename_offset: u32,
    /// Relativ zum Start des ersten TXMD-Frames.
    pub txmd_offset: u32,
    pub size_x: u8,
    pub size_y: u8,
    /// Bits 0..6: Anzahl Mip-Level, Bit 7: geladen.
    pub level_info: u8,
    /// Bits 0..4: Kompressionstyp, Rest Flags.
    pub format_flags: u8,
}

impl Entry for TxbtEntry {
    const SIZE: usize = 12;

    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            filename_offset: r.read_u32()?,
            txmd_offset: r.read_u32()?,
            size_x: r.read_u8()?,
            size_y: r.read_u8()?,
            level_info: r.read_u8()?,
            format_flags: r.read_u8()?,
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.filename_offset);
        w.write_u32(self.txmd_offset);
        w.write_u8(self.size_x);
        w.write_u8(self.size_y);
        w.write_u8(self.level_info);
        w.write_u8(self.format_flags);
    }
}

/// Blob texture index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Txbt {
    pub entries: Vec<TxbtEntry>,
}

impl Chunk for Txbt {
    const SIGNATURE: Signature = Signature::new(*b"TXBT");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        Ok(Self { entries: read_entries(Self::SIGNATURE, payload)? })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(write_entries(&self.entries))
    }
}

impl OffsetIndex for Txbt {
    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn offsets(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.txmd_offset).collect()
    }

    fn set_offsets(&mut self, offsets: &[u32]) -> Result<()> {
        if offsets.len() != self.entries.len() {
            return Err(Error::IndexCountMismatch {
                index: "TXBT",
                entries: self.entries.len(),
                elements: offsets.len(),
            });
        }
        for (entry, offset) in self.entries.iter_mut().zip(offsets) {
            entry.txmd_offset = *offset;
        }
        Ok(())
    }
}

/// Raw texture data of one blob entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Txmd {
    pub data: Vec<u8>,
}

impl Chunk for Txmd {
    const SIGNATURE: Signature = Signature::new(*b"TXMD");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        Ok(Self { data: payload.to_vec() })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Dialect;
    use crate::version::FormatVersion;

    fn ctx() -> ChunkContext {
        ChunkContext::new(FormatVersion::Legion, Dialect::Reversed)
    }

    #[test]
    fn txbt_entry_layout() {
        let txbt = Txbt {
            entries: vec![TxbtEntry {
                filename_offset: 1,
                txmd_offset: 0x0A0B,
                size_x: 64,
                size_y: 32,
                level_info: 0x87,
                format_flags: 2,
            }],
        };
        let bytes = txbt.encode(&ctx()).unwrap();
        assert_eq!(bytes, [1, 0, 0, 0, 0x0B, 0x0A, 0, 0, 64, 32, 0x87, 2]);
        assert_eq!(Txbt::decode(&bytes, &ctx()).unwrap(), txbt);
    }

    #[test]
    fn offsets_read_and_replace_txmd_offsets() {
        let mut txbt = Txbt { entries: vec![TxbtEntry::default(); 3] };
        assert_eq!(txbt.entry_count(), 3);
        txbt.set_offsets(&[0, 10, 24]).unwrap();
        assert_eq!(txbt.offsets(), [0, 10, 24]);
        assert_eq!(
            txbt.set_offsets(&[1]).unwrap_err(),
            Error::IndexCountMismatch { index: "TXBT", entries: 3, elements: 1 }
        );
    }

    #[test]
    fn patched_index_keeps_its_size() {
        let mut txbt = Txbt { entries: vec![TxbtEntry::default(); 2] };
        let before = txbt.encode(&ctx()).unwrap().len();
        txbt.set_offsets(&[0, u32::MAX]).unwrap();
        assert_eq!(txbt.encode(&ctx()).unwrap().len(), before);
    }
}
