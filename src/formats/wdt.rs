//! Fog table payloads (VFOG, VFEX).
//!
//! VFOG ist eine Tabelle fester Einträge; pro Eintrag folgt ab TWW genau ein
//! VFEX-Chunk. Der Inhalt der Einträge wird nicht interpretiert.

use crate::byteio::{ByteReader, ByteWriter};
use crate::chunk::{Chunk, ChunkContext, Counted};
use crate::formats::{read_entries, write_entries, Entry};
use crate::signature::Signature;
use crate::Result;

/// Size of one volume fog record.
pub const VFOG_ENTRY_SIZE: usize = 248;

/// One volume fog record, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfogEntry {
    /// Immer genau [`VFOG_ENTRY_SIZE`] Bytes.
    data: Vec<u8>,
}

impl VfogEntry {
    /// A record from raw bytes; `None` unless `data` is exactly one record long.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        (data.len() == VFOG_ENTRY_SIZE).then(|| Self { data: data.to_vec() })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Fog id (first u32 of the record).
    pub fn id(&self) -> u32 {
        u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
    }
}

impl Default for VfogEntry {
    fn default() -> Self {
        Self { data: vec![0; VFOG_ENTRY_SIZE] }
    }
}

impl Entry for VfogEntry {
    const SIZE: usize = VFOG_ENTRY_SIZE;

    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self { data: r.read_bytes(VFOG_ENTRY_SIZE)?.to_vec() })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_bytes(&self.data);
    }
}

/// Volume fogs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vfog {
    pub entries: Vec<VfogEntry>,
}

impl Chunk for Vfog {
    const SIGNATURE: Signature = Signature::new(*b"VFOG");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        Ok(Self { entries: read_entries(Self::SIGNATURE, payload)? })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(write_entries(&self.entries))
    }
}

impl Counted for Vfog {
    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

raw_chunk!(
    /// Extended volume fog data, one chunk per fog entry.
    Vfex,
    b"VFEX"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Dialect;
    use crate::version::FormatVersion;
    use crate::Error;

    fn ctx() -> ChunkContext {
        ChunkContext::new(FormatVersion::TheWarWithin, Dialect::Reversed)
    }

    #[test]
    fn vfog_splits_into_fixed_records() {
        let mut bytes = vec![0u8; 2 * VFOG_ENTRY_SIZE];
        bytes[VFOG_ENTRY_SIZE] = 7;
        let vfog = Vfog::decode(&bytes, &ctx()).unwrap();
        assert_eq!(vfog.entry_count(), 2);
        assert_eq!(vfog.entries[0].id(), 0);
        assert_eq!(vfog.entries[1].id(), 7);
        assert_eq!(vfog.encode(&ctx()).unwrap(), bytes);
        assert!(Vfog::decode(&[], &ctx()).unwrap().entries.is_empty());
    }

    #[test]
    fn vfog_rejects_partial_record() {
        let err = Vfog::decode(&[0; VFOG_ENTRY_SIZE + 1], &ctx()).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)), "{err}");
    }

    #[test]
    fn vfog_entry_from_bytes_checks_length() {
        assert!(VfogEntry::from_bytes(&[0; 4]).is_none());
        let entry = VfogEntry::from_bytes(&[1; VFOG_ENTRY_SIZE]).unwrap();
        assert_eq!(entry.as_bytes().len(), VFOG_ENTRY_SIZE);
        assert_eq!(entry.id(), 0x0101_0101);
    }
}
