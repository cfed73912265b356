//! Concrete chunk payloads for terrain tiles, texture blobs, world models
//! and fog tables.
//!
//! Diese Typen sind Kollaborateure des Kerns: sie implementieren nur den
//! [`Chunk`]-Vertrag und kennen weder Frames noch Schemas.

use crate::byteio::{ByteReader, ByteWriter};
use crate::chunk::{Chunk, ChunkContext};
use crate::signature::Signature;
use crate::{Error, Result};

/// Declares a payload type whose bytes are kept verbatim.
macro_rules! raw_chunk {
    ($(#[$meta:meta])* $name:ident, $sig:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            pub data: Vec<u8>,
        }

        impl $crate::chunk::Chunk for $name {
            const SIGNATURE: $crate::signature::Signature = $crate::signature::Signature::new(*$sig);

            fn decode(payload: &[u8], _ctx: &$crate::chunk::ChunkContext) -> $crate::Result<Self> {
                Ok(Self { data: payload.to_vec() })
            }

            fn encode(&self, _ctx: &$crate::chunk::ChunkContext) -> $crate::Result<Vec<u8>> {
                Ok(self.data.clone())
            }
        }
    };
}

pub mod adt;
pub mod tex;
pub mod wdt;
pub mod wmo;

/// Fixed-size record inside an entry table payload.
pub(crate) trait Entry: Sized {
    const SIZE: usize;

    fn read(reader: &mut ByteReader<'_>) -> Result<Self>;

    fn write(&self, writer: &mut ByteWriter);
}

/// Reads a payload that is a plain table of `T` records.
///
/// Die Payload-Länge muss ein Vielfaches von `T::SIZE` sein; Restbytes
/// würden beim Schreiben verloren gehen.
pub(crate) fn read_entries<T: Entry>(signature: Signature, payload: &[u8]) -> Result<Vec<T>> {
    if payload.len() % T::SIZE != 0 {
        return Err(Error::invalid_payload(format!(
            "{signature}: {} bytes is not a multiple of the {}-byte entry size",
            payload.len(),
            T::SIZE
        )));
    }
    let mut reader = ByteReader::new(payload);
    let mut out = Vec::with_capacity(payload.len() / T::SIZE);
    while !reader.is_empty() {
        out.push(T::read(&mut reader)?);
    }
    Ok(out)
}

pub(crate) fn write_entries<T: Entry>(entries: &[T]) -> Vec<u8> {
    let mut writer = ByteWriter::with_capacity(entries.len() * T::SIZE);
    for entry in entries {
        entry.write(&mut writer);
    }
    writer.into_vec()
}

/// Fails if `reader` still holds bytes.
pub(crate) fn expect_end(signature: Signature, reader: &ByteReader<'_>) -> Result<()> {
    if reader.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_payload(format!("{signature}: {} trailing bytes", reader.remaining())))
    }
}

/// MVER: file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mver {
    pub version: u32,
}

impl Chunk for Mver {
    const SIGNATURE: Signature = Signature::new(*b"MVER");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        let mut reader = ByteReader::new(payload);
        let version = reader.read_u32()?;
        expect_end(Self::SIGNATURE, &reader)?;
        Ok(Self { version })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(self.version.to_le_bytes().to_vec())
    }
}
