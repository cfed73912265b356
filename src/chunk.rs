//! Payload contract between the container core and concrete chunk types.
//!
//! Konkrete Payload-Typen implementieren [`Chunk`]. Der Binder speichert sie
//! typ-gelöscht als `Box<dyn DynChunk>` und gibt sie über Downcasting wieder
//! typisiert heraus.

use core::fmt;
use std::any::Any;

use crate::flags::Flags;
use crate::signature::{Dialect, Signature};
use crate::version::FormatVersion;
use crate::Result;

/// Context handed to every payload decode/encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkContext {
    pub version: FormatVersion,
    pub dialect: Dialect,
}

impl ChunkContext {
    pub fn new(version: FormatVersion, dialect: Dialect) -> Self {
        Self { version, dialect }
    }
}

/// A typed chunk payload.
///
/// `decode` bekommt nur die Payload (ohne Frame-Header); `encode` liefert nur
/// die Payload, die Länge im Frame berechnet der Writer.
pub trait Chunk: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// Logical signature of the frame carrying this payload.
    const SIGNATURE: Signature;

    fn decode(payload: &[u8], ctx: &ChunkContext) -> Result<Self>;

    fn encode(&self, ctx: &ChunkContext) -> Result<Vec<u8>>;
}

/// Payloads whose layout depends on a flags value read from the payload.
pub trait Flagged {
    fn flags(&self) -> Flags;
}

/// Entry tables whose length fixes how many frames of a counted list follow.
pub trait Counted: Chunk {
    fn entry_count(&self) -> usize;
}

/// Payloads that index a fixed-size array of other chunks by relative offset.
pub trait OffsetIndex: Chunk {
    /// Number of entries; must equal the number of referenced chunks.
    fn entry_count(&self) -> usize;

    /// Relative offset of each entry, in entry order.
    fn offsets(&self) -> Vec<u32>;

    /// Replaces all offsets; `offsets.len()` equals [`OffsetIndex::entry_count`].
    fn set_offsets(&mut self, offsets: &[u32]) -> Result<()>;
}

/// Type-erased [`Chunk`].
///
/// Wird über den Blanket-Impl für jeden `Chunk` automatisch implementiert.
pub trait DynChunk: fmt::Debug + Send + Sync {
    fn signature(&self) -> Signature;
    fn encode_dyn(&self, ctx: &ChunkContext) -> Result<Vec<u8>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_box(&self) -> Box<dyn DynChunk>;
    fn eq_dyn(&self, other: &dyn DynChunk) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T: Chunk> DynChunk for T {
    fn signature(&self) -> Signature {
        T::SIGNATURE
    }

    fn encode_dyn(&self, ctx: &ChunkContext) -> Result<Vec<u8>> {
        self.encode(ctx)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DynChunk> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynChunk) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl Clone for Box<dyn DynChunk> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl PartialEq for dyn DynChunk {
    fn eq(&self, other: &Self) -> bool {
        self.eq_dyn(other)
    }
}

/// Decoder stored in a field descriptor.
pub(crate) type DecodeFn = fn(&[u8], &ChunkContext) -> Result<Box<dyn DynChunk>>;

pub(crate) fn decode_boxed<T: Chunk>(payload: &[u8], ctx: &ChunkContext) -> Result<Box<dyn DynChunk>> {
    Ok(Box::new(T::decode(payload, ctx)?))
}

/// An unrecognized or version-inactive frame, kept verbatim for re-emission.
#[derive(Debug, Clone, Eq)]
pub struct OpaqueChunk {
    pub signature: Signature,
    pub payload: Vec<u8>,
    /// Offset des Frames im Quell-Buffer (nur Diagnose).
    pub offset: usize,
    /// Field whose frame physically preceded this one; `None` = before all fields.
    pub after: Option<&'static str>,
}

impl PartialEq for OpaqueChunk {
    // offset ist Herkunftsinformation und kein Inhalt
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature && self.payload == other.payload && self.after == other.after
    }
}
