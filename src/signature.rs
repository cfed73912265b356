//! Chunk signatures (4-byte tags) and the on-disk byte order dialect.
//!
//! Signaturen werden nie semantisch validiert: viele Tags sind reine
//! Kompatibilitäts-Marker, jede 4-Byte-Kombination ist zulässig.

use core::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A 4-byte chunk tag, stored in logical (readable) order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature([u8; 4]);

impl Signature {
    /// Creates a signature from its logical bytes, e.g. `Signature::new(*b"MVER")`.
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Logical bytes (as written in documentation).
    pub const fn bytes(self) -> [u8; 4] {
        self.0
    }

    /// Bytes as they appear on disk in the given dialect.
    pub const fn to_disk(self, dialect: Dialect) -> [u8; 4] {
        match dialect {
            Dialect::Forward => self.0,
            Dialect::Reversed => [self.0[3], self.0[2], self.0[1], self.0[0]],
        }
    }

    /// Interprets on-disk bytes in the given dialect.
    ///
    /// Symmetrisch zu [`Signature::to_disk`]: `from_disk(s.to_disk(d), d) == s`.
    pub const fn from_disk(bytes: [u8; 4], dialect: Dialect) -> Self {
        match dialect {
            Dialect::Forward => Self(bytes),
            Dialect::Reversed => Self([bytes[3], bytes[2], bytes[1], bytes[0]]),
        }
    }

    /// `true` wenn alle vier Bytes druckbares ASCII sind.
    pub fn is_printable(self) -> bool {
        self.0.iter().all(|b| b.is_ascii_graphic() || *b == b' ')
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(\"{self}\")")
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| Error::invalid_payload(format!("signature '{s}' is not exactly 4 bytes")))?;
        Ok(Self(bytes))
    }
}

/// Byte order of the signature on disk.
///
/// Die Engine speichert Signaturen als little-endian u32, d.h. `MVER`
/// steht als `REVM` im Buffer. Manche Container (z.B. Texture-Blobs aus
/// Tools) schreiben sie in Lesereihenfolge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Signature bytes are stored in logical order.
    Forward,
    /// Signature bytes are stored reversed (engine default).
    #[default]
    Reversed,
}
