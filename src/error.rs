//! Central error types for the chunked container engine.
//!
//! Jeder Fehler trägt genug Kontext (Signatur, Byte-Offset, Feldname) um
//! ihn ohne Debugger zu diagnostizieren.

use core::fmt;
use std::borrow::Cow;

use crate::signature::Signature;
use crate::version::FormatVersion;

/// All errors raised while framing, binding, patching or decoding payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The buffer ends before a complete chunk frame (header or payload).
    TruncatedFrame {
        /// Byte offset of the frame header.
        offset: usize,
        /// Signature, wenn noch mindestens 4 Bytes lesbar waren.
        signature: Option<Signature>,
        /// Bytes the frame needs from `offset` on.
        needed: u64,
        /// Bytes actually left from `offset` on.
        available: usize,
    },
    /// A payload is shorter than the fields it declares.
    PrematureEndOfPayload {
        /// Position inside the payload where the read started.
        position: usize,
        needed: usize,
        available: usize,
    },
    /// A payload failed to decode; wraps the inner error with chunk context.
    ChunkDecode {
        signature: Signature,
        /// Byte offset of the frame in the source buffer.
        offset: usize,
        source: Box<Error>,
    },
    /// A payload is structurally invalid.
    InvalidPayload(Cow<'static, str>),
    /// A mandatory field had no matching frame for the active version.
    RequiredChunkMissing {
        field: &'static str,
        signature: Signature,
    },
    /// The patched index chunk differs in size from its reserved placeholder.
    ///
    /// Vertragsbruch: Die Collection wurde zwischen Reservierung und Patch
    /// verändert oder die Payload-Größe ist nicht deterministisch.
    OffsetPatchSizeMismatch {
        signature: Signature,
        reserved: usize,
        actual: usize,
    },
    /// The index entry count does not match the number of bound array elements.
    IndexCountMismatch {
        index: &'static str,
        entries: usize,
        elements: usize,
    },
    /// A relative offset cannot be represented (negative or above `u32::MAX`).
    OffsetOutOfRange {
        signature: Signature,
        target: usize,
        base: usize,
    },
    /// An offset-directed lookup found a different chunk than expected.
    UnexpectedSignature {
        expected: Signature,
        found: Signature,
        offset: usize,
    },
    /// An unrecognized chunk was found while unknown chunks are rejected.
    UnknownChunk { signature: Signature, offset: usize },
    /// A chunk payload exceeds the representable or configured size.
    ChunkTooLarge { signature: Signature, length: usize },
    /// A field name that the schema does not declare.
    UnknownField(Cow<'static, str>),
    /// A field was accessed with a payload type or multiplicity it does not have.
    FieldTypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    /// A field that is not valid for the document's active version.
    InactiveField {
        field: &'static str,
        version: FormatVersion,
    },
    /// A conditional field that is absent under the current flags.
    FieldAbsent {
        layout: &'static str,
        field: &'static str,
    },
    /// A schema declaration is inconsistent.
    InvalidSchema(Cow<'static, str>),
    /// An invalid combination of container options.
    InvalidOptionCombination(&'static str),
    /// A format version name that is not known.
    UnknownFormatVersion(String),
    /// An IO error (nur CLI/Aufrufer, der Kern selbst macht kein IO).
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedFrame { offset, signature, needed, available } => match signature {
                Some(sig) => write!(
                    f,
                    "truncated frame '{sig}' at offset {offset}: needs {needed} bytes, {available} available"
                ),
                None => write!(
                    f,
                    "truncated frame at offset {offset}: needs {needed} bytes, {available} available"
                ),
            },
            Self::PrematureEndOfPayload { position, needed, available } => write!(
                f,
                "premature end of payload at position {position}: needs {needed} bytes, {available} available"
            ),
            Self::ChunkDecode { signature, offset, source } => {
                write!(f, "chunk '{signature}' at offset {offset}: {source}")
            }
            Self::InvalidPayload(msg) => write!(f, "invalid payload: {msg}"),
            Self::RequiredChunkMissing { field, signature } => {
                write!(f, "required chunk '{signature}' for field '{field}' is missing")
            }
            Self::OffsetPatchSizeMismatch { signature, reserved, actual } => write!(
                f,
                "offset patch size mismatch for '{signature}': reserved {reserved} bytes, patched frame has {actual}"
            ),
            Self::IndexCountMismatch { index, entries, elements } => write!(
                f,
                "index '{index}' declares {entries} entries but {elements} elements are bound"
            ),
            Self::OffsetOutOfRange { signature, target, base } => write!(
                f,
                "offset of '{signature}' at {target} is not representable relative to base {base}"
            ),
            Self::UnexpectedSignature { expected, found, offset } => write!(
                f,
                "expected chunk '{expected}' at offset {offset}, found '{found}'"
            ),
            Self::UnknownChunk { signature, offset } => {
                write!(f, "unknown chunk '{signature}' at offset {offset}")
            }
            Self::ChunkTooLarge { signature, length } => {
                write!(f, "chunk '{signature}' payload of {length} bytes is too large")
            }
            Self::UnknownField(name) => write!(f, "unknown field '{name}'"),
            Self::FieldTypeMismatch { field, expected } => {
                write!(f, "field '{field}' holds {expected}")
            }
            Self::InactiveField { field, version } => {
                write!(f, "field '{field}' is not valid for version {version}")
            }
            Self::FieldAbsent { layout, field } => {
                write!(f, "field '{field}' of layout '{layout}' is absent under the current flags")
            }
            Self::InvalidSchema(msg) => write!(f, "invalid schema: {msg}"),
            Self::InvalidOptionCombination(msg) => write!(f, "invalid option combination: {msg}"),
            Self::UnknownFormatVersion(name) => write!(f, "unknown format version '{name}'"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

impl Error {
    /// Erstellt einen `InvalidPayload` Fehler mit Nachricht.
    pub fn invalid_payload(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// Erstellt einen `InvalidSchema` Fehler mit Nachricht.
    pub fn invalid_schema(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    /// Erstellt einen `UnknownField` Fehler.
    pub fn unknown_field(name: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownField(name.into())
    }

    /// Wraps a payload error with the chunk it came from.
    ///
    /// Bereits gewrappte Fehler werden nicht doppelt verpackt.
    pub fn in_chunk(signature: Signature, offset: usize, source: Error) -> Self {
        match source {
            e @ Self::ChunkDecode { .. } => e,
            e => Self::ChunkDecode {
                signature,
                offset,
                source: Box::new(e),
            },
        }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
