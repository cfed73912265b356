//! Chunk frame codec: `{signature: 4 bytes, length: u32 LE, payload}`.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{Dialect, Signature};
//! use chunkdoc::frame::{decode_frame, encode_frame};
//!
//! let sig = Signature::new(*b"MVER");
//! let bytes = encode_frame(sig, &18u32.to_le_bytes(), Dialect::Reversed).unwrap();
//! assert_eq!(&bytes[..4], b"REVM");
//!
//! let (frame, next) = decode_frame(&bytes, 0, Dialect::Reversed).unwrap();
//! assert_eq!(frame.signature, sig);
//! assert_eq!(frame.payload, &18u32.to_le_bytes());
//! assert_eq!(next, bytes.len());
//! ```

use memchr::memmem;

use crate::byteio::ByteWriter;
use crate::signature::{Dialect, Signature};
use crate::{Error, Result};

/// Size of the frame header (signature + length).
pub const FRAME_HEADER_LEN: usize = 8;

/// One chunk frame as a view into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub signature: Signature,
    /// Byte offset of the frame header in the source buffer.
    pub offset: usize,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Byte offset of the first payload byte.
    pub fn payload_offset(&self) -> usize {
        self.offset + FRAME_HEADER_LEN
    }

    /// Byte offset directly after the frame.
    pub fn end(&self) -> usize {
        self.payload_offset() + self.payload.len()
    }

    /// Header plus payload length.
    pub fn total_len(&self) -> usize {
        FRAME_HEADER_LEN + self.payload.len()
    }
}

/// Start and end position of a frame written by [`write_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: usize,
    pub end: usize,
}

/// Decodes the frame starting at `cursor`.
///
/// Returns the frame and the cursor of the following frame.
///
/// # Errors
///
/// [`Error::TruncatedFrame`] wenn weniger als 8 Bytes übrig sind oder die
/// deklarierte Länge den restlichen Buffer überschreitet.
pub fn decode_frame(buffer: &[u8], cursor: usize, dialect: Dialect) -> Result<(Frame<'_>, usize)> {
    let available = buffer.len().saturating_sub(cursor);
    if available < FRAME_HEADER_LEN {
        let signature = (available >= 4).then(|| {
            let mut tag = [0u8; 4];
            tag.copy_from_slice(&buffer[cursor..cursor + 4]);
            Signature::from_disk(tag, dialect)
        });
        return Err(Error::TruncatedFrame {
            offset: cursor,
            signature,
            needed: FRAME_HEADER_LEN as u64,
            available,
        });
    }

    let mut tag = [0u8; 4];
    tag.copy_from_slice(&buffer[cursor..cursor + 4]);
    let signature = Signature::from_disk(tag, dialect);
    let mut len = [0u8; 4];
    len.copy_from_slice(&buffer[cursor + 4..cursor + 8]);
    let length = u32::from_le_bytes(len);

    let needed = FRAME_HEADER_LEN as u64 + u64::from(length);
    if needed > available as u64 {
        return Err(Error::TruncatedFrame {
            offset: cursor,
            signature: Some(signature),
            needed,
            available,
        });
    }

    let start = cursor + FRAME_HEADER_LEN;
    let end = start + length as usize;
    let frame = Frame {
        signature,
        offset: cursor,
        payload: &buffer[start..end],
    };
    Ok((frame, end))
}

/// Encodes one frame into a fresh buffer.
///
/// Die Länge wird immer aus `payload.len()` berechnet.
pub fn encode_frame(signature: Signature, payload: &[u8], dialect: Dialect) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(FRAME_HEADER_LEN + payload.len());
    write_frame(&mut writer, signature, payload, dialect)?;
    Ok(writer.into_vec())
}

/// Appends one frame to `writer` and returns where it landed.
///
/// # Errors
///
/// [`Error::ChunkTooLarge`] wenn die Payload nicht in ein u32-Längenfeld passt.
pub fn write_frame(
    writer: &mut ByteWriter,
    signature: Signature,
    payload: &[u8],
    dialect: Dialect,
) -> Result<FrameSpan> {
    let length = u32::try_from(payload.len()).map_err(|_| Error::ChunkTooLarge {
        signature,
        length: payload.len(),
    })?;
    let start = writer.position();
    writer.write_bytes(&signature.to_disk(dialect));
    writer.write_u32(length);
    writer.write_bytes(payload);
    Ok(FrameSpan { start, end: writer.position() })
}

/// Lazy iterator over all frames of a buffer.
///
/// Nach dem ersten Fehler liefert der Iterator nichts mehr (Terminal-State).
pub struct Frames<'a> {
    buffer: &'a [u8],
    cursor: usize,
    dialect: Dialect,
    failed: bool,
}

/// Iterates the frames of `buffer` from the start.
pub fn frames(buffer: &[u8], dialect: Dialect) -> Frames<'_> {
    Frames { buffer, cursor: 0, dialect, failed: false }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.buffer.len() {
            return None;
        }
        match decode_frame(self.buffer, self.cursor, self.dialect) {
            Ok((frame, next)) => {
                self.cursor = next;
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Finds the next occurrence of `signature` at or after `from`.
///
/// Reiner Byte-Scan: Treffer können auch innerhalb einer Payload liegen,
/// daher nur für Tooling/Diagnose gedacht, nicht für das Binding.
pub fn seek_signature(buffer: &[u8], signature: Signature, dialect: Dialect, from: usize) -> Option<usize> {
    let haystack = buffer.get(from..)?;
    memmem::find(haystack, &signature.to_disk(dialect)).map(|pos| from + pos)
}
