//! Pending offset state of one index chunk during a save.
//!
//! Lebt nur innerhalb eines `serialize`-Aufrufs; nichts davon wird im
//! Dokument gespeichert.

use log::trace;

use crate::byteio::ByteWriter;
use crate::frame::FRAME_HEADER_LEN;
use crate::signature::Signature;
use crate::{Error, Result};

/// Zero-filled placeholder for an index frame whose offsets are not known yet.
#[derive(Debug)]
pub(super) struct Reservation {
    signature: Signature,
    /// Start des Frame-Headers im Ausgabe-Buffer.
    start: usize,
    /// Reservierte Länge inklusive Header.
    len: usize,
}

impl Reservation {
    /// Reserves header plus `payload_len` bytes at the current position.
    pub(super) fn reserve(writer: &mut ByteWriter, signature: Signature, payload_len: usize) -> Self {
        let len = FRAME_HEADER_LEN + payload_len;
        let start = writer.reserve_zeroed(len);
        Self { signature, start, len }
    }

    pub(super) fn payload_start(&self) -> usize {
        self.start + FRAME_HEADER_LEN
    }

    /// Writes the final frame over the placeholder.
    ///
    /// # Errors
    ///
    /// [`Error::OffsetPatchSizeMismatch`] wenn das neu kodierte Frame eine
    /// andere Größe als der Platzhalter hat.
    pub(super) fn patch(self, writer: &mut ByteWriter, frame: &[u8]) -> Result<()> {
        if frame.len() != self.len {
            return Err(Error::OffsetPatchSizeMismatch {
                signature: self.signature,
                reserved: self.len,
                actual: frame.len(),
            });
        }
        writer.overwrite_at(self.start, frame);
        trace!("patched '{}' at {} ({} bytes)", self.signature, self.start, self.len);
        Ok(())
    }
}

/// One dependent frame whose offset still has to go into the index.
#[derive(Debug, Clone, Copy)]
struct PendingOffset {
    entry: usize,
    /// Absolute Startposition des Ziel-Frames.
    target: usize,
}

/// Offsets recorded while the dependents of one index are written.
#[derive(Debug)]
pub(super) struct PendingOffsets {
    /// Signatur der abhängigen Frames (für Fehlermeldungen).
    signature: Signature,
    base: usize,
    entries: Vec<PendingOffset>,
}

impl PendingOffsets {
    pub(super) fn new(signature: Signature, base: usize, capacity: usize) -> Self {
        Self { signature, base, entries: Vec::with_capacity(capacity) }
    }

    /// Records that entry `entry` points at a frame starting at `target`.
    pub(super) fn record(&mut self, entry: usize, target: usize) {
        self.entries.push(PendingOffset { entry, target });
    }

    /// Relative offsets in entry order.
    ///
    /// # Errors
    ///
    /// [`Error::OffsetOutOfRange`] wenn ein Ziel vor der Basis liegt oder der
    /// Abstand nicht in ein u32 passt.
    pub(super) fn resolve(mut self) -> Result<Vec<u32>> {
        self.entries.sort_by_key(|p| p.entry);
        self.entries
            .iter()
            .map(|p| {
                p.target
                    .checked_sub(self.base)
                    .and_then(|rel| u32::try_from(rel).ok())
                    .ok_or(Error::OffsetOutOfRange { signature: self.signature, target: p.target, base: self.base })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXBT: Signature = Signature::new(*b"TXBT");
    const TXMD: Signature = Signature::new(*b"TXMD");

    #[test]
    fn reservation_patches_in_place() {
        let mut w = ByteWriter::new();
        w.write_u8(0xEE);
        let r = Reservation::reserve(&mut w, TXBT, 4);
        assert_eq!(r.payload_start(), 9);
        w.write_u8(0xFF);
        r.patch(&mut w, &[1; 12]).unwrap();
        let mut expected = vec![0xEE];
        expected.extend([1; 12]);
        expected.push(0xFF);
        assert_eq!(w.as_slice(), expected.as_slice());
    }

    #[test]
    fn size_mismatch_is_reported() {
        let mut w = ByteWriter::new();
        let r = Reservation::reserve(&mut w, TXBT, 4);
        let err = r.patch(&mut w, &[0; 16]).unwrap_err();
        assert_eq!(err, Error::OffsetPatchSizeMismatch { signature: TXBT, reserved: 12, actual: 16 });
        // Buffer bleibt unverändert
        assert_eq!(w.as_slice(), &[0; 12]);
    }

    #[test]
    fn offsets_resolve_in_entry_order() {
        let mut p = PendingOffsets::new(TXMD, 100, 3);
        p.record(1, 110);
        p.record(0, 100);
        p.record(2, 124);
        assert_eq!(p.resolve().unwrap(), [0, 10, 24]);
    }

    #[test]
    fn target_before_base_is_out_of_range() {
        let mut p = PendingOffsets::new(TXMD, 50, 1);
        p.record(0, 40);
        assert_eq!(
            p.resolve().unwrap_err(),
            Error::OffsetOutOfRange { signature: TXMD, target: 40, base: 50 }
        );
    }
}
