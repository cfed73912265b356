//! Offset-patching writer: serializes bound fields back into frames.
//!
//! Felder werden in deklarierter Reihenfolge geschrieben. Ein Index-Feld,
//! auf das ein aktives Array-Feld verweist, wird in zwei Schritten
//! geschrieben:
//!
//! 1. Platzhalter in finaler Größe reservieren (Anzahl Einträge == Anzahl
//!    Array-Elemente).
//! 2. Die Array-Elemente direkt dahinter schreiben und ihre Startpositionen
//!    relativ zur Basis festhalten.
//! 3. Index mit den echten Offsets neu kodieren und den Platzhalter
//!    überschreiben.
//!
//! Opaque Chunks werden hinter dem Feld ausgegeben, hinter dem sie beim
//! Lesen physisch lagen.

mod pending;

use log::trace;

use crate::binder::{check_counts, BoundFields, Slot};
use crate::byteio::ByteWriter;
use crate::chunk::{ChunkContext, DynChunk, OpaqueChunk};
use crate::frame::{encode_frame, write_frame, FrameSpan};
use crate::schema::{FieldDescriptor, Multiplicity, OffsetBase, Schema};
use crate::signature::{Dialect, Signature};
use crate::{Error, FastHashMap, Result};

use pending::{PendingOffsets, Reservation};

/// Output buffer plus the start of the first frame written per signature.
///
/// `OffsetBase::FirstDependent` zählt ab dem ersten Frame mit der
/// Array-Signatur im ganzen Buffer, opaque Frames eingeschlossen.
struct Output {
    w: ByteWriter,
    dialect: Dialect,
    first_at: FastHashMap<Signature, usize>,
}

impl Output {
    fn new(dialect: Dialect) -> Self {
        Self { w: ByteWriter::new(), dialect, first_at: FastHashMap::default() }
    }

    fn frame(&mut self, signature: Signature, payload: &[u8]) -> Result<FrameSpan> {
        let span = write_frame(&mut self.w, signature, payload, self.dialect)?;
        self.first_at.entry(signature).or_insert(span.start);
        Ok(span)
    }

    fn first_frame(&self, signature: Signature) -> Option<usize> {
        self.first_at.get(&signature).copied()
    }
}

/// Serializes `fields` and `opaque` according to `schema`.
///
/// # Errors
///
/// [`Error::IndexCountMismatch`], [`Error::OffsetPatchSizeMismatch`],
/// [`Error::OffsetOutOfRange`], [`Error::ChunkTooLarge`],
/// [`Error::RequiredChunkMissing`] (fehlendes Pflichtfeld oder
/// Array-Elemente ohne Index) sowie alle Fehler der Payload-Encoder.
/// [`Error::IndexCountMismatch`] auch für gezählte Listen, deren Länge nicht
/// zur Eintragszahl ihres Zählfeldes passt.
pub(crate) fn serialize(
    schema: &Schema,
    fields: &BoundFields,
    opaque: &[OpaqueChunk],
    ctx: &ChunkContext,
) -> Result<Vec<u8>> {
    for field in schema.fields() {
        if field.is_required(ctx.version) && fields.slot(field.name()).map_or(true, Slot::is_empty) {
            return Err(Error::RequiredChunkMissing { field: field.name(), signature: field.signature() });
        }
    }

    check_counts(schema, fields, ctx.version)?;

    let mut out = Output::new(ctx.dialect);

    write_opaque(&mut out, opaque, None)?;

    for field in schema.fields() {
        let Some(slot) = fields.slot(field.name()) else {
            continue;
        };
        if field.is_active(ctx.version) {
            match field.multiplicity() {
                Multiplicity::Single | Multiplicity::Optional => {
                    if let Slot::Single(Some(value)) = slot {
                        match active_array_for(schema, field, ctx) {
                            Some(array) => write_indexed(&mut out, field, &**value, array, fields, ctx)?,
                            None => write_value(&mut out, field, &**value, ctx)?,
                        }
                    }
                }
                Multiplicity::List => {
                    if let Slot::Many(values) = slot {
                        for value in values {
                            write_value(&mut out, field, &**value, ctx)?;
                        }
                    }
                }
                Multiplicity::Array { index, .. } => {
                    // Elemente werden zusammen mit ihrem Index geschrieben
                    let index_bound = fields.slot(index).is_some_and(|s| !s.is_empty())
                        && schema.field(index).is_some_and(|f| f.is_active(ctx.version));
                    if !slot.is_empty() && !index_bound {
                        let signature = schema.field(index).map_or(field.signature(), |f| f.signature());
                        return Err(Error::RequiredChunkMissing { field: index, signature });
                    }
                }
            }
        }
        write_opaque(&mut out, opaque, Some(field.name()))?;
    }

    // Anker, die das Schema nicht kennt (manuell konstruierte Opaques)
    for chunk in opaque {
        if let Some(after) = chunk.after {
            if schema.field(after).is_none() {
                out.frame(chunk.signature, &chunk.payload)?;
            }
        }
    }

    Ok(out.w.into_vec())
}

fn active_array_for<'s>(schema: &'s Schema, index: &FieldDescriptor, ctx: &ChunkContext) -> Option<&'s FieldDescriptor> {
    if !index.is_index() {
        return None;
    }
    schema.array_for_index(index.name()).filter(|a| a.is_active(ctx.version))
}

fn write_value(out: &mut Output, field: &FieldDescriptor, value: &dyn DynChunk, ctx: &ChunkContext) -> Result<()> {
    let payload = value.encode_dyn(ctx)?;
    let span = out.frame(field.signature(), &payload)?;
    trace!("'{}' {} -> {}..{}", field.signature(), field.name(), span.start, span.end);
    Ok(())
}

fn write_opaque(out: &mut Output, opaque: &[OpaqueChunk], after: Option<&str>) -> Result<()> {
    for chunk in opaque.iter().filter(|c| c.after == after) {
        out.frame(chunk.signature, &chunk.payload)?;
    }
    Ok(())
}

/// Schreibt ein Index-Feld samt seinen Array-Elementen und patcht die Offsets.
fn write_indexed(
    out: &mut Output,
    index: &FieldDescriptor,
    value: &dyn DynChunk,
    array: &FieldDescriptor,
    fields: &BoundFields,
    ctx: &ChunkContext,
) -> Result<()> {
    let Multiplicity::Array { base, .. } = array.multiplicity() else {
        return write_value(out, index, value, ctx);
    };
    let ops = index
        .index_ops
        .ok_or_else(|| Error::invalid_schema(format!("'{}' is not an offset index", index.name())))?;
    let mismatch = || Error::FieldTypeMismatch { field: index.name(), expected: index.type_name() };

    let elements: &[Box<dyn DynChunk>] = match fields.slot(array.name()) {
        Some(Slot::Many(v)) => v,
        _ => &[],
    };
    let entries = (ops.entry_count)(value).ok_or_else(mismatch)?;
    if entries != elements.len() {
        return Err(Error::IndexCountMismatch { index: index.name(), entries, elements: elements.len() });
    }

    let placeholder = value.encode_dyn(ctx)?;
    let reservation = Reservation::reserve(&mut out.w, index.signature(), placeholder.len());
    let base_pos = match base {
        // Ein früher geschriebener Frame mit der Array-Signatur ist die Basis
        OffsetBase::FirstDependent => out.first_frame(array.signature()).unwrap_or(out.w.position()),
        OffsetBase::IndexPayloadStart => reservation.payload_start(),
        OffsetBase::StreamStart => 0,
    };

    let mut pending = PendingOffsets::new(array.signature(), base_pos, elements.len());
    for (entry, element) in elements.iter().enumerate() {
        let payload = element.encode_dyn(ctx)?;
        let span = out.frame(array.signature(), &payload)?;
        pending.record(entry, span.start);
    }
    let offsets = pending.resolve()?;
    trace!("'{}' {}: offsets {:?} (base {base_pos})", index.signature(), index.name(), offsets);

    let mut patched = value.clone_box();
    (ops.set_offsets)(&mut *patched, &offsets).ok_or_else(mismatch)??;
    let frame = encode_frame(index.signature(), &patched.encode_dyn(ctx)?, ctx.dialect)?;
    reservation.patch(&mut out.w, &frame)
}
