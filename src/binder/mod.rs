//! Field binder: maps the physical frame stream onto a schema's fields.
//!
//! Ablauf:
//! 1. Alle Frames einmal lesen (Offsets + Payload-Slices, kein Kopieren).
//! 2. Sequenzieller Pass in physischer Reihenfolge für single/optional/list.
//!    Frames mit der Signatur eines aktiven Array-Feldes bleiben liegen.
//! 3. Pflichtfelder und gezählte Listen prüfen.
//! 4. Array-Pass: Elemente über die relativen Offsets des Index-Feldes finden.
//! 5. Alles Nicht-Gebundene wird zu [`OpaqueChunk`]s, verankert hinter dem
//!    Feld, dessen Frame physisch davor lag.
//!
//! Die deklarierte Reihenfolge der Felder spielt beim Lesen keine Rolle,
//! sie steuert nur die Emission beim Schreiben.

use log::{debug, trace};

use crate::chunk::{ChunkContext, DynChunk, OpaqueChunk};
use crate::frame::{decode_frame, frames, Frame};
use crate::options::{ContainerOptions, UnknownChunkPolicy};
use crate::schema::{FieldDescriptor, Multiplicity, OffsetBase, Schema};
use crate::version::FormatVersion;
use crate::{Error, FastHashMap, FastIndexMap, Result};

/// Storage of one bound field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    /// single und optional
    Single(Option<Box<dyn DynChunk>>),
    /// list und array
    Many(Vec<Box<dyn DynChunk>>),
}

impl Slot {
    fn for_field(field: &FieldDescriptor) -> Self {
        if field.multiplicity().is_single() {
            Self::Single(None)
        } else {
            Self::Many(Vec::new())
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Single(v) => v.is_none(),
            Self::Many(v) => v.is_empty(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Single(v) => usize::from(v.is_some()),
            Self::Many(v) => v.len(),
        }
    }
}

/// Bound values of every schema field, keyed by field name in declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct BoundFields {
    slots: FastIndexMap<&'static str, Slot>,
}

impl BoundFields {
    /// Empty slots for every field of `schema`.
    pub(crate) fn new(schema: &Schema) -> Self {
        let slots = schema.fields().iter().map(|f| (f.name(), Slot::for_field(f))).collect();
        Self { slots }
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.get_mut(name)
    }

    pub(crate) fn single(&self, name: &str) -> Option<&dyn DynChunk> {
        match self.slots.get(name)? {
            Slot::Single(v) => v.as_deref(),
            Slot::Many(_) => None,
        }
    }
}

/// Result of binding one buffer.
#[derive(Debug)]
pub(crate) struct Binding {
    pub fields: BoundFields,
    pub opaque: Vec<OpaqueChunk>,
}

/// Zustand eines list-Feldes während des sequenziellen Passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    NotStarted,
    Open,
    Closed,
}

/// Binds `buffer` to `schema`.
///
/// # Errors
///
/// Jeder Fehler bricht das Binden ab, es gibt kein Teilergebnis:
/// [`Error::TruncatedFrame`], [`Error::ChunkTooLarge`], [`Error::ChunkDecode`],
/// [`Error::UnknownChunk`] (nur mit [`UnknownChunkPolicy::Reject`]),
/// [`Error::RequiredChunkMissing`], [`Error::UnexpectedSignature`],
/// [`Error::IndexCountMismatch`].
pub(crate) fn bind(buffer: &[u8], schema: &Schema, options: &ContainerOptions) -> Result<Binding> {
    options.validate()?;
    let version = options.version();
    let ctx = ChunkContext::new(version, options.dialect());

    let all = collect_frames(buffer, options)?;
    let mut fields = BoundFields::new(schema);
    // Besitzer-Feld pro Frame (None = nicht gebunden)
    let mut owner: Vec<Option<&'static str>> = vec![None; all.len()];
    let mut runs: FastHashMap<&'static str, Run> = FastHashMap::default();
    let mut claimed_at: FastHashMap<&'static str, usize> = FastHashMap::default();

    for (i, frame) in all.iter().enumerate() {
        for (name, run) in runs.iter_mut() {
            if *run == Run::Open && schema.field(name).is_some_and(|f| f.signature() != frame.signature) {
                *run = Run::Closed;
            }
        }

        let mut known = false;
        let mut array_target = false;
        let mut claimer = None;
        for field in schema.fields_for(frame.signature) {
            known = true;
            if !field.is_active(version) {
                continue;
            }
            match field.multiplicity() {
                Multiplicity::Array { .. } => array_target = true,
                Multiplicity::Single | Multiplicity::Optional => {
                    if claimer.is_none() && fields.slot(field.name()).is_some_and(Slot::is_empty) {
                        claimer = Some(field);
                    }
                }
                Multiplicity::List => {
                    let run = runs.get(field.name()).copied().unwrap_or(Run::NotStarted);
                    if claimer.is_none() && run != Run::Closed {
                        claimer = Some(field);
                    }
                }
            }
        }

        if let Some(field) = claimer {
            let value = (field.decode)(frame.payload, &ctx).map_err(|e| Error::in_chunk(frame.signature, frame.offset, e))?;
            trace!("{}: '{}' at {} -> {}", schema.name(), frame.signature, frame.offset, field.name());
            match fields.slot_mut(field.name()) {
                Some(Slot::Single(v)) => *v = Some(value),
                Some(Slot::Many(v)) => {
                    v.push(value);
                    runs.insert(field.name(), Run::Open);
                }
                None => {}
            }
            owner[i] = Some(field.name());
            claimed_at.insert(field.name(), i);
            continue;
        }

        if array_target {
            continue;
        }
        if !known && options.unknown_chunks() == UnknownChunkPolicy::Reject {
            return Err(Error::UnknownChunk { signature: frame.signature, offset: frame.offset });
        }
        if known {
            debug!(
                "{}: '{}' at {} not bound for {version}, kept as opaque",
                schema.name(),
                frame.signature,
                frame.offset
            );
        } else {
            debug!("{}: unknown chunk '{}' at {} kept as opaque", schema.name(), frame.signature, frame.offset);
        }
    }

    for field in schema.fields() {
        if field.is_required(version) && fields.slot(field.name()).is_some_and(Slot::is_empty) {
            return Err(Error::RequiredChunkMissing { field: field.name(), signature: field.signature() });
        }
    }
    check_counts(schema, &fields, version)?;

    bind_arrays(buffer, schema, options, &all, &claimed_at, &mut fields, &mut owner)?;

    let mut opaque = Vec::new();
    let mut last_owner = None;
    for (frame, owner) in all.iter().zip(&owner) {
        match owner {
            Some(name) => last_owner = Some(*name),
            None => opaque.push(OpaqueChunk {
                signature: frame.signature,
                payload: frame.payload.to_vec(),
                offset: frame.offset,
                after: last_owner,
            }),
        }
    }

    Ok(Binding { fields, opaque })
}

fn collect_frames<'a>(buffer: &'a [u8], options: &ContainerOptions) -> Result<Vec<Frame<'a>>> {
    let mut out = Vec::new();
    for frame in frames(buffer, options.dialect()) {
        let frame = frame?;
        check_size(&frame, options)?;
        out.push(frame);
    }
    Ok(out)
}

fn check_size(frame: &Frame<'_>, options: &ContainerOptions) -> Result<()> {
    match options.max_chunk_size() {
        Some(max) if frame.payload.len() > max as usize => {
            Err(Error::ChunkTooLarge { signature: frame.signature, length: frame.payload.len() })
        }
        _ => Ok(()),
    }
}

/// Length of every active counted list against the entry count of its counter.
///
/// Ohne Wert im Zähler muss die Liste leer sein.
pub(crate) fn check_counts(schema: &Schema, fields: &BoundFields, version: FormatVersion) -> Result<()> {
    for field in schema.active_fields(version) {
        let Some(counter) = field.count_field() else {
            continue;
        };
        let count = schema.field(counter).and_then(|f| f.count);
        let entries = match (fields.single(counter), count) {
            (Some(value), Some(count)) => count(value).ok_or(Error::FieldTypeMismatch {
                field: counter,
                expected: "entry table",
            })?,
            _ => 0,
        };
        let elements = fields.slot(field.name()).map_or(0, Slot::len);
        if entries != elements {
            return Err(Error::IndexCountMismatch { index: counter, entries, elements });
        }
    }
    Ok(())
}

/// Offset-gesteuertes Binden aller aktiven Array-Felder.
fn bind_arrays(
    buffer: &[u8],
    schema: &Schema,
    options: &ContainerOptions,
    all: &[Frame<'_>],
    claimed_at: &FastHashMap<&'static str, usize>,
    fields: &mut BoundFields,
    owner: &mut [Option<&'static str>],
) -> Result<()> {
    let ctx = ChunkContext::new(options.version(), options.dialect());
    let by_offset: FastHashMap<usize, usize> = all.iter().enumerate().map(|(i, f)| (f.offset, i)).collect();

    for field in schema.active_fields(ctx.version) {
        let Multiplicity::Array { index, base } = field.multiplicity() else {
            continue;
        };
        let Some(index_chunk) = fields.single(index) else {
            continue;
        };
        let index_field = schema
            .field(index)
            .ok_or_else(|| Error::unknown_field(index))?;
        let ops = index_field
            .index_ops
            .ok_or_else(|| Error::invalid_schema(format!("'{index}' is not an offset index")))?;
        let offsets = (ops.offsets)(index_chunk).ok_or(Error::FieldTypeMismatch {
            field: index,
            expected: "offset index",
        })?;
        if offsets.is_empty() {
            continue;
        }

        let base_pos = match base {
            OffsetBase::FirstDependent => all
                .iter()
                .find(|f| f.signature == field.signature())
                .map(|f| f.offset)
                .ok_or(Error::RequiredChunkMissing { field: field.name(), signature: field.signature() })?,
            OffsetBase::IndexPayloadStart => claimed_at
                .get(index)
                .map(|&i| all[i].payload_offset())
                .ok_or(Error::RequiredChunkMissing { field: index, signature: index_field.signature() })?,
            OffsetBase::StreamStart => 0,
        };

        let mut elements = Vec::with_capacity(offsets.len());
        for (entry, rel) in offsets.iter().enumerate() {
            let target = base_pos
                .checked_add(*rel as usize)
                .ok_or_else(|| Error::invalid_payload(format!("{index}[{entry}]: offset {rel} overflows")))?;
            let frame = match by_offset.get(&target) {
                Some(&i) => {
                    owner[i] = Some(field.name());
                    all[i]
                }
                // Ziel liegt nicht auf einer Frame-Grenze des Top-Level-Walks
                None => {
                    let (frame, _) = decode_frame(buffer, target, ctx.dialect)?;
                    check_size(&frame, options)?;
                    frame
                }
            };
            if frame.signature != field.signature() {
                return Err(Error::UnexpectedSignature {
                    expected: field.signature(),
                    found: frame.signature,
                    offset: target,
                });
            }
            let value = (field.decode)(frame.payload, &ctx).map_err(|e| Error::in_chunk(frame.signature, frame.offset, e))?;
            trace!("{}: {index}[{entry}] -> '{}' at {target}", schema.name(), frame.signature);
            elements.push(value);
        }

        if let Some(Slot::Many(v)) = fields.slot_mut(field.name()) {
            *v = elements;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
