//! Static field descriptor tables (one [`Schema`] per document kind).
//!
//! Ein Schema ist unveränderlich und wird per `OnceLock` einmal gebaut und
//! danach von allen Dokumenten dieses Typs read-only geteilt.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{FieldDescriptor, FormatVersion, Schema, VersionRange};
//! use chunkdoc::formats::{Mver, adt::{Modf, Mlmx}};
//!
//! let base = Schema::new("tile", vec![
//!     FieldDescriptor::single::<Mver>("version", 1),
//!     FieldDescriptor::optional::<Modf>("placements", 2),
//! ]).unwrap();
//! let legion = base.extend("tile+legion", vec![
//!     FieldDescriptor::optional::<Mlmx>("extents", 3).versions(VersionRange::since(FormatVersion::Legion)),
//! ]).unwrap();
//!
//! assert_eq!(legion.fields().len(), 3);
//! assert!(!legion.field("extents").unwrap().is_active(FormatVersion::Cataclysm));
//! ```

use core::fmt;
use std::any::TypeId;

use crate::chunk::{decode_boxed, Chunk, Counted, DecodeFn, DynChunk, OffsetIndex};
use crate::signature::Signature;
use crate::version::{FormatVersion, VersionRange};
use crate::{Error, FastHashMap, Result};

/// Where relative offsets of an index chunk are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetBase {
    /// Start of the first dependent frame (frame header included).
    #[default]
    FirstDependent,
    /// First payload byte of the index chunk itself.
    IndexPayloadStart,
    /// Start of the whole buffer; offsets are absolute.
    StreamStart,
}

/// How many frames a field binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Single,
    Optional,
    /// Contiguous run of matching frames.
    List,
    /// Elements located via the relative offsets of the named index field.
    Array {
        index: &'static str,
        base: OffsetBase,
    },
}

impl Multiplicity {
    /// `true` für Felder, die höchstens einen Frame binden.
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single | Self::Optional)
    }
}

/// Type-erased access to an [`OffsetIndex`] payload.
///
/// `None` bedeutet: der gespeicherte Wert hat nicht den deklarierten Typ.
#[derive(Clone, Copy)]
pub(crate) struct IndexOps {
    pub entry_count: fn(&dyn DynChunk) -> Option<usize>,
    pub offsets: fn(&dyn DynChunk) -> Option<Vec<u32>>,
    pub set_offsets: fn(&mut dyn DynChunk, &[u32]) -> Option<Result<()>>,
}

impl IndexOps {
    fn of<T: OffsetIndex>() -> Self {
        Self {
            entry_count: |c| c.as_any().downcast_ref::<T>().map(T::entry_count),
            offsets: |c| c.as_any().downcast_ref::<T>().map(T::offsets),
            set_offsets: |c, offsets| c.as_any_mut().downcast_mut::<T>().map(|t| t.set_offsets(offsets)),
        }
    }
}

/// Type-erased entry count of a [`Counted`] payload.
pub(crate) type CountFn = fn(&dyn DynChunk) -> Option<usize>;

fn count_of<T: Counted>(c: &dyn DynChunk) -> Option<usize> {
    c.as_any().downcast_ref::<T>().map(T::entry_count)
}

/// Static declaration of one document field.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    signature: Signature,
    order: u32,
    multiplicity: Multiplicity,
    versions: VersionRange,
    mandatory: VersionRange,
    type_id: TypeId,
    type_name: &'static str,
    pub(crate) decode: DecodeFn,
    pub(crate) index_ops: Option<IndexOps>,
    pub(crate) count: Option<CountFn>,
    /// Feld, dessen Eintragszahl die Länge dieser Liste festlegt.
    counted_by: Option<&'static str>,
}

impl FieldDescriptor {
    fn of<T: Chunk>(name: &'static str, order: u32, multiplicity: Multiplicity) -> Self {
        Self {
            name,
            signature: T::SIGNATURE,
            order,
            multiplicity,
            versions: VersionRange::all(),
            mandatory: VersionRange::none(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            decode: decode_boxed::<T>,
            index_ops: None,
            count: None,
            counted_by: None,
        }
    }

    /// A field that must be present in every version it is active for.
    pub fn single<T: Chunk>(name: &'static str, order: u32) -> Self {
        let mut d = Self::of::<T>(name, order, Multiplicity::Single);
        d.mandatory = VersionRange::all();
        d
    }

    /// At most one frame; absence is never an error.
    pub fn optional<T: Chunk>(name: &'static str, order: u32) -> Self {
        Self::of::<T>(name, order, Multiplicity::Optional)
    }

    /// A contiguous run of frames.
    pub fn list<T: Chunk>(name: &'static str, order: u32) -> Self {
        Self::of::<T>(name, order, Multiplicity::List)
    }

    /// Frames addressed by the offsets of the index field `index`.
    pub fn array<T: Chunk>(name: &'static str, order: u32, index: &'static str, base: OffsetBase) -> Self {
        Self::of::<T>(name, order, Multiplicity::Array { index, base })
    }

    /// A single offset index; mandatory like [`FieldDescriptor::single`].
    pub fn index<T: OffsetIndex>(name: &'static str, order: u32) -> Self {
        let mut d = Self::single::<T>(name, order);
        d.index_ops = Some(IndexOps::of::<T>());
        d
    }

    /// An optional entry table whose count fixes the length of a list
    /// declared with [`FieldDescriptor::counted_by`].
    pub fn counter<T: Counted>(name: &'static str, order: u32) -> Self {
        let mut d = Self::optional::<T>(name, order);
        d.count = Some(count_of::<T>);
        d
    }

    /// Ties the length of this list to the entry count of `counter`;
    /// without a `counter` value the list must be empty.
    pub fn counted_by(mut self, counter: &'static str) -> Self {
        self.counted_by = Some(counter);
        self
    }

    /// Restricts the versions in which the field participates at all.
    pub fn versions(mut self, range: VersionRange) -> Self {
        self.versions = range;
        self
    }

    /// Versions in which a missing frame fails the load (single fields only).
    pub fn mandatory(mut self, range: VersionRange) -> Self {
        self.mandatory = range;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn version_range(&self) -> VersionRange {
        self.versions
    }

    pub fn mandatory_range(&self) -> VersionRange {
        self.mandatory
    }

    /// Rust type name of the payload (diagnostics).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_active(&self, version: FormatVersion) -> bool {
        self.versions.contains(version)
    }

    /// Active and mandatory for `version`.
    pub fn is_required(&self, version: FormatVersion) -> bool {
        self.multiplicity == Multiplicity::Single && self.is_active(version) && self.mandatory.contains(version)
    }

    pub fn is_index(&self) -> bool {
        self.index_ops.is_some()
    }

    pub fn is_counter(&self) -> bool {
        self.count.is_some()
    }

    /// Name of the counter field that fixes this list's length.
    pub fn count_field(&self) -> Option<&'static str> {
        self.counted_by
    }

    pub(crate) fn holds<T: Chunk>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("order", &self.order)
            .field("multiplicity", &self.multiplicity)
            .field("versions", &self.versions)
            .field("mandatory", &self.mandatory)
            .field("counted_by", &self.counted_by)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Immutable descriptor table of one document kind.
pub struct Schema {
    name: &'static str,
    /// Sortiert nach `order` (stabil bei gleichem Wert).
    fields: Vec<FieldDescriptor>,
    by_name: FastHashMap<&'static str, usize>,
    by_signature: FastHashMap<Signature, Vec<usize>>,
}

impl Schema {
    /// Builds and validates a schema.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSchema`] bei doppelten Feldnamen oder Array-Feldern,
    /// deren Index-Feld fehlt oder kein [`OffsetIndex`] ist.
    pub fn new(name: &'static str, mut fields: Vec<FieldDescriptor>) -> Result<Self> {
        fields.sort_by_key(|f| f.order);

        let mut by_name = FastHashMap::default();
        let mut by_signature: FastHashMap<Signature, Vec<usize>> = FastHashMap::default();
        for (i, f) in fields.iter().enumerate() {
            if by_name.insert(f.name, i).is_some() {
                return Err(Error::invalid_schema(format!("{name}: duplicate field '{}'", f.name)));
            }
            by_signature.entry(f.signature).or_default().push(i);
        }

        for f in &fields {
            if let Multiplicity::Array { index, .. } = f.multiplicity {
                let Some(&idx) = by_name.get(index) else {
                    return Err(Error::invalid_schema(format!(
                        "{name}: array '{}' references unknown index '{index}'",
                        f.name
                    )));
                };
                let target = &fields[idx];
                if !target.multiplicity.is_single() || !target.is_index() {
                    return Err(Error::invalid_schema(format!(
                        "{name}: '{index}' referenced by '{}' is not a single offset index",
                        f.name
                    )));
                }
                if !target.versions.covers(&f.versions) {
                    return Err(Error::invalid_schema(format!(
                        "{name}: array '{}' is active where its index '{index}' is not",
                        f.name
                    )));
                }
            }
            if let Some(counter) = f.counted_by {
                if f.multiplicity != Multiplicity::List {
                    return Err(Error::invalid_schema(format!("{name}: only lists can be counted ('{}')", f.name)));
                }
                let target = by_name.get(counter).map(|&i| &fields[i]);
                match target {
                    Some(t) if t.multiplicity.is_single() && t.is_counter() => {
                        if !t.versions.covers(&f.versions) {
                            return Err(Error::invalid_schema(format!(
                                "{name}: list '{}' is active where its counter '{counter}' is not",
                                f.name
                            )));
                        }
                    }
                    _ => {
                        return Err(Error::invalid_schema(format!(
                            "{name}: '{counter}' counting '{}' is not a single counter field",
                            f.name
                        )))
                    }
                }
            }
            if f.multiplicity != Multiplicity::Single && !f.mandatory.is_empty() {
                return Err(Error::invalid_schema(format!(
                    "{name}: only single fields can be mandatory ('{}')",
                    f.name
                )));
            }
        }

        Ok(Self { name, fields, by_name, by_signature })
    }

    /// A new schema with all fields of `self` plus `extra`.
    pub fn extend(&self, name: &'static str, extra: Vec<FieldDescriptor>) -> Result<Self> {
        let mut fields = self.fields.clone();
        fields.extend(extra);
        Self::new(name, fields)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All fields in declared (emission) order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Fields active for `version`, in declared order.
    pub fn active_fields(&self, version: FormatVersion) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.is_active(version))
    }

    /// Fields carrying `signature`, in declared order.
    pub fn fields_for(&self, signature: Signature) -> impl Iterator<Item = &FieldDescriptor> {
        self.by_signature
            .get(&signature)
            .into_iter()
            .flatten()
            .map(|&i| &self.fields[i])
    }

    /// The array field whose elements are addressed by `index`.
    pub fn array_for_index(&self, index: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| matches!(f.multiplicity, Multiplicity::Array { index: i, .. } if i == index))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("name", &self.name).field("fields", &self.fields).finish()
    }
}
