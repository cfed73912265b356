//! Conditional payload layouts: which optional fields are present, in which
//! order and with which width, as a function of `(flags, version)`.
//!
//! Ablauf:
//! 1. Flags werden aus einem festen, unbedingten u32-Präfix gelesen.
//! 2. [`LayoutSpec::resolve`] wertet die Presence-Prädikate in deklarierter
//!    Reihenfolge aus.
//! 3. Lesen und Schreiben verwenden dieselbe [`ResolvedLayout`], abwesende
//!    Felder belegen in beiden Richtungen 0 Bytes.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{Flags, FormatVersion, LayoutRecord, LayoutSpec, Presence, Value, Width};
//! use chunkdoc::layout::LayoutField;
//!
//! static SPEC: LayoutSpec = LayoutSpec {
//!     name: "demo",
//!     flags_field: "flags",
//!     known_flags: 0x1,
//!     fields: &[
//!         LayoutField::new("id", Width::U32),
//!         LayoutField::new("extra", Width::U16).when(Presence::IfSet(0x1)),
//!     ],
//! };
//!
//! let mut rec = LayoutRecord::new(&SPEC, Flags::new(0x1), FormatVersion::Legion);
//! rec.set("extra", Value::U16(7)).unwrap();
//! let bytes = rec.to_bytes();
//! assert_eq!(bytes.len(), 4 + 4 + 2);
//!
//! let back = LayoutRecord::from_bytes(&SPEC, &bytes, FormatVersion::Legion).unwrap();
//! assert_eq!(back, rec);
//! ```

use log::debug;

use crate::byteio::{ByteReader, ByteWriter};
use crate::flags::Flags;
use crate::version::FormatVersion;
use crate::{Error, Result};

/// Primitive width of a layout field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
    F32,
    /// Drei f32 (x, y, z).
    Vec3,
}

impl Width {
    pub const fn byte_len(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
            Self::U64 => 8,
            Self::Vec3 => 12,
        }
    }

    const fn type_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::Vec3 => "vec3",
        }
    }
}

/// A decoded layout field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    Vec3([f32; 3]),
}

impl Value {
    pub fn width(&self) -> Width {
        match self {
            Self::U8(_) => Width::U8,
            Self::U16(_) => Width::U16,
            Self::U32(_) => Width::U32,
            Self::U64(_) => Width::U64,
            Self::F32(_) => Width::F32,
            Self::Vec3(_) => Width::Vec3,
        }
    }

    fn zero(width: Width) -> Self {
        match width {
            Width::U8 => Self::U8(0),
            Width::U16 => Self::U16(0),
            Width::U32 => Self::U32(0),
            Width::U64 => Self::U64(0),
            Width::F32 => Self::F32(0.0),
            Width::Vec3 => Self::Vec3([0.0; 3]),
        }
    }

    fn read(reader: &mut ByteReader<'_>, width: Width) -> Result<Self> {
        Ok(match width {
            Width::U8 => Self::U8(reader.read_u8()?),
            Width::U16 => Self::U16(reader.read_u16()?),
            Width::U32 => Self::U32(reader.read_u32()?),
            Width::U64 => Self::U64(reader.read_u64()?),
            Width::F32 => Self::F32(reader.read_f32()?),
            Width::Vec3 => Self::Vec3(reader.read_vec3()?),
        })
    }

    fn write(&self, writer: &mut ByteWriter) {
        match *self {
            Self::U8(v) => writer.write_u8(v),
            Self::U16(v) => writer.write_u16(v),
            Self::U32(v) => writer.write_u32(v),
            Self::U64(v) => writer.write_u64(v),
            Self::F32(v) => writer.write_f32(v),
            Self::Vec3(v) => writer.write_vec3(v),
        }
    }
}

/// Presence predicate of a layout field.
///
/// `IfSet` und `IfClear` sind zwei verschiedene Prädikate; ein Feld mit
/// `IfClear(m)` ist nicht einfach das Komplement eines Feldes mit `IfSet(m)`
/// wenn `m` mehrere Bits hat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    /// Present only if all bits of the mask are set.
    IfSet(u32),
    /// Present only if no bit of the mask is set.
    IfClear(u32),
    /// Present from this version on.
    Since(FormatVersion),
    /// Present only before this version.
    Before(FormatVersion),
}

impl Presence {
    pub fn holds(self, flags: Flags, version: FormatVersion) -> bool {
        match self {
            Self::Always => true,
            Self::IfSet(mask) => flags.contains(mask),
            Self::IfClear(mask) => !flags.intersects(mask),
            Self::Since(v) => version >= v,
            Self::Before(v) => version < v,
        }
    }
}

/// One declared field of a conditional layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutField {
    pub name: &'static str,
    pub width: Width,
    pub presence: Presence,
}

impl LayoutField {
    /// An unconditional field.
    pub const fn new(name: &'static str, width: Width) -> Self {
        Self { name, width, presence: Presence::Always }
    }

    /// Sets the presence predicate.
    pub const fn when(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }
}

/// Static declaration of a flag dependent payload layout.
///
/// Das Flags-Feld (u32) ist immer das erste Feld und nicht Teil von `fields`.
#[derive(Debug)]
pub struct LayoutSpec {
    pub name: &'static str,
    /// Name of the u32 flags prefix.
    pub flags_field: &'static str,
    /// Bits with a documented meaning; alle anderen gelten als unbekannt.
    pub known_flags: u32,
    pub fields: &'static [LayoutField],
}

impl LayoutSpec {
    /// Evaluates every presence predicate in declared order.
    ///
    /// Unbekannte Bits fügen keine Felder hinzu und entfernen keine.
    pub fn resolve(&self, flags: Flags, version: FormatVersion) -> ResolvedLayout {
        let present: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.presence.holds(flags, version))
            .map(|(i, _)| i)
            .collect();
        let byte_len = 4 + present.iter().map(|&i| self.fields[i].width.byte_len()).sum::<usize>();
        ResolvedLayout { flags, version, present, byte_len }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// The outcome of [`LayoutSpec::resolve`] for one `(flags, version)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayout {
    flags: Flags,
    version: FormatVersion,
    /// Indizes in `LayoutSpec::fields`, in Schreib-/Lesereihenfolge.
    present: Vec<usize>,
    /// Inklusive 4-Byte Flags-Präfix.
    byte_len: usize,
}

impl ResolvedLayout {
    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Indices of the present fields in declared order.
    pub fn present_indices(&self) -> &[usize] {
        &self.present
    }

    pub fn is_present(&self, index: usize) -> bool {
        self.present.binary_search(&index).is_ok()
    }
}

/// Values of one flag dependent payload instance plus its cached layout.
///
/// Die aufgelöste Layout ist abgeleitete Information: sie wird nur über
/// [`LayoutRecord::set_flags`] neu berechnet, nie direkt verändert.
#[derive(Debug, Clone)]
pub struct LayoutRecord {
    spec: &'static LayoutSpec,
    /// Ein Wert pro deklariertem Feld; abwesende Felder behalten ihren Wert
    /// im Speicher, werden aber nicht geschrieben.
    values: Vec<Value>,
    resolved: ResolvedLayout,
}

impl LayoutRecord {
    /// A record with all fields zeroed.
    pub fn new(spec: &'static LayoutSpec, flags: Flags, version: FormatVersion) -> Self {
        let values = spec.fields.iter().map(|f| Value::zero(f.width)).collect();
        Self { spec, values, resolved: spec.resolve(flags, version) }
    }

    /// Reads the flags prefix, resolves the layout and reads the present fields.
    pub fn read(spec: &'static LayoutSpec, reader: &mut ByteReader<'_>, version: FormatVersion) -> Result<Self> {
        let flags = Flags::new(reader.read_u32()?);
        let unknown = flags.unknown_bits(spec.known_flags);
        if unknown != 0 {
            debug!("{}: unknown flag bits {unknown:#x} ignored for layout", spec.name);
        }
        let mut record = Self::new(spec, flags, version);
        for &idx in &record.resolved.present {
            record.values[idx] = Value::read(reader, spec.fields[idx].width)?;
        }
        Ok(record)
    }

    /// Reads a record that must span the whole slice.
    pub fn from_bytes(spec: &'static LayoutSpec, bytes: &[u8], version: FormatVersion) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let record = Self::read(spec, &mut reader, version)?;
        if !reader.is_empty() {
            return Err(Error::invalid_payload(format!(
                "{}: {} trailing bytes after layout",
                spec.name,
                reader.remaining()
            )));
        }
        Ok(record)
    }

    /// Writes the flags prefix and every present field.
    pub fn write(&self, writer: &mut ByteWriter) {
        writer.write_u32(self.resolved.flags.bits());
        for &idx in &self.resolved.present {
            self.values[idx].write(writer);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.resolved.byte_len);
        self.write(&mut writer);
        writer.into_vec()
    }

    pub fn spec(&self) -> &'static LayoutSpec {
        self.spec
    }

    pub fn flags(&self) -> Flags {
        self.resolved.flags
    }

    pub fn version(&self) -> FormatVersion {
        self.resolved.version
    }

    pub fn resolved(&self) -> &ResolvedLayout {
        &self.resolved
    }

    /// Replaces the flags and re-resolves the layout.
    pub fn set_flags(&mut self, flags: Flags) {
        self.resolved = self.spec.resolve(flags, self.resolved.version);
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.spec.index_of(name).is_some_and(|i| self.resolved.is_present(i))
    }

    /// Names of the present fields in declared order.
    pub fn present_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resolved.present.iter().map(|&i| self.spec.fields[i].name)
    }

    fn present_index(&self, name: &str) -> Result<usize> {
        let idx = self
            .spec
            .index_of(name)
            .ok_or_else(|| Error::unknown_field(name.to_string()))?;
        if !self.resolved.is_present(idx) {
            return Err(Error::FieldAbsent { layout: self.spec.name, field: self.spec.fields[idx].name });
        }
        Ok(idx)
    }

    /// Value of a present field.
    pub fn get(&self, name: &str) -> Result<Value> {
        Ok(self.values[self.present_index(name)?])
    }

    /// Sets a present field; the width must match the declaration.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let idx = self.present_index(name)?;
        let field = &self.spec.fields[idx];
        if value.width() != field.width {
            return Err(Error::FieldTypeMismatch { field: field.name, expected: field.width.type_name() });
        }
        self.values[idx] = value;
        Ok(())
    }

    pub fn get_u16(&self, name: &str) -> Result<u16> {
        match self.get(name)? {
            Value::U16(v) => Ok(v),
            _ => Err(self.mismatch(name)),
        }
    }

    pub fn get_u32(&self, name: &str) -> Result<u32> {
        match self.get(name)? {
            Value::U32(v) => Ok(v),
            _ => Err(self.mismatch(name)),
        }
    }

    pub fn get_u64(&self, name: &str) -> Result<u64> {
        match self.get(name)? {
            Value::U64(v) => Ok(v),
            _ => Err(self.mismatch(name)),
        }
    }

    pub fn get_vec3(&self, name: &str) -> Result<[f32; 3]> {
        match self.get(name)? {
            Value::Vec3(v) => Ok(v),
            _ => Err(self.mismatch(name)),
        }
    }

    fn mismatch(&self, name: &str) -> Error {
        match self.spec.index_of(name) {
            Some(i) => {
                let f = &self.spec.fields[i];
                Error::FieldTypeMismatch { field: f.name, expected: f.width.type_name() }
            }
            None => Error::unknown_field(name.to_string()),
        }
    }
}

impl PartialEq for LayoutRecord {
    /// Vergleicht nur, was serialisiert wird: Spec, Flags, Version und
    /// die Werte der anwesenden Felder.
    fn eq(&self, other: &Self) -> bool {
        self.spec.name == other.spec.name
            && self.resolved == other.resolved
            && self
                .resolved
                .present
                .iter()
                .all(|&i| self.values[i] == other.values[i])
    }
}
