//! Container document: typed field access over one loaded or new file.
//!
//! Ein Dokument kennt sein Schema, seine Optionen und pro Feld den
//! gebundenen Wert. Nicht gebundene Frames werden als [`OpaqueChunk`]s
//! mitgeführt und beim Speichern an ihrer ursprünglichen Stelle ausgegeben.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{ContainerOptions, Document, FormatVersion};
//! use chunkdoc::formats::tex::{Txbt, TxbtEntry, Txmd, Txvr};
//! use chunkdoc::kinds::texture_blob::{self, BLOB_TEXTURE, TEXTURE_DATA, VERSION};
//!
//! let options = ContainerOptions::default().with_version(FormatVersion::Legion);
//! let mut doc = Document::new(texture_blob::schema(), options).unwrap();
//! doc.set(VERSION, Txvr { version: 1 }).unwrap();
//! doc.set(BLOB_TEXTURE, Txbt { entries: vec![TxbtEntry::default(); 2] }).unwrap();
//! doc.push(TEXTURE_DATA, Txmd { data: vec![1, 2] }).unwrap();
//! doc.push(TEXTURE_DATA, Txmd { data: vec![3; 6] }).unwrap();
//!
//! let bytes = doc.save().unwrap();
//! let loaded = Document::load(texture_blob::schema(), &bytes, doc.options().clone()).unwrap();
//! let index = loaded.get::<Txbt>(BLOB_TEXTURE).unwrap().unwrap();
//! assert_eq!(index.entries[1].txmd_offset, 10);
//! assert_eq!(loaded.list::<Txmd>(TEXTURE_DATA).unwrap().len(), 2);
//! ```

use std::ptr;

use log::debug;

use crate::binder::{self, BoundFields, Slot};
use crate::chunk::{Chunk, ChunkContext, DynChunk, OpaqueChunk};
use crate::options::ContainerOptions;
use crate::schema::{FieldDescriptor, Schema};
use crate::signature::Dialect;
use crate::version::FormatVersion;
use crate::writer;
use crate::{Error, Result};

/// One container file bound to a static schema.
#[derive(Debug, Clone)]
pub struct Document {
    schema: &'static Schema,
    options: ContainerOptions,
    fields: BoundFields,
    opaque: Vec<OpaqueChunk>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.schema, other.schema)
            && self.options == other.options
            && self.fields == other.fields
            && self.opaque == other.opaque
    }
}

/// Erwartete Feldform beim typisierten Zugriff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Single,
    Many,
}

impl Document {
    /// Empty document: every field absent, no opaque chunks.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOptionCombination`] bei ungültigen Optionen.
    pub fn new(schema: &'static Schema, options: ContainerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { schema, fields: BoundFields::new(schema), options, opaque: Vec::new() })
    }

    /// Parses `buffer` and binds its frames to `schema`.
    ///
    /// # Errors
    ///
    /// Alle Fehler des Binders; ein fehlerhafter Buffer liefert nie ein
    /// teilweise gebundenes Dokument.
    pub fn load(schema: &'static Schema, buffer: &[u8], options: ContainerOptions) -> Result<Self> {
        let binding = binder::bind(buffer, schema, &options)?;
        debug!(
            "{}: loaded {} bytes, {} opaque chunk(s)",
            schema.name(),
            buffer.len(),
            binding.opaque.len()
        );
        Ok(Self { schema, options, fields: binding.fields, opaque: binding.opaque })
    }

    /// Serializes the document, patching index offsets.
    ///
    /// # Errors
    ///
    /// Alle Fehler des Writers; bei einem Fehler wird kein Buffer geliefert.
    pub fn save(&self) -> Result<Vec<u8>> {
        let out = writer::serialize(self.schema, &self.fields, &self.opaque, &self.context())?;
        debug!("{}: saved {} bytes", self.schema.name(), out.len());
        Ok(out)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn version(&self) -> FormatVersion {
        self.options.version()
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect()
    }

    /// Context handed to payload codecs.
    pub fn context(&self) -> ChunkContext {
        ChunkContext::new(self.version(), self.dialect())
    }

    // ========================================================================
    // single / optional
    // ========================================================================

    /// Bound value of a single or optional field; `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownField`], [`Error::InactiveField`],
    /// [`Error::FieldTypeMismatch`].
    pub fn get<T: Chunk>(&self, name: &str) -> Result<Option<&T>> {
        let field = self.typed::<T>(name, Shape::Single)?;
        match self.fields.slot(field.name()) {
            Some(Slot::Single(v)) => Ok(v.as_deref().and_then(|c| c.as_any().downcast_ref::<T>())),
            _ => Ok(None),
        }
    }

    /// Like [`Document::get`], but an absent field reads as `T::default()`.
    pub fn get_or_default<T: Chunk + Default>(&self, name: &str) -> Result<T> {
        Ok(self.get::<T>(name)?.cloned().unwrap_or_default())
    }

    pub fn get_mut<T: Chunk>(&mut self, name: &str) -> Result<Option<&mut T>> {
        let field = self.typed::<T>(name, Shape::Single)?;
        match self.fields.slot_mut(field.name()) {
            Some(Slot::Single(v)) => Ok(v.as_deref_mut().and_then(|c| c.as_any_mut().downcast_mut::<T>())),
            _ => Ok(None),
        }
    }

    /// Replaces the value of a single or optional field.
    pub fn set<T: Chunk>(&mut self, name: &str, value: T) -> Result<()> {
        let field = self.typed::<T>(name, Shape::Single)?;
        if let Some(Slot::Single(v)) = self.fields.slot_mut(field.name()) {
            *v = Some(Box::new(value));
        }
        Ok(())
    }

    /// Takes the value of a single or optional field out of the document.
    pub fn take<T: Chunk>(&mut self, name: &str) -> Result<Option<T>> {
        let field = self.typed::<T>(name, Shape::Single)?;
        let Some(Slot::Single(v)) = self.fields.slot_mut(field.name()) else {
            return Ok(None);
        };
        Ok(v.take().and_then(|c| c.as_any().downcast_ref::<T>().cloned()))
    }

    // ========================================================================
    // list / array
    // ========================================================================

    /// Elements of a list or array field in order.
    pub fn list<T: Chunk>(&self, name: &str) -> Result<Vec<&T>> {
        let field = self.typed::<T>(name, Shape::Many)?;
        match self.fields.slot(field.name()) {
            Some(Slot::Many(v)) => Ok(v.iter().filter_map(|c| c.as_any().downcast_ref::<T>()).collect()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn list_mut<T: Chunk>(&mut self, name: &str) -> Result<Vec<&mut T>> {
        let field = self.typed::<T>(name, Shape::Many)?;
        match self.fields.slot_mut(field.name()) {
            Some(Slot::Many(v)) => Ok(v.iter_mut().filter_map(|c| c.as_any_mut().downcast_mut::<T>()).collect()),
            _ => Ok(Vec::new()),
        }
    }

    /// Appends one element to a list or array field.
    ///
    /// Bei Array-Feldern muss der zugehörige Index beim Speichern genauso
    /// viele Einträge haben.
    pub fn push<T: Chunk>(&mut self, name: &str, value: T) -> Result<()> {
        let field = self.typed::<T>(name, Shape::Many)?;
        if let Some(Slot::Many(v)) = self.fields.slot_mut(field.name()) {
            v.push(Box::new(value));
        }
        Ok(())
    }

    /// Replaces all elements of a list or array field.
    pub fn set_list<T: Chunk>(&mut self, name: &str, values: Vec<T>) -> Result<()> {
        let field = self.typed::<T>(name, Shape::Many)?;
        if let Some(Slot::Many(v)) = self.fields.slot_mut(field.name()) {
            *v = values.into_iter().map(|x| Box::new(x) as Box<dyn DynChunk>).collect();
        }
        Ok(())
    }

    // ========================================================================
    // untypisiert
    // ========================================================================

    /// Removes the value(s) of any field.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownField`] wenn das Schema kein solches Feld hat.
    pub fn clear(&mut self, name: &str) -> Result<()> {
        let field = self.schema.field(name).ok_or_else(|| Error::unknown_field(name.to_owned()))?;
        match self.fields.slot_mut(field.name()) {
            Some(Slot::Single(v)) => *v = None,
            Some(Slot::Many(v)) => v.clear(),
            None => {}
        }
        Ok(())
    }

    /// Number of bound values of a field (0 or 1 for single fields).
    pub fn len(&self, name: &str) -> Result<usize> {
        let field = self.schema.field(name).ok_or_else(|| Error::unknown_field(name.to_owned()))?;
        Ok(self.fields.slot(field.name()).map_or(0, Slot::len))
    }

    /// Whether any value is bound to the field.
    pub fn is_present(&self, name: &str) -> Result<bool> {
        Ok(self.len(name)? > 0)
    }

    /// Names of all fields that currently hold a value, in declared order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        self.schema
            .fields()
            .iter()
            .filter(|f| self.fields.slot(f.name()).is_some_and(|s| !s.is_empty()))
            .map(FieldDescriptor::name)
            .collect()
    }

    pub fn opaque_chunks(&self) -> &[OpaqueChunk] {
        &self.opaque
    }

    pub fn opaque_chunks_mut(&mut self) -> &mut Vec<OpaqueChunk> {
        &mut self.opaque
    }

    /// Löst `name` auf und prüft Aktivität, Typ und Feldform.
    fn typed<T: Chunk>(&self, name: &str, shape: Shape) -> Result<&'static FieldDescriptor> {
        let schema: &'static Schema = self.schema;
        let field = schema.field(name).ok_or_else(|| Error::unknown_field(name.to_owned()))?;
        if !field.is_active(self.version()) {
            return Err(Error::InactiveField { field: field.name(), version: self.version() });
        }
        if !field.holds::<T>() {
            return Err(Error::FieldTypeMismatch { field: field.name(), expected: field.type_name() });
        }
        let actual = if field.multiplicity().is_single() { Shape::Single } else { Shape::Many };
        if actual != shape {
            let expected = match actual {
                Shape::Single => "single value",
                Shape::Many => "list",
            };
            return Err(Error::FieldTypeMismatch { field: field.name(), expected });
        }
        Ok(field)
    }
}
