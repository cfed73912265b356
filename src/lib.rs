//! chunkdoc – chunked binary container files (terrain, map and model data)
//!
//! Eine Datei ist eine flache Folge selbstbeschreibender Chunks:
//! 4-Byte-Signatur, u32-Länge, Payload. Der Kern bindet diese Chunks an
//! statisch deklarierte Felder (Schema) und schreibt sie wieder zurück,
//! inklusive Index-Chunks deren Offsets erst nach dem Schreiben der
//! referenzierten Chunks bekannt sind.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{ContainerOptions, Dialect, Document, FormatVersion};
//! use chunkdoc::formats::Mver;
//! use chunkdoc::kinds::world_model_root;
//! use chunkdoc::formats::wmo::Mohd;
//!
//! let options = ContainerOptions::default()
//!     .with_version(FormatVersion::WarlordsOfDraenor)
//!     .with_dialect(Dialect::Reversed);
//!
//! let mut doc = Document::new(world_model_root::schema(), options.clone()).unwrap();
//! doc.set(world_model_root::VERSION, Mver { version: 17 }).unwrap();
//! doc.set(world_model_root::HEADER, Mohd { data: vec![0; 64] }).unwrap();
//! let bytes = doc.save().unwrap();
//!
//! let loaded = Document::load(world_model_root::schema(), &bytes, options).unwrap();
//! assert_eq!(loaded.get::<Mver>(world_model_root::VERSION).unwrap().unwrap().version, 17);
//! assert_eq!(loaded.save().unwrap(), bytes);
//! ```

pub mod binder;
pub mod byteio;
pub mod chunk;
pub mod document;
pub mod error;
pub mod flags;
pub mod formats;
pub mod frame;
pub mod kinds;
pub mod layout;
pub mod options;
pub mod schema;
pub mod signature;
pub mod version;
pub mod writer;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent; nur für interne Lookup-Tabellen).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Container
pub use document::Document;
pub use options::{ContainerOptions, UnknownChunkPolicy};

// Public API: Framing
pub use frame::{Frame, Frames, decode_frame, encode_frame};
pub use signature::{Dialect, Signature};

// Public API: Schema / Payload contract
pub use chunk::{Chunk, ChunkContext, Counted, Flagged, OffsetIndex, OpaqueChunk};
pub use schema::{FieldDescriptor, Multiplicity, OffsetBase, Schema};

// Public API: Layout
pub use flags::Flags;
pub use layout::{LayoutRecord, LayoutSpec, Presence, Value, Width};

// Public API: Versions
pub use version::{FormatVersion, VersionRange};
