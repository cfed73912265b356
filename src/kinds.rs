//! Built-in document kinds: one static schema per file type.
//!
//! Jede Art ist ein Untermodul mit Feldnamen als Konstanten und einer
//! `schema()`-Funktion, die das Schema beim ersten Zugriff baut.

use std::fmt;
use std::str::FromStr;

use crate::schema::{FieldDescriptor, Schema};
use crate::Error;

/// Builds a predefined schema; an invalid table is a bug in this module.
fn predefined(name: &'static str, fields: Vec<FieldDescriptor>) -> Schema {
    Schema::new(name, fields).expect("vordefiniertes Schema muss gueltig sein")
}

/// Texture blob (`.blob`): TXVR, TXBT index and the TXMD frames it points at.
pub mod texture_blob {
    use std::sync::OnceLock;

    use crate::formats::tex::{Txbt, Txmd, Txvr};
    use crate::schema::{FieldDescriptor, OffsetBase, Schema};

    pub const VERSION: &str = "version";
    pub const BLOB_TEXTURE: &str = "blob_texture";
    pub const TEXTURE_DATA: &str = "texture_data";

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            super::predefined(
                "TextureBlob",
                vec![
                    FieldDescriptor::single::<Txvr>(VERSION, 1),
                    FieldDescriptor::index::<Txbt>(BLOB_TEXTURE, 2),
                    FieldDescriptor::array::<Txmd>(TEXTURE_DATA, 3, BLOB_TEXTURE, OffsetBase::FirstDependent),
                ],
            )
        })
    }
}

/// Terrain tile (`.adt`).
///
/// Das Basisschema gilt für alle Versionen; [`terrain_tile::schema`] erweitert
/// es um die später eingeführten Chunks.
pub mod terrain_tile {
    use std::sync::OnceLock;

    use crate::formats::Mver;
    use crate::formats::adt::{Mcnk, Mfbo, Mlmx, Modf};
    use crate::schema::{FieldDescriptor, Schema};
    use crate::version::{FormatVersion, VersionRange};

    pub const VERSION: &str = "version";
    pub const MAP_CHUNKS: &str = "map_chunks";
    pub const PLACEMENTS: &str = "world_model_placements";
    pub const FLIGHT_BOUNDS: &str = "flight_bounds";
    pub const MODEL_EXTENTS: &str = "model_extents";

    pub fn base_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            super::predefined(
                "TerrainTileBase",
                vec![
                    FieldDescriptor::single::<Mver>(VERSION, 1),
                    FieldDescriptor::list::<Mcnk>(MAP_CHUNKS, 2),
                    FieldDescriptor::optional::<Modf>(PLACEMENTS, 3),
                ],
            )
        })
    }

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            base_schema()
                .extend(
                    "TerrainTile",
                    vec![
                        FieldDescriptor::optional::<Mfbo>(FLIGHT_BOUNDS, 4)
                            .versions(VersionRange::since(FormatVersion::BurningCrusade)),
                        FieldDescriptor::optional::<Mlmx>(MODEL_EXTENTS, 5)
                            .versions(VersionRange::since(FormatVersion::Legion)),
                    ],
                )
                .expect("vordefiniertes Schema muss gueltig sein")
        })
    }
}

/// World model root (`.wmo`); payloads are kept verbatim.
pub mod world_model_root {
    use std::sync::OnceLock;

    use crate::formats::Mver;
    use crate::formats::wmo::{Modn, Mohd, Momt, Motx};
    use crate::schema::{FieldDescriptor, Schema};

    pub const VERSION: &str = "version";
    pub const HEADER: &str = "header";
    pub const TEXTURES: &str = "textures";
    pub const MATERIALS: &str = "materials";
    pub const DOODAD_NAMES: &str = "doodad_names";

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            super::predefined(
                "WorldModelRoot",
                vec![
                    FieldDescriptor::single::<Mver>(VERSION, 1),
                    FieldDescriptor::single::<Mohd>(HEADER, 2),
                    FieldDescriptor::optional::<Motx>(TEXTURES, 3),
                    FieldDescriptor::optional::<Momt>(MATERIALS, 4),
                    FieldDescriptor::optional::<Modn>(DOODAD_NAMES, 5),
                ],
            )
        })
    }
}

/// Fog table (`.wdt` fog file).
///
/// Ab TWW folgt auf VFOG genau ein VFEX-Chunk pro Fog-Eintrag.
pub mod fog_table {
    use std::sync::OnceLock;

    use crate::formats::Mver;
    use crate::formats::wdt::{Vfex, Vfog};
    use crate::schema::{FieldDescriptor, Schema};
    use crate::version::{FormatVersion, VersionRange};

    pub const VERSION: &str = "version";
    pub const VOLUME_FOGS: &str = "volume_fogs";
    pub const VOLUME_FOG_EXTENSIONS: &str = "volume_fog_extensions";

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            super::predefined(
                "FogTable",
                vec![
                    FieldDescriptor::single::<Mver>(VERSION, 1),
                    FieldDescriptor::counter::<Vfog>(VOLUME_FOGS, 2),
                    FieldDescriptor::list::<Vfex>(VOLUME_FOG_EXTENSIONS, 3)
                        .counted_by(VOLUME_FOGS)
                        .versions(VersionRange::since(FormatVersion::TheWarWithin)),
                ],
            )
        })
    }
}

/// Selects one of the built-in kinds by name (CLI, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    TextureBlob,
    TerrainTile,
    WorldModelRoot,
    FogTable,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] =
        [Self::TextureBlob, Self::TerrainTile, Self::WorldModelRoot, Self::FogTable];

    pub fn schema(self) -> &'static Schema {
        match self {
            Self::TextureBlob => texture_blob::schema(),
            Self::TerrainTile => terrain_tile::schema(),
            Self::WorldModelRoot => world_model_root::schema(),
            Self::FogTable => fog_table::schema(),
        }
    }

    /// Short name as accepted by [`FromStr`].
    pub fn short_name(self) -> &'static str {
        match self {
            Self::TextureBlob => "blob",
            Self::TerrainTile => "adt",
            Self::WorldModelRoot => "wmo",
            Self::FogTable => "fog",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema().name())
    }
}

impl FromStr for DocumentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.short_name().eq_ignore_ascii_case(s) || k.schema().name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_schema(format!("unknown document kind '{s}'")))
    }
}
