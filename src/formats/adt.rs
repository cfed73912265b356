//! Terrain tile payloads (MFBO, MODF, MLMX, MCNK).

use crate::byteio::{ByteReader, ByteWriter};
use crate::chunk::{Chunk, ChunkContext, Flagged};
use crate::flags::Flags;
use crate::formats::{expect_end, read_entries, write_entries, Entry};
use crate::layout::{LayoutField, LayoutRecord, LayoutSpec, Presence, Width};
use crate::signature::Signature;
use crate::version::FormatVersion;
use crate::Result;

/// Flight bounds: two planes of 3×3 heights, maximum first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mfbo {
    pub maximum: [i16; 9],
    pub minimum: [i16; 9],
}

impl Chunk for Mfbo {
    const SIGNATURE: Signature = Signature::new(*b"MFBO");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        let mut r = ByteReader::new(payload);
        let mut out = Self::default();
        for v in out.maximum.iter_mut().chain(out.minimum.iter_mut()) {
            *v = r.read_i16()?;
        }
        expect_end(Self::SIGNATURE, &r)?;
        Ok(out)
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(36);
        for v in self.maximum.iter().chain(&self.minimum) {
            w.write_i16(*v);
        }
        Ok(w.into_vec())
    }
}

/// One world model placement (64 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModfEntry {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    /// Minimum, dann Maximum.
    pub bounding_box: [[f32; 3]; 2],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub scale: u16,
}

impl Entry for ModfEntry {
    const SIZE: usize = 64;

    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            name_id: r.read_u32()?,
            unique_id: r.read_u32()?,
            position: r.read_vec3()?,
            rotation: r.read_vec3()?,
            bounding_box: [r.read_vec3()?, r.read_vec3()?],
            flags: r.read_u16()?,
            doodad_set: r.read_u16()?,
            name_set: r.read_u16()?,
            scale: r.read_u16()?,
        })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_u32(self.name_id);
        w.write_u32(self.unique_id);
        w.write_vec3(self.position);
        w.write_vec3(self.rotation);
        w.write_vec3(self.bounding_box[0]);
        w.write_vec3(self.bounding_box[1]);
        w.write_u16(self.flags);
        w.write_u16(self.doodad_set);
        w.write_u16(self.name_set);
        w.write_u16(self.scale);
    }
}

/// World model placements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modf {
    pub entries: Vec<ModfEntry>,
}

impl Chunk for Modf {
    const SIGNATURE: Signature = Signature::new(*b"MODF");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        Ok(Self { entries: read_entries(Self::SIGNATURE, payload)? })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(write_entries(&self.entries))
    }
}

/// Model extents of one placement (28 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MlmxEntry {
    pub bounding_box: [[f32; 3]; 2],
    pub radius: f32,
}

impl Entry for MlmxEntry {
    const SIZE: usize = 28;

    fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self { bounding_box: [r.read_vec3()?, r.read_vec3()?], radius: r.read_f32()? })
    }

    fn write(&self, w: &mut ByteWriter) {
        w.write_vec3(self.bounding_box[0]);
        w.write_vec3(self.bounding_box[1]);
        w.write_f32(self.radius);
    }
}

/// Level-of-detail model extents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mlmx {
    pub entries: Vec<MlmxEntry>,
}

impl Chunk for Mlmx {
    const SIGNATURE: Signature = Signature::new(*b"MLMX");

    fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
        Ok(Self { entries: read_entries(Self::SIGNATURE, payload)? })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        Ok(write_entries(&self.entries))
    }
}

/// Flag bits of the map chunk header.
pub mod mcnk_flags {
    pub const HAS_BAKED_SHADOWS: u32 = 0x1;
    pub const IMPASSIBLE: u32 = 0x2;
    pub const IS_RIVER: u32 = 0x4;
    pub const IS_OCEAN: u32 = 0x8;
    pub const IS_MAGMA: u32 = 0x10;
    pub const IS_SLIME: u32 = 0x20;
    pub const HAS_VERTEX_SHADING: u32 = 0x40;
    pub const UNKNOWN_0X80: u32 = 0x80;
    pub const DO_NOT_FIX_ALPHA_MAP: u32 = 0x8000;
    pub const USES_HIGH_RES_HOLES: u32 = 0x10000;

    pub const KNOWN: u32 = HAS_BAKED_SHADOWS
        | IMPASSIBLE
        | IS_RIVER
        | IS_OCEAN
        | IS_MAGMA
        | IS_SLIME
        | HAS_VERTEX_SHADING
        | UNKNOWN_0X80
        | DO_NOT_FIX_ALPHA_MAP
        | USES_HIGH_RES_HOLES;
}

use mcnk_flags::{HAS_VERTEX_SHADING, USES_HIGH_RES_HOLES};

/// Header layout of a map chunk.
///
/// `high_res_holes` und `low_res_holes` schließen sich gegenseitig aus.
pub static MCNK_HEADER: LayoutSpec = LayoutSpec {
    name: "MCNK",
    flags_field: "flags",
    known_flags: mcnk_flags::KNOWN,
    fields: &[
        LayoutField::new("map_index_x", Width::U32),
        LayoutField::new("map_index_y", Width::U32),
        LayoutField::new("texture_layer_count", Width::U32),
        LayoutField::new("model_reference_count", Width::U32),
        LayoutField::new("high_res_holes", Width::U64).when(Presence::IfSet(USES_HIGH_RES_HOLES)),
        LayoutField::new("heightmap_offset", Width::U32),
        LayoutField::new("vertex_normal_offset", Width::U32),
        LayoutField::new("texture_layers_offset", Width::U32),
        LayoutField::new("model_references_offset", Width::U32),
        LayoutField::new("alpha_maps_offset", Width::U32),
        LayoutField::new("alpha_maps_size", Width::U32),
        LayoutField::new("baked_shadows_offset", Width::U32),
        LayoutField::new("baked_shadows_size", Width::U32),
        LayoutField::new("area_id", Width::U32),
        LayoutField::new("world_model_object_reference_count", Width::U32),
        LayoutField::new("low_res_holes", Width::U16).when(Presence::IfClear(USES_HIGH_RES_HOLES)),
        LayoutField::new("unknown", Width::U16),
        LayoutField::new("low_res_texture_map", Width::U16),
        LayoutField::new("pred_tex", Width::U32),
        LayoutField::new("no_effect_doodad", Width::U32),
        LayoutField::new("sound_emitters_offset", Width::U32),
        LayoutField::new("sound_emitter_count", Width::U32),
        LayoutField::new("liquid_offset", Width::U32),
        LayoutField::new("liquid_size", Width::U32),
        LayoutField::new("map_tile_position", Width::Vec3),
        LayoutField::new("vertex_shading_offset", Width::U32).when(Presence::IfSet(HAS_VERTEX_SHADING)),
    ],
};

/// Map chunk: flag dependent header plus the raw sub-chunk region.
#[derive(Debug, Clone, PartialEq)]
pub struct Mcnk {
    pub header: LayoutRecord,
    /// Alles hinter dem Header, unverändert.
    pub subchunks: Vec<u8>,
}

impl Mcnk {
    /// Zeroed header for `flags` and no sub-chunks.
    pub fn new(flags: Flags, version: FormatVersion) -> Self {
        Self { header: LayoutRecord::new(&MCNK_HEADER, flags, version), subchunks: Vec::new() }
    }

    /// `(map_index_x, map_index_y)`.
    pub fn map_index(&self) -> Result<(u32, u32)> {
        Ok((self.header.get_u32("map_index_x")?, self.header.get_u32("map_index_y")?))
    }

    /// Holes mask; high-res (u64) or low-res (u16) depending on the flags.
    pub fn holes(&self) -> Result<u64> {
        if self.header.flags().contains(USES_HIGH_RES_HOLES) {
            self.header.get_u64("high_res_holes")
        } else {
            Ok(u64::from(self.header.get_u16("low_res_holes")?))
        }
    }
}

impl Flagged for Mcnk {
    fn flags(&self) -> Flags {
        self.header.flags()
    }
}

impl Chunk for Mcnk {
    const SIGNATURE: Signature = Signature::new(*b"MCNK");

    fn decode(payload: &[u8], ctx: &ChunkContext) -> Result<Self> {
        let mut r = ByteReader::new(payload);
        let header = LayoutRecord::read(&MCNK_HEADER, &mut r, ctx.version)?;
        Ok(Self { header, subchunks: r.read_rest().to_vec() })
    }

    fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(self.header.resolved().byte_len() + self.subchunks.len());
        self.header.write(&mut w);
        w.write_bytes(&self.subchunks);
        Ok(w.into_vec())
    }
}
