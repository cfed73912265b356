//! Load/save round trips for every built-in document kind.

use chunkdoc::formats::adt::{mcnk_flags, Mcnk, Mfbo, Mlmx, MlmxEntry, Modf, ModfEntry};
use chunkdoc::formats::tex::{Txbt, TxbtEntry, Txmd, Txvr};
use chunkdoc::formats::wdt::{Vfex, Vfog, VfogEntry};
use chunkdoc::formats::wmo::{Modn, Mohd, Momt, Motx};
use chunkdoc::formats::Mver;
use chunkdoc::kinds::{fog_table, terrain_tile, texture_blob, world_model_root, DocumentKind};
use chunkdoc::{ContainerOptions, Dialect, Document, Flags, FormatVersion};

fn options(version: FormatVersion, dialect: Dialect) -> ContainerOptions {
    ContainerOptions::default().with_version(version).with_dialect(dialect)
}

/// Beispieldokument mit allen Feldern, die in `version` aktiv sind.
fn sample(kind: DocumentKind, version: FormatVersion, dialect: Dialect) -> Document {
    let mut doc = Document::new(kind.schema(), options(version, dialect)).unwrap();
    let active = |name: &str| kind.schema().field(name).unwrap().is_active(version);
    match kind {
        DocumentKind::TextureBlob => {
            doc.set(texture_blob::VERSION, Txvr { version: 2 }).unwrap();
            let entries = (0..4u8)
                .map(|i| TxbtEntry { filename_offset: u32::from(i) * 16, size_x: 64, size_y: 64, ..TxbtEntry::default() })
                .collect();
            doc.set(texture_blob::BLOB_TEXTURE, Txbt { entries }).unwrap();
            for i in 0..4usize {
                doc.push(texture_blob::TEXTURE_DATA, Txmd { data: vec![i as u8; i * 3] }).unwrap();
            }
        }
        DocumentKind::TerrainTile => {
            doc.set(terrain_tile::VERSION, Mver { version: 18 }).unwrap();
            for (i, flags) in [0, mcnk_flags::USES_HIGH_RES_HOLES, mcnk_flags::HAS_VERTEX_SHADING | mcnk_flags::IS_RIVER]
                .into_iter()
                .enumerate()
            {
                let mut chunk = Mcnk::new(Flags::new(flags), version);
                chunk.subchunks = vec![i as u8; 8 * i];
                doc.push(terrain_tile::MAP_CHUNKS, chunk).unwrap();
            }
            doc.set(terrain_tile::PLACEMENTS, Modf { entries: vec![ModfEntry { unique_id: 7, ..ModfEntry::default() }] })
                .unwrap();
            if active(terrain_tile::FLIGHT_BOUNDS) {
                doc.set(terrain_tile::FLIGHT_BOUNDS, Mfbo { maximum: [50; 9], minimum: [-50; 9] }).unwrap();
            }
            if active(terrain_tile::MODEL_EXTENTS) {
                let entry = MlmxEntry { bounding_box: [[-1.0; 3], [1.0; 3]], radius: 1.5 };
                doc.set(terrain_tile::MODEL_EXTENTS, Mlmx { entries: vec![entry] }).unwrap();
            }
        }
        DocumentKind::WorldModelRoot => {
            doc.set(world_model_root::VERSION, Mver { version: 17 }).unwrap();
            doc.set(world_model_root::HEADER, Mohd { data: vec![1; 64] }).unwrap();
            doc.set(world_model_root::TEXTURES, Motx { data: b"a.blp\0b.blp\0".to_vec() }).unwrap();
            doc.set(world_model_root::MATERIALS, Momt { data: vec![2; 64] }).unwrap();
            doc.set(world_model_root::DOODAD_NAMES, Modn { data: b"tree.m2\0".to_vec() }).unwrap();
        }
        DocumentKind::FogTable => {
            doc.set(fog_table::VERSION, Mver { version: 2 }).unwrap();
            let fogs = if active(fog_table::VOLUME_FOG_EXTENSIONS) { 2 } else { 3 };
            doc.set(fog_table::VOLUME_FOGS, Vfog { entries: vec![VfogEntry::default(); fogs] }).unwrap();
            if active(fog_table::VOLUME_FOG_EXTENSIONS) {
                doc.push(fog_table::VOLUME_FOG_EXTENSIONS, Vfex { data: vec![4; 8] }).unwrap();
                doc.push(fog_table::VOLUME_FOG_EXTENSIONS, Vfex { data: vec![5; 8] }).unwrap();
            }
        }
    }
    doc
}

#[test]
fn every_kind_round_trips_for_every_version() {
    for kind in DocumentKind::ALL {
        for version in FormatVersion::ALL {
            for dialect in [Dialect::Reversed, Dialect::Forward] {
                let doc = sample(kind, version, dialect);
                let bytes = doc.save().unwrap_or_else(|e| panic!("{kind} {version}: {e}"));
                let loaded = Document::load(kind.schema(), &bytes, options(version, dialect))
                    .unwrap_or_else(|e| panic!("{kind} {version}: {e}"));
                assert_eq!(loaded, doc, "{kind} {version} {dialect:?}");
                assert_eq!(loaded.save().unwrap(), bytes, "{kind} {version} {dialect:?}");
            }
        }
    }
}

/// Ein für eine neuere Version geschriebenes Dokument lässt sich mit einer
/// älteren Version laden und unverändert zurückschreiben.
#[test]
fn newer_files_survive_older_readers() {
    for kind in DocumentKind::ALL {
        let bytes = sample(kind, FormatVersion::LATEST, Dialect::Reversed).save().unwrap();
        for version in FormatVersion::ALL {
            let doc = Document::load(kind.schema(), &bytes, options(version, Dialect::Reversed))
                .unwrap_or_else(|e| panic!("{kind} {version}: {e}"));
            assert_eq!(doc.save().unwrap(), bytes, "{kind} {version}");
        }
    }
}

#[test]
fn empty_texture_blob_round_trips() {
    let mut doc = Document::new(texture_blob::schema(), ContainerOptions::default()).unwrap();
    doc.set(texture_blob::VERSION, Txvr { version: 1 }).unwrap();
    doc.set(texture_blob::BLOB_TEXTURE, Txbt::default()).unwrap();
    let bytes = doc.save().unwrap();
    assert_eq!(bytes.len(), 20);

    let loaded = Document::load(texture_blob::schema(), &bytes, ContainerOptions::default()).unwrap();
    assert!(loaded.list::<Txmd>(texture_blob::TEXTURE_DATA).unwrap().is_empty());
    assert_eq!(loaded.save().unwrap(), bytes);
}
