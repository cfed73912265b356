    use super::*;
    use crate::byteio::{ByteReader, ByteWriter};
    use crate::chunk::{Chunk, OffsetIndex};
    use crate::frame::write_frame;
    use crate::signature::{Dialect, Signature};
    use crate::version::{FormatVersion, VersionRange};

    // ========================================================================
    // Test-Payloads
    // ========================================================================

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Alpha(u32);

    impl Chunk for Alpha {
        const SIGNATURE: Signature = Signature::new(*b"ALFA");

        fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
            Ok(Alpha(ByteReader::new(payload).read_u32()?))
        }

        fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
            Ok(self.0.to_le_bytes().to_vec())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Beta(Vec<u8>);

    impl Chunk for Beta {
        const SIGNATURE: Signature = Signature::new(*b"BETA");

        fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
            Ok(Beta(payload.to_vec()))
        }

        fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Gamma(Vec<u8>);

    impl Chunk for Gamma {
        const SIGNATURE: Signature = Signature::new(*b"GAMA");

        fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
            Ok(Gamma(payload.to_vec()))
        }

        fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    /// Index: ein u32-Offset pro Eintrag.
    #[derive(Debug, Clone, PartialEq)]
    struct Idx(Vec<u32>);

    impl Chunk for Idx {
        const SIGNATURE: Signature = Signature::new(*b"IDX_");

        fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
            let mut r = ByteReader::new(payload);
            let mut out = Vec::new();
            while !r.is_empty() {
                out.push(r.read_u32()?);
            }
            Ok(Idx(out))
        }

        fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
            let mut w = ByteWriter::new();
            for v in &self.0 {
                w.write_u32(*v);
            }
            Ok(w.into_vec())
        }
    }

    impl OffsetIndex for Idx {
        fn entry_count(&self) -> usize {
            self.0.len()
        }

        fn offsets(&self) -> Vec<u32> {
            self.0.clone()
        }

        fn set_offsets(&mut self, offsets: &[u32]) -> Result<()> {
            self.0 = offsets.to_vec();
            Ok(())
        }
    }

    const ALFA: Signature = Alpha::SIGNATURE;
    const BETA: Signature = Beta::SIGNATURE;
    const GAMA: Signature = Gamma::SIGNATURE;
    const IDX: Signature = Idx::SIGNATURE;
    const BLOB: Signature = Signature::new(*b"BLOB");

    #[derive(Debug, Clone, PartialEq)]
    struct Blob(Vec<u8>);

    impl Chunk for Blob {
        const SIGNATURE: Signature = BLOB;

        fn decode(payload: &[u8], _ctx: &ChunkContext) -> Result<Self> {
            Ok(Blob(payload.to_vec()))
        }

        fn encode(&self, _ctx: &ChunkContext) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    // ========================================================================
    // Helfer
    // ========================================================================

    fn buffer(frames: &[(Signature, &[u8])]) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for (sig, payload) in frames {
            write_frame(&mut w, *sig, payload, Dialect::Reversed).unwrap();
        }
        w.into_vec()
    }

    fn abc_schema() -> Schema {
        Schema::new(
            "abc",
            vec![
                FieldDescriptor::single::<Alpha>("a", 1),
                FieldDescriptor::list::<Beta>("b", 2),
                FieldDescriptor::optional::<Gamma>("c", 3),
            ],
        )
        .unwrap()
    }

    fn array_schema(base: OffsetBase) -> Schema {
        Schema::new(
            "arr",
            vec![
                FieldDescriptor::single::<Alpha>("a", 1),
                FieldDescriptor::index::<Idx>("idx", 2),
                FieldDescriptor::array::<Blob>("blobs", 3, "idx", base),
            ],
        )
        .unwrap()
    }

    fn opts(version: FormatVersion) -> ContainerOptions {
        ContainerOptions::default().with_version(version)
    }

    fn alpha(fields: &BoundFields, name: &str) -> Option<u32> {
        fields.single(name).and_then(|c| c.as_any().downcast_ref::<Alpha>()).map(|a| a.0)
    }

    fn many<T: Chunk>(fields: &BoundFields, name: &str) -> Vec<T> {
        match fields.slot(name) {
            Some(Slot::Many(v)) => v.iter().filter_map(|c| c.as_any().downcast_ref::<T>().cloned()).collect(),
            _ => panic!("{name} is not a list"),
        }
    }

    // ========================================================================
    // single / optional / list
    // ========================================================================

    /// [A, B, B] ohne C: A gebunden, B mit zwei Elementen, C abwesend.
    #[test]
    fn binds_single_list_and_missing_optional() {
        let buf = buffer(&[(ALFA, &7u32.to_le_bytes()), (BETA, &[1]), (BETA, &[2, 2])]);
        let b = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(alpha(&b.fields, "a"), Some(7));
        assert_eq!(many::<Beta>(&b.fields, "b"), [Beta(vec![1]), Beta(vec![2, 2])]);
        assert!(b.fields.slot("c").unwrap().is_empty());
        assert!(b.opaque.is_empty());
    }

    #[test]
    fn any_physical_order_is_accepted() {
        let buf = buffer(&[(GAMA, &[9]), (BETA, &[1]), (ALFA, &1u32.to_le_bytes())]);
        let b = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(alpha(&b.fields, "a"), Some(1));
        assert_eq!(b.fields.slot("b").unwrap().len(), 1);
        assert_eq!(b.fields.slot("c").unwrap().len(), 1);
    }

    /// Ein zweiter B-Lauf gehört nicht mehr zur Liste und bleibt opaque.
    #[test]
    fn list_run_ends_at_first_other_signature() {
        let buf = buffer(&[(BETA, &[1]), (ALFA, &0u32.to_le_bytes()), (BETA, &[2])]);
        let b = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(many::<Beta>(&b.fields, "b"), [Beta(vec![1])]);
        assert_eq!(b.opaque.len(), 1);
        assert_eq!(b.opaque[0].signature, BETA);
        assert_eq!(b.opaque[0].payload, [2]);
        assert_eq!(b.opaque[0].after, Some("a"));
    }

    #[test]
    fn second_single_frame_is_opaque() {
        let buf = buffer(&[(ALFA, &1u32.to_le_bytes()), (ALFA, &2u32.to_le_bytes())]);
        let b = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(alpha(&b.fields, "a"), Some(1));
        assert_eq!(b.opaque.len(), 1);
        assert_eq!(b.opaque[0].offset, 12);
    }

    #[test]
    fn missing_mandatory_single_fails() {
        let buf = buffer(&[(BETA, &[1])]);
        let err = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap_err();
        assert_eq!(err, Error::RequiredChunkMissing { field: "a", signature: ALFA });
    }

    #[test]
    fn mandatory_range_outside_version_is_tolerated() {
        let schema = Schema::new(
            "m",
            vec![FieldDescriptor::single::<Alpha>("a", 1).mandatory(VersionRange::since(FormatVersion::Legion))],
        )
        .unwrap();
        assert!(bind(&[], &schema, &opts(FormatVersion::Cataclysm)).is_ok());
        assert!(matches!(
            bind(&[], &schema, &opts(FormatVersion::Legion)),
            Err(Error::RequiredChunkMissing { field: "a", .. })
        ));
    }

    // ========================================================================
    // Versionen / unbekannte Chunks
    // ========================================================================

    #[test]
    fn inactive_descriptor_never_matches() {
        let schema = Schema::new(
            "v",
            vec![
                FieldDescriptor::single::<Alpha>("a", 1),
                FieldDescriptor::optional::<Gamma>("c", 2).versions(VersionRange::since(FormatVersion::Legion)),
            ],
        )
        .unwrap();
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (GAMA, &[5])]);

        let old = bind(&buf, &schema, &opts(FormatVersion::Cataclysm)).unwrap();
        assert!(old.fields.slot("c").unwrap().is_empty());
        assert_eq!(old.opaque.len(), 1);
        assert_eq!(old.opaque[0].after, Some("a"));

        let new = bind(&buf, &schema, &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(new.fields.slot("c").unwrap().len(), 1);
        assert!(new.opaque.is_empty());
    }

    /// Versions-gegatete Frames gelten als bekannt, auch bei Reject.
    #[test]
    fn reject_policy_only_rejects_unknown_signatures() {
        let schema = Schema::new(
            "v",
            vec![
                FieldDescriptor::single::<Alpha>("a", 1),
                FieldDescriptor::optional::<Gamma>("c", 2).versions(VersionRange::since(FormatVersion::Legion)),
            ],
        )
        .unwrap();
        let strict = opts(FormatVersion::Cataclysm).with_unknown_chunks(UnknownChunkPolicy::Reject);

        let gated = buffer(&[(ALFA, &0u32.to_le_bytes()), (GAMA, &[5])]);
        assert!(bind(&gated, &schema, &strict).is_ok());

        let unknown = buffer(&[(ALFA, &0u32.to_le_bytes()), (Signature::new(*b"ZZZZ"), &[])]);
        assert_eq!(
            bind(&unknown, &schema, &strict).unwrap_err(),
            Error::UnknownChunk { signature: Signature::new(*b"ZZZZ"), offset: 12 }
        );
    }

    #[test]
    fn unknown_chunk_before_all_fields_has_no_anchor() {
        let buf = buffer(&[(Signature::new(*b"ZZZZ"), &[1, 2]), (ALFA, &0u32.to_le_bytes())]);
        let b = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(b.opaque.len(), 1);
        assert_eq!(b.opaque[0].after, None);
        assert_eq!(b.opaque[0].payload, [1, 2]);
    }

    // ========================================================================
    // Fehler
    // ========================================================================

    #[test]
    fn payload_error_carries_chunk_context() {
        let buf = buffer(&[(BETA, &[]), (ALFA, &[1, 2])]);
        let err = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap_err();
        match err {
            Error::ChunkDecode { signature, offset, source } => {
                assert_eq!(signature, ALFA);
                assert_eq!(offset, 8);
                assert!(matches!(*source, Error::PrematureEndOfPayload { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truncated_buffer_aborts() {
        let mut buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (BETA, &[1, 2, 3])]);
        buf.pop();
        let err = bind(&buf, &abc_schema(), &opts(FormatVersion::Legion)).unwrap_err();
        assert!(matches!(err, Error::TruncatedFrame { offset: 12, needed: 11, available: 10, .. }));
    }

    #[test]
    fn max_chunk_size_limits_payloads() {
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (BETA, &[0; 32])]);
        let options = opts(FormatVersion::Legion).with_max_chunk_size(16);
        assert_eq!(
            bind(&buf, &abc_schema(), &options).unwrap_err(),
            Error::ChunkTooLarge { signature: BETA, length: 32 }
        );
        let zero = opts(FormatVersion::Legion).with_max_chunk_size(0);
        assert!(matches!(bind(&buf, &abc_schema(), &zero), Err(Error::InvalidOptionCombination(_))));
    }

    // ========================================================================
    // Arrays (offset-gesteuert)
    // ========================================================================

    fn idx_payload(offsets: &[u32]) -> Vec<u8> {
        offsets.iter().flat_map(|o| o.to_le_bytes()).collect()
    }

    /// Frames: ALFA(12) IDX(8+8) BLOB(10) BLOB(14)
    #[test]
    fn array_elements_follow_index_offsets() {
        let idx = idx_payload(&[10, 0]);
        let buf = buffer(&[
            (ALFA, &0u32.to_le_bytes()),
            (IDX, &idx),
            (BLOB, &[1, 1]),
            (BLOB, &[2, 2, 2, 2, 2, 2]),
        ]);
        let b = bind(&buf, &array_schema(OffsetBase::FirstDependent), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(many::<Blob>(&b.fields, "blobs"), [Blob(vec![2; 6]), Blob(vec![1, 1])]);
        assert!(b.opaque.is_empty());
    }

    #[test]
    fn index_payload_start_base() {
        // Index-Payload beginnt bei 12 + 8 = 20; erster BLOB bei 28
        let idx = idx_payload(&[8, 18]);
        let buf = buffer(&[
            (ALFA, &0u32.to_le_bytes()),
            (IDX, &idx),
            (BLOB, &[1, 1]),
            (BLOB, &[2, 2, 2, 2, 2, 2]),
        ]);
        let b = bind(&buf, &array_schema(OffsetBase::IndexPayloadStart), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(many::<Blob>(&b.fields, "blobs"), [Blob(vec![1, 1]), Blob(vec![2; 6])]);
    }

    #[test]
    fn stream_start_base() {
        // ALFA 0..12, IDX 12..24, BLOB ab 24
        let idx = idx_payload(&[24]);
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (IDX, &idx), (BLOB, &[7])]);
        let b = bind(&buf, &array_schema(OffsetBase::StreamStart), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(many::<Blob>(&b.fields, "blobs"), [Blob(vec![7])]);
    }

    #[test]
    fn unreferenced_dependents_stay_opaque() {
        let idx = idx_payload(&[0]);
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (IDX, &idx), (BLOB, &[1]), (BLOB, &[2])]);
        let b = bind(&buf, &array_schema(OffsetBase::FirstDependent), &opts(FormatVersion::Legion)).unwrap();
        assert_eq!(many::<Blob>(&b.fields, "blobs"), [Blob(vec![1])]);
        assert_eq!(b.opaque.len(), 1);
        assert_eq!(b.opaque[0].after, Some("blobs"));
    }

    #[test]
    fn offset_onto_wrong_signature_fails() {
        // Zweiter Offset zeigt auf den ALFA-Frame hinter dem BLOB
        let idx = idx_payload(&[0, 9]);
        let buf = buffer(&[(IDX, &idx), (BLOB, &[1]), (ALFA, &0u32.to_le_bytes())]);
        let err = bind(&buf, &array_schema(OffsetBase::FirstDependent), &opts(FormatVersion::Legion)).unwrap_err();
        assert_eq!(err, Error::UnexpectedSignature { expected: BLOB, found: ALFA, offset: 16 + 9 });
    }

    /// ALFA 0..12, IDX 12..24, BETA 24..40 mit eingebettetem BLOB-Header bei
    /// 32, dessen 30 Bytes über die folgenden GAMA-Frames reichen.
    #[test]
    fn max_chunk_size_limits_embedded_array_targets() {
        let mut embedded = ByteWriter::new();
        embedded.write_bytes(b"BOLB");
        embedded.write_u32(30);
        let embedded = embedded.into_vec();
        let idx = idx_payload(&[32]);
        let buf = buffer(&[
            (ALFA, &0u32.to_le_bytes()),
            (IDX, &idx),
            (BETA, &embedded),
            (GAMA, &[0; 14]),
            (GAMA, &[]),
        ]);
        let options = opts(FormatVersion::Legion).with_max_chunk_size(16);
        assert_eq!(
            bind(&buf, &array_schema(OffsetBase::StreamStart), &options).unwrap_err(),
            Error::ChunkTooLarge { signature: BLOB, length: 30 }
        );
    }

    #[test]
    fn offset_past_end_is_truncated() {
        let idx = idx_payload(&[400]);
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (IDX, &idx), (BLOB, &[1])]);
        let err = bind(&buf, &array_schema(OffsetBase::FirstDependent), &opts(FormatVersion::Legion)).unwrap_err();
        assert!(matches!(err, Error::TruncatedFrame { .. }));
    }

    #[test]
    fn entries_without_dependents_fail() {
        let idx = idx_payload(&[0]);
        let buf = buffer(&[(ALFA, &0u32.to_le_bytes()), (IDX, &idx)]);
        let err = bind(&buf, &array_schema(OffsetBase::FirstDependent), &opts(FormatVersion::Legion)).unwrap_err();
        assert_eq!(err, Error::RequiredChunkMissing { field: "blobs", signature: BLOB });
    }
