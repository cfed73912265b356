//! World model root payloads, kept verbatim.

raw_chunk!(
    /// Root header (counts, ambient color, bounding box).
    Mohd,
    b"MOHD"
);
raw_chunk!(
    /// Zero-terminated texture file names.
    Motx,
    b"MOTX"
);
raw_chunk!(
    /// Material definitions.
    Momt,
    b"MOMT"
);
raw_chunk!(
    /// Zero-terminated doodad file names.
    Modn,
    b"MODN"
);
