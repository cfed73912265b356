//! Container options: version, dialect and parse policy.
//!
//! # Beispiel
//!
//! ```
//! use chunkdoc::{ContainerOptions, Dialect, FormatVersion, UnknownChunkPolicy};
//!
//! let opts = ContainerOptions::default()
//!     .with_version(FormatVersion::Legion)
//!     .with_dialect(Dialect::Forward)
//!     .with_unknown_chunks(UnknownChunkPolicy::Reject)
//!     .with_max_chunk_size(1 << 20);
//!
//! assert_eq!(opts.version(), FormatVersion::Legion);
//! assert_eq!(opts.unknown_chunks(), UnknownChunkPolicy::Reject);
//! assert!(opts.validate().is_ok());
//! ```

use crate::signature::Dialect;
use crate::version::FormatVersion;
use crate::{Error, Result};

/// What the binder does with a frame whose signature no descriptor knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownChunkPolicy {
    /// Keep it as an opaque chunk and re-emit it on save (default).
    #[default]
    Preserve,
    /// Fail the load with [`Error::UnknownChunk`].
    Reject,
}

/// Options controlling how a container is bound and written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    pub(crate) version: FormatVersion,
    pub(crate) dialect: Dialect,
    pub(crate) unknown_chunks: UnknownChunkPolicy,
    pub(crate) max_chunk_size: Option<u32>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            version: FormatVersion::LATEST,
            dialect: Dialect::Reversed,
            unknown_chunks: UnknownChunkPolicy::Preserve,
            max_chunk_size: None,
        }
    }
}

impl ContainerOptions {
    // --- Getter ---

    /// Active format version; gates which descriptors participate.
    pub fn version(&self) -> FormatVersion { self.version }
    /// Signature byte order on disk.
    pub fn dialect(&self) -> Dialect { self.dialect }
    /// Handling of frames no descriptor knows.
    pub fn unknown_chunks(&self) -> UnknownChunkPolicy { self.unknown_chunks }
    /// Upper bound for a single frame payload on load.
    pub fn max_chunk_size(&self) -> Option<u32> { self.max_chunk_size }

    // --- Builder-Setter (Fluent API) ---

    /// Setzt die Format-Version.
    pub fn with_version(mut self, version: FormatVersion) -> Self { self.version = version; self }
    /// Setzt den Dialekt.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self { self.dialect = dialect; self }
    /// Setzt die Policy für unbekannte Chunks.
    pub fn with_unknown_chunks(mut self, policy: UnknownChunkPolicy) -> Self { self.unknown_chunks = policy; self }
    /// Setzt das Payload-Limit.
    pub fn with_max_chunk_size(mut self, size: u32) -> Self { self.max_chunk_size = Some(size); self }

    // --- Mutable Setter ---

    /// Setzt die Format-Version.
    pub fn set_version(&mut self, version: FormatVersion) { self.version = version; }
    /// Setzt den Dialekt.
    pub fn set_dialect(&mut self, dialect: Dialect) { self.dialect = dialect; }
    /// Setzt die Policy für unbekannte Chunks.
    pub fn set_unknown_chunks(&mut self, policy: UnknownChunkPolicy) { self.unknown_chunks = policy; }
    /// Setzt das Payload-Limit.
    pub fn set_max_chunk_size(&mut self, size: Option<u32>) { self.max_chunk_size = size; }

    /// Validates the option combination.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOptionCombination` if `max_chunk_size` is `Some(0)`.
    pub fn validate(&self) -> Result<()> {
        // Leere Frames (Länge 0) sind gültig, ein Limit von 0 würde aber jede Payload ablehnen
        if self.max_chunk_size == Some(0) {
            return Err(Error::InvalidOptionCombination("max_chunk_size must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = ContainerOptions::default();
        assert_eq!(opts.version(), FormatVersion::TheWarWithin);
        assert_eq!(opts.dialect(), Dialect::Reversed);
        assert_eq!(opts.unknown_chunks(), UnknownChunkPolicy::Preserve);
        assert_eq!(opts.max_chunk_size(), None);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn builder_and_setter_agree() {
        let built = ContainerOptions::default()
            .with_version(FormatVersion::Cataclysm)
            .with_dialect(Dialect::Forward)
            .with_unknown_chunks(UnknownChunkPolicy::Reject)
            .with_max_chunk_size(64);

        let mut set = ContainerOptions::default();
        set.set_version(FormatVersion::Cataclysm);
        set.set_dialect(Dialect::Forward);
        set.set_unknown_chunks(UnknownChunkPolicy::Reject);
        set.set_max_chunk_size(Some(64));

        assert_eq!(built, set);
    }

    #[test]
    fn zero_max_chunk_size_is_invalid() {
        let opts = ContainerOptions::default().with_max_chunk_size(0);
        assert!(matches!(opts.validate(), Err(Error::InvalidOptionCombination(_))));
    }
}
