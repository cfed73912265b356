//! Format versions (client expansions) and half-open version ranges.
//!
//! Die Version wird vom Aufrufer vorgegeben und gated, welche Felder eines
//! Schemas beim Lesen und Schreiben aktiv sind.

use core::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Target format version, ordered from oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVersion {
    Classic,
    BurningCrusade,
    WrathOfTheLichKing,
    Cataclysm,
    MistsOfPandaria,
    WarlordsOfDraenor,
    Legion,
    BattleForAzeroth,
    Shadowlands,
    Dragonflight,
    TheWarWithin,
}

impl FormatVersion {
    /// All versions in ascending order.
    pub const ALL: [FormatVersion; 11] = [
        Self::Classic,
        Self::BurningCrusade,
        Self::WrathOfTheLichKing,
        Self::Cataclysm,
        Self::MistsOfPandaria,
        Self::WarlordsOfDraenor,
        Self::Legion,
        Self::BattleForAzeroth,
        Self::Shadowlands,
        Self::Dragonflight,
        Self::TheWarWithin,
    ];

    /// Newest known version.
    pub const LATEST: FormatVersion = Self::TheWarWithin;

    /// Kurzname wie in Tools üblich (`lk`, `cata`, `tww`, ...).
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::BurningCrusade => "tbc",
            Self::WrathOfTheLichKing => "lk",
            Self::Cataclysm => "cata",
            Self::MistsOfPandaria => "mop",
            Self::WarlordsOfDraenor => "wod",
            Self::Legion => "legion",
            Self::BattleForAzeroth => "bfa",
            Self::Shadowlands => "sl",
            Self::Dragonflight => "df",
            Self::TheWarWithin => "tww",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    /// Akzeptiert Kurznamen und vollständige Namen, case-insensitive.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.short_name() == lower || v.to_string().to_ascii_lowercase() == lower)
            .ok_or_else(|| Error::UnknownFormatVersion(s.to_string()))
    }
}

/// Half-open version range `[min, max)`; `max == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    min: FormatVersion,
    max: Option<FormatVersion>,
}

impl VersionRange {
    /// Every version.
    pub const fn all() -> Self {
        Self { min: FormatVersion::Classic, max: None }
    }

    /// `[version, ∞)`.
    pub const fn since(version: FormatVersion) -> Self {
        Self { min: version, max: None }
    }

    /// `[Classic, version)`.
    pub const fn before(version: FormatVersion) -> Self {
        Self { min: FormatVersion::Classic, max: Some(version) }
    }

    /// `[min, max)`.
    pub const fn between(min: FormatVersion, max: FormatVersion) -> Self {
        Self { min, max: Some(max) }
    }

    /// A range that contains no version.
    pub const fn none() -> Self {
        Self { min: FormatVersion::Classic, max: Some(FormatVersion::Classic) }
    }

    pub fn min(&self) -> FormatVersion {
        self.min
    }

    pub fn max(&self) -> Option<FormatVersion> {
        self.max
    }

    pub fn contains(&self, version: FormatVersion) -> bool {
        version >= self.min && self.max.map_or(true, |max| version < max)
    }

    /// `true` wenn `other` vollständig in `self` liegt.
    pub fn covers(&self, other: &VersionRange) -> bool {
        if other.is_empty() {
            return true;
        }
        let max_ok = match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        };
        other.min >= self.min && max_ok
    }

    pub fn is_empty(&self) -> bool {
        self.max.is_some_and(|max| max <= self.min)
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {})", self.min, max),
            None => write!(f, "[{}, ..)", self.min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FormatVersion::*;

    #[test]
    fn versions_are_ordered() {
        assert!(Classic < BurningCrusade);
        assert!(Legion < TheWarWithin);
        let mut sorted = FormatVersion::ALL;
        sorted.sort();
        assert_eq!(sorted, FormatVersion::ALL);
    }

    #[test]
    fn range_is_half_open() {
        let r = VersionRange::between(WrathOfTheLichKing, Legion);
        assert!(!r.contains(BurningCrusade));
        assert!(r.contains(WrathOfTheLichKing));
        assert!(r.contains(WarlordsOfDraenor));
        assert!(!r.contains(Legion));
    }

    #[test]
    fn since_and_before() {
        assert!(VersionRange::since(Legion).contains(TheWarWithin));
        assert!(!VersionRange::since(Legion).contains(WarlordsOfDraenor));
        assert!(VersionRange::before(Cataclysm).contains(Classic));
        assert!(!VersionRange::before(Cataclysm).contains(Cataclysm));
        assert!(VersionRange::none().is_empty());
        assert!(FormatVersion::ALL.iter().all(|v| !VersionRange::none().contains(*v)));
    }

    #[test]
    fn covers_subranges() {
        let all = VersionRange::all();
        assert!(all.covers(&VersionRange::since(Legion)));
        assert!(VersionRange::since(Cataclysm).covers(&VersionRange::between(Legion, Shadowlands)));
        assert!(!VersionRange::before(Legion).covers(&VersionRange::since(Cataclysm)));
        assert!(!VersionRange::since(Legion).covers(&VersionRange::all()));
        assert!(VersionRange::since(Legion).covers(&VersionRange::none()));
    }

    #[test]
    fn parse_short_and_long_names() {
        assert_eq!("lk".parse::<FormatVersion>().unwrap(), WrathOfTheLichKing);
        assert_eq!("Legion".parse::<FormatVersion>().unwrap(), Legion);
        assert_eq!("THEWARWITHIN".parse::<FormatVersion>().unwrap(), TheWarWithin);
        assert_eq!(
            "vanilla+".parse::<FormatVersion>().unwrap_err(),
            Error::UnknownFormatVersion("vanilla+".to_string())
        );
    }

    #[test]
    fn range_display() {
        assert_eq!(VersionRange::since(Legion).to_string(), "[Legion, ..)");
        assert_eq!(VersionRange::between(Classic, Cataclysm).to_string(), "[Classic, Cataclysm)");
    }
}
