//! Explicit 32-bit flag set used by conditional payload layouts.

use core::fmt;
use core::ops::BitOr;

/// A raw 32-bit flags value.
///
/// Unbekannte Bits werden nie verworfen: sie bleiben im Wert erhalten und
/// werden unverändert zurückgeschrieben.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `true` wenn alle Bits aus `mask` gesetzt sind.
    pub const fn contains(self, mask: u32) -> bool {
        self.0 & mask == mask
    }

    /// `true` wenn mindestens ein Bit aus `mask` gesetzt ist.
    pub const fn intersects(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    pub fn insert(&mut self, mask: u32) {
        self.0 |= mask;
    }

    pub fn remove(&mut self, mask: u32) {
        self.0 &= !mask;
    }

    pub fn set(&mut self, mask: u32, on: bool) {
        if on {
            self.insert(mask);
        } else {
            self.remove(mask);
        }
    }

    /// Bits outside `known_mask`.
    pub const fn unknown_bits(self, known_mask: u32) -> u32 {
        self.0 & !known_mask
    }
}

impl From<u32> for Flags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl BitOr<u32> for Flags {
    type Output = Flags;

    fn bitor(self, rhs: u32) -> Flags {
        Flags(self.0 | rhs)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#010x})", self.0)
    }
}
