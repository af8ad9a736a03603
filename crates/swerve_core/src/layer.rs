//! Interaction layer masks
//!
//! Obstacles declare which layers they occupy; agents declare occupation
//! plus an ignore mask. The solver skips a pair when the masks do not
//! intersect. The mask values themselves are owned and validated here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Bitmask over the 32 interaction layers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// No layers: the member interacts with nothing.
    pub const NONE: LayerMask = LayerMask(0);
    /// Every layer.
    pub const ANY: LayerMask = LayerMask(u32::MAX);

    /// Mask with the single layer `n` set (`n` in 0..32).
    #[inline]
    pub const fn layer(n: u32) -> Self {
        debug_assert!(n < 32);
        LayerMask(1 << n)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if the two masks share at least one layer.
    #[inline]
    pub const fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every layer of `other` is set in `self`.
    #[inline]
    pub const fn contains(&self, other: LayerMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ANY
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;
    fn bitor(self, rhs: Self) -> Self {
        LayerMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for LayerMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LayerMask {
    type Output = LayerMask;
    fn bitand(self, rhs: Self) -> Self {
        LayerMask(self.0 & rhs.0)
    }
}

impl BitAndAssign for LayerMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for LayerMask {
    type Output = LayerMask;
    fn not(self) -> Self {
        LayerMask(!self.0)
    }
}

impl fmt::Debug for LayerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LayerMask::NONE => write!(f, "LayerMask(NONE)"),
            LayerMask::ANY => write!(f, "LayerMask(ANY)"),
            LayerMask(bits) => write!(f, "LayerMask({bits:#010x})"),
        }
    }
}
