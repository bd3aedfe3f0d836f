// src/jit/types.rs
use std::fmt;

/// Module-scoped identifier for a function or a jump label.
///
/// Markers are dense non-negative integers, allocated monotonically and
/// never reused. A function marker resolves to an absolute address at link
/// time; a label marker resolves to a buffer offset when its function is
/// finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Marker(pub u32);

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Virtual register produced by a builder operation.
///
/// Dense integer local to one function. The value a virtual register holds
/// is immutable once produced; only its location (literal, relocation, host
/// register, stack slot) changes over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VReg(pub u32);

impl VReg {
    /// Sentinel returned by operations that produce no value, such as a
    /// call with a `void` return type.
    pub const INVALID: Self = Self(u32::MAX);

    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() { write!(f, "v{}", self.0) } else { f.write_str("v<invalid>") }
    }
}

/// Value types the generator knows about.
///
/// Only `Void` and `I64` are operable; `I32` and `Data` are reserved and
/// rejected by every operation that would have to pick an instruction width
/// for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JitType {
    Void,
    I32,
    I64,
    /// Opaque byte blob of a known size.
    Data(u32),
}

impl JitType {
    /// Storage size in bytes.
    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            Self::Void => 0,
            Self::I32 => 4,
            Self::I64 => 8,
            Self::Data(size) => size,
        }
    }
}

impl fmt::Display for JitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::Data(size) => write!(f, "data({size})"),
        }
    }
}
