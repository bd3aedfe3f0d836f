// src/jit/backend.rs
use crate::asm::abi::{CallingConvention, SystemV};
use std::fmt;

/// Code-generation target.
///
/// The single seam where another architecture or calling convention would
/// plug in: a target resolves to the register conventions the builder and
/// allocator consult. x86-64 System V is the only implemented target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    X86_64SysV,
}

impl Target {
    /// The calling convention this target emits for.
    #[must_use]
    pub fn abi(self) -> &'static dyn CallingConvention {
        match self {
            Self::X86_64SysV => &SystemV,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X86_64SysV => f.write_str("x86-64 System V"),
        }
    }
}
