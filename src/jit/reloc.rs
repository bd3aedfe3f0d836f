// src/jit/reloc.rs
use super::types::Marker;

/// Shape of a link-time patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocKind {
    /// 32-bit PC-relative displacement of a `call rel32` site.
    CallRel32,
    /// 64-bit absolute immediate of a `mov reg, imm64` site.
    Abs64,
}

/// A recorded (site, marker, kind) triple telling the linker where to patch
/// and with what shape. Offsets are relative to the owning function's
/// buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub offset: usize,
    pub marker: Marker,
    pub kind: RelocKind,
}

/// A pending intra-function jump displacement, patched when the function is
/// finalized and the label's offset is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelFixup {
    pub offset: usize,
    pub marker: Marker,
}
