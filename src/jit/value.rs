// src/jit/value.rs
use super::types::{JitType, Marker, VReg};
use crate::asm::register::GPRegister64;
use std::fmt;

/// Where a virtual register's value currently lives.
///
/// `Literal` and `Reloc` are latent states: no host resource is held and the
/// value is materialized on demand. They are also authoritative — a literal
/// that has been copied into a host register at one use may be materialized
/// again from the literal at a later use. `HostReg` and `StackSlot` name a
/// held resource and move between each other through spills and reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A known 64-bit constant.
    Literal(i64),
    /// The address of a marker, patched at link time.
    Reloc(Marker),
    /// One of the sixteen general-purpose registers.
    HostReg(GPRegister64),
    /// A byte offset into the function's stack frame.
    StackSlot(u32),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "literal {value}"),
            Self::Reloc(marker) => write!(f, "reloc {marker}"),
            Self::HostReg(reg) => write!(f, "{reg}"),
            Self::StackSlot(offset) => write!(f, "[rsp + {offset}]"),
        }
    }
}

/// Type and location of one virtual register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VRegData {
    pub ty: JitType,
    pub loc: Location,
}

/// Per-block map from virtual register to its data.
///
/// Indexed by the VReg id. A `None` row means the register was created in a
/// block whose lineage does not reach this one; touching such a register is
/// a contract violation.
#[derive(Debug, Clone, Default)]
pub struct VRegTable {
    rows: Vec<Option<VRegData>>,
}

impl VRegTable {
    #[must_use]
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Records a freshly produced virtual register.
    pub fn define(&mut self, vreg: VReg, data: VRegData) {
        let index = vreg.index();
        if index >= self.rows.len() {
            self.rows.resize(index + 1, None);
        }
        assert!(self.rows[index].is_none(), "virtual register {vreg} defined twice");
        self.rows[index] = Some(data);
    }

    #[must_use]
    pub fn get(&self, vreg: VReg) -> &VRegData {
        assert!(vreg.is_valid(), "operation on the invalid virtual register sentinel");
        self.rows
            .get(vreg.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("virtual register {vreg} is not visible in this block"))
    }

    pub fn get_mut(&mut self, vreg: VReg) -> &mut VRegData {
        assert!(vreg.is_valid(), "operation on the invalid virtual register sentinel");
        self.rows
            .get_mut(vreg.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("virtual register {vreg} is not visible in this block"))
    }

    /// Iterates the registers visible in this block.
    pub fn iter(&self) -> impl Iterator<Item = (VReg, &VRegData)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_ref().map(|data| (VReg(index as u32), data)))
    }
}
