// src/jit/block.rs
use super::frame::StackFrame;
use super::regalloc::HostRegFile;
use super::types::JitType;
use super::value::{Location, VRegTable};
use crate::asm::register::GPRegister64;

/// Handle to a basic block of one function.
///
/// The handle stays usable after the block closes; successor blocks are
/// opened from it and inherit its state at the point it closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block(pub(crate) usize);

/// The state a block carries: the virtual-register map, the stack-frame map,
/// and the host-register map.
///
/// Opening a successor block deep-copies the whole triple, so control-flow
/// joins see a consistent operand view without any dataflow analysis. The
/// copy taken when a block closes is its snapshot.
#[derive(Debug, Clone, Default)]
pub struct BlockState {
    pub vregs: VRegTable,
    pub frame: StackFrame,
    pub hwregs: HostRegFile,
}

impl BlockState {
    #[must_use]
    pub fn new() -> Self {
        Self { vregs: VRegTable::new(), frame: StackFrame::new(), hwregs: HostRegFile::new() }
    }

    /// Cross-checks the three maps against each other.
    ///
    /// Panics if any virtual register, host register, or frame byte is
    /// claimed inconsistently. Cheap enough to run after every operation in
    /// tests; production emission relies on the maps being updated in lock
    /// step.
    pub fn verify_consistency(&self, reserved: &[GPRegister64]) {
        // host-register map vs. vreg map
        for (reg, vreg) in self.hwregs.iter_owned() {
            assert!(
                !reserved.contains(&reg),
                "reserved register {reg} is owned by {vreg}"
            );
            let row = self.vregs.get(vreg);
            assert!(
                row.loc == Location::HostReg(reg),
                "{vreg} is recorded in {reg} but locates itself at {}",
                row.loc
            );
        }
        // frame map vs. vreg map
        let cells = self.frame.cells();
        let mut i = 0;
        while i < cells.len() {
            let Some(vreg) = cells[i] else {
                i += 1;
                continue;
            };
            let row = self.vregs.get(vreg);
            let Location::StackSlot(offset) = row.loc else {
                panic!("frame byte {i} is owned by {vreg}, which locates itself at {}", row.loc);
            };
            let size = row.ty.size() as usize;
            assert!(
                offset as usize == i,
                "frame run for {vreg} starts at byte {i}, but the register records offset {offset}"
            );
            for k in 0..size {
                assert!(
                    cells[i + k] == Some(vreg),
                    "frame byte {} inside the run of {vreg} is owned by {:?}",
                    i + k,
                    cells[i + k]
                );
            }
            i += size;
        }
        // vreg map vs. both resource maps
        for (vreg, row) in self.vregs.iter() {
            match row.loc {
                Location::HostReg(reg) => {
                    assert!(
                        self.hwregs.owner(reg) == Some(vreg),
                        "{vreg} locates itself in {reg}, owned by {:?}",
                        self.hwregs.owner(reg)
                    );
                }
                Location::StackSlot(offset) => {
                    let size = row.ty.size() as usize;
                    for k in 0..size {
                        assert!(
                            cells.get(offset as usize + k) == Some(&Some(vreg)),
                            "{vreg} locates itself at frame offset {offset}, but the bytes are not its own"
                        );
                    }
                }
                Location::Literal(_) | Location::Reloc(_) => {
                    assert!(
                        row.ty == JitType::Void || row.ty == JitType::I64,
                        "latent {vreg} has unsupported type {}",
                        row.ty
                    );
                }
            }
        }
    }
}
