// src/jit/regalloc.rs
//! Host-register allocation over the per-block state.
//!
//! The policy is deterministic and deliberately crude: registers are scanned
//! in fixed hardware order, and when none is free the occupant with the
//! smallest virtual-register id is spilled. Two materialization flavors
//! exist: `copy_to` produces a transient copy in a chosen register without
//! touching the canonical location, and `ensure_in_register` moves the
//! canonical location into a register, releasing the old home.

use super::block::BlockState;
use super::reloc::{Relocation, RelocKind};
use super::types::{JitType, VReg};
use super::value::Location;
use crate::asm::abi::CallingConvention;
use crate::asm::buffer::CodeBuffer;
use crate::asm::encoder;
use crate::asm::register::GPRegister64;

/// The sixteen host registers and the virtual register each one holds.
#[derive(Debug, Clone, Default)]
pub struct HostRegFile {
    owners: [Option<VReg>; 16],
}

impl HostRegFile {
    #[must_use]
    pub fn new() -> Self {
        Self { owners: [None; 16] }
    }

    #[inline]
    #[must_use]
    pub fn owner(&self, reg: GPRegister64) -> Option<VReg> {
        self.owners[reg.index()]
    }

    pub fn set_owner(&mut self, reg: GPRegister64, vreg: VReg) {
        assert!(
            self.owners[reg.index()].is_none(),
            "host register {reg} is already occupied"
        );
        self.owners[reg.index()] = Some(vreg);
    }

    pub fn clear(&mut self, reg: GPRegister64) {
        self.owners[reg.index()] = None;
    }

    /// Occupied registers in hardware order.
    pub fn iter_owned(&self) -> impl Iterator<Item = (GPRegister64, VReg)> + '_ {
        GPRegister64::ALL
            .into_iter()
            .filter_map(|reg| self.owners[reg.index()].map(|vreg| (reg, vreg)))
    }
}

impl BlockState {
    /// Picks a host register for `for_vreg` and records the ownership.
    ///
    /// Scans the non-reserved registers in hardware order; when every one is
    /// occupied, the occupant with the smallest virtual-register id is
    /// spilled, except occupants of registers listed in `avoid` (used to pin
    /// an operand that must stay put while its sibling is forced).
    pub fn alloc_host_reg(
        &mut self,
        buf: &mut CodeBuffer,
        cc: &dyn CallingConvention,
        for_vreg: VReg,
        avoid: &[GPRegister64],
    ) -> GPRegister64 {
        let mut victim: Option<(VReg, GPRegister64)> = None;
        for reg in GPRegister64::ALL {
            if cc.reserved_registers().contains(&reg) {
                continue;
            }
            match self.hwregs.owner(reg) {
                None => {
                    self.hwregs.set_owner(reg, for_vreg);
                    return reg;
                }
                Some(occupant) => {
                    if avoid.contains(&reg) {
                        continue;
                    }
                    if victim.is_none_or(|(smallest, _)| occupant < smallest) {
                        victim = Some((occupant, reg));
                    }
                }
            }
        }
        let (occupant, reg) = victim.expect("no host register available for allocation");
        self.spill(buf, occupant);
        self.hwregs.set_owner(reg, for_vreg);
        reg
    }

    /// Evicts `victim` from its host register into a stack slot.
    pub fn spill(&mut self, buf: &mut CodeBuffer, victim: VReg) {
        let (ty, loc) = {
            let row = self.vregs.get(victim);
            (row.ty, row.loc)
        };
        let Location::HostReg(reg) = loc else {
            panic!("spill of {victim}, which is not in a host register ({loc})");
        };
        let offset = self.frame.alloc(ty.size(), victim);
        assert!(
            offset < 128,
            "stack slot offset {offset} for {victim} exceeds the signed 8-bit displacement range"
        );
        encoder::store_reg_rsp_disp8(buf, offset as u8, reg);
        self.hwregs.clear(reg);
        self.vregs.get_mut(victim).loc = Location::StackSlot(offset);
    }

    /// Materializes `vreg`'s value into `dst` without changing its canonical
    /// location. The copy is transient: `dst`'s ownership entry is not
    /// touched, and a stack slot read this way keeps its bytes.
    pub fn copy_to(
        &mut self,
        buf: &mut CodeBuffer,
        relocs: &mut Vec<Relocation>,
        vreg: VReg,
        dst: GPRegister64,
    ) {
        self.emit_into(buf, relocs, vreg, dst);
    }

    /// Returns the host register currently holding `vreg`, moving it into a
    /// freshly allocated one if it is latent or spilled. Unlike `copy_to`,
    /// the canonical location is updated and the old home released.
    pub fn ensure_in_register(
        &mut self,
        buf: &mut CodeBuffer,
        relocs: &mut Vec<Relocation>,
        cc: &dyn CallingConvention,
        vreg: VReg,
        avoid: &[GPRegister64],
    ) -> GPRegister64 {
        let (ty, loc) = {
            let row = self.vregs.get(vreg);
            (row.ty, row.loc)
        };
        if let Location::HostReg(reg) = loc {
            return reg;
        }
        let dst = self.alloc_host_reg(buf, cc, vreg, avoid);
        self.emit_into(buf, relocs, vreg, dst);
        if let Location::StackSlot(offset) = loc {
            self.frame.release(offset, ty.size());
        }
        self.vregs.get_mut(vreg).loc = Location::HostReg(dst);
        dst
    }

    // Emission common to both flavors. Reads the current location and
    // appends the mov that lands the value in dst.
    fn emit_into(
        &mut self,
        buf: &mut CodeBuffer,
        relocs: &mut Vec<Relocation>,
        vreg: VReg,
        dst: GPRegister64,
    ) {
        let row = *self.vregs.get(vreg);
        assert!(
            row.ty != JitType::Void,
            "materialization of {vreg}, which is void"
        );
        match row.loc {
            Location::HostReg(cur) => {
                if cur != dst {
                    encoder::mov_reg_reg(buf, dst, cur);
                }
            }
            Location::StackSlot(offset) => {
                encoder::load_reg_rsp_disp8(buf, dst, offset as u8);
            }
            Location::Literal(value) => {
                encoder::mov_reg_imm64(buf, dst, value);
            }
            Location::Reloc(marker) => {
                let site = encoder::mov_reg_imm64(buf, dst, 0);
                relocs.push(Relocation { offset: site, marker, kind: RelocKind::Abs64 });
            }
        }
    }
}
