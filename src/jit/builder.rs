// src/jit/builder.rs
//! The public instruction-emission surface.
//!
//! A builder owns one function under construction: its code buffer, its
//! argument registers, the currently open basic block, and the relocation
//! and label tables the linker and finalizer patch from. Operations append
//! bytes immediately; nothing is reordered or optimized after the fact.

use std::collections::{HashMap, HashSet};

use super::block::{Block, BlockState};
use super::module::{FinishedFunction, Module};
use super::reloc::{LabelFixup, Relocation, RelocKind};
use super::types::{JitType, Marker, VReg};
use super::value::{Location, VRegData};
use crate::asm::abi::CallingConvention;
use crate::asm::buffer::CodeBuffer;
use crate::asm::encoder::{self, Condition};
use crate::asm::register::GPRegister64;

const NO_OPEN_BLOCK: &str = "no basic block is open; begin_bb must follow ret or branch";

#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Sub,
}

/// Builds one function of a module.
///
/// Created by [`Module::new_function`] with the entry block already open and
/// the prologue emitted. Closing operations (`ret`, `branch`,
/// `branch_if_equal`) end the current block; `begin_bb` opens the next one
/// from a closed predecessor's state. `finalize_function` consumes the
/// builder and deposits the finished code into the module.
pub struct FunctionBuilder<'m> {
    module: &'m mut Module,
    cc: &'static dyn CallingConvention,
    marker: Marker,
    buffer: CodeBuffer,
    args: Vec<VReg>,
    next_vreg: u32,
    // Closed-block snapshots by block id; the open block's slot stays None
    // until a closing operation stores its state.
    blocks: Vec<Option<BlockState>>,
    current: Option<BlockState>,
    open_block: usize,
    relocations: Vec<Relocation>,
    label_fixups: Vec<LabelFixup>,
    labels: HashMap<Marker, usize>,
    declared_labels: HashSet<Marker>,
    frame_patch_offset: usize,
}

impl<'m> FunctionBuilder<'m> {
    pub(crate) fn new(module: &'m mut Module, marker: Marker, arg_types: &[JitType]) -> Self {
        let cc = module.target().abi();
        let param_regs = cc.integer_param_registers();
        assert!(
            arg_types.len() <= param_regs.len(),
            "function takes {} arguments; at most {} integer arguments are supported",
            arg_types.len(),
            param_regs.len()
        );

        let mut buffer = CodeBuffer::new();
        encoder::push_reg(&mut buffer, GPRegister64::Rbp);
        encoder::mov_reg_reg(&mut buffer, GPRegister64::Rbp, GPRegister64::Rsp);
        let frame_patch_offset = encoder::sub_reg_imm32(&mut buffer, GPRegister64::Rsp, 0);

        let mut state = BlockState::new();
        let mut args = Vec::with_capacity(arg_types.len());
        for (i, &ty) in arg_types.iter().enumerate() {
            assert!(ty == JitType::I64, "argument {i} has type {ty}; only i64 arguments are supported");
            let vreg = VReg(i as u32);
            state.vregs.define(vreg, VRegData { ty, loc: Location::HostReg(param_regs[i]) });
            state.hwregs.set_owner(param_regs[i], vreg);
            args.push(vreg);
        }

        Self {
            module,
            cc,
            marker,
            buffer,
            next_vreg: arg_types.len() as u32,
            args,
            blocks: vec![None],
            current: Some(state),
            open_block: 0,
            relocations: Vec::new(),
            label_fixups: Vec::new(),
            labels: HashMap::new(),
            declared_labels: HashSet::new(),
            frame_patch_offset,
        }
    }

    /// The marker this function is being defined under.
    #[inline]
    #[must_use]
    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Handle of the entry block, open when the builder is created.
    #[inline]
    #[must_use]
    pub fn entry_block(&self) -> Block {
        Block(0)
    }

    /// The i-th argument. Stable for the life of the function.
    #[must_use]
    pub fn arg(&self, index: usize) -> VReg {
        self.args
            .get(index)
            .copied()
            .unwrap_or_else(|| panic!("argument index {index} out of range for {} arguments", self.args.len()))
    }

    /// State of the currently open block.
    #[must_use]
    pub fn state(&self) -> &BlockState {
        self.current.as_ref().expect(NO_OPEN_BLOCK)
    }

    /// Bytes emitted so far.
    #[must_use]
    pub fn code(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn alloc_vreg(&mut self) -> VReg {
        let vreg = VReg(self.next_vreg);
        self.next_vreg += 1;
        vreg
    }

    /// A fresh `void` value.
    pub fn immediate_void(&mut self) -> VReg {
        let vreg = self.alloc_vreg();
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        st.vregs.define(vreg, VRegData { ty: JitType::Void, loc: Location::Literal(0) });
        vreg
    }

    /// A fresh i64 constant. No code is emitted; the value is materialized
    /// when an operation needs it in a register.
    pub fn immediate_int64(&mut self, value: i64) -> VReg {
        let vreg = self.alloc_vreg();
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        st.vregs.define(vreg, VRegData { ty: JitType::I64, loc: Location::Literal(value) });
        vreg
    }

    /// A 32-bit constant, widened to the i64 the generator computes in.
    pub fn immediate_int32(&mut self, value: i32) -> VReg {
        self.immediate_int64(i64::from(value))
    }

    /// The address of `marker`, resolved at link time. Usable as a call
    /// target for module-local functions and host imports alike.
    pub fn immediate_function(&mut self, marker: Marker) -> VReg {
        assert!(self.module.is_declared(marker), "marker {marker} was never declared on this module");
        let vreg = self.alloc_vreg();
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        st.vregs.define(vreg, VRegData { ty: JitType::I64, loc: Location::Reloc(marker) });
        vreg
    }

    /// `left + right` as a fresh i64 value.
    pub fn add(&mut self, left: VReg, right: VReg) -> VReg {
        self.arith(ArithOp::Add, left, right)
    }

    /// `left - right` as a fresh i64 value.
    pub fn sub(&mut self, left: VReg, right: VReg) -> VReg {
        self.arith(ArithOp::Sub, left, right)
    }

    // The result register is allocated first and seeded from the left
    // operand, then the two-operand form is emitted against the right one.
    // A right-hand literal that fits a signed 32-bit immediate uses the
    // imm32 shape and stays latent.
    fn arith(&mut self, op: ArithOp, left: VReg, right: VReg) -> VReg {
        let result = self.alloc_vreg();
        let cc = self.cc;
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        for operand in [left, right] {
            let ty = st.vregs.get(operand).ty;
            assert!(ty == JitType::I64, "arithmetic on {operand} of type {ty}");
        }

        let dst = st.alloc_host_reg(&mut self.buffer, cc, result, &[]);
        st.vregs.define(result, VRegData { ty: JitType::I64, loc: Location::HostReg(dst) });
        st.copy_to(&mut self.buffer, &mut self.relocations, left, dst);

        let rhs_loc = st.vregs.get(right).loc;
        match rhs_loc {
            Location::Literal(value) if i32::try_from(value).is_ok() => {
                let imm = value as i32;
                match op {
                    ArithOp::Add => encoder::add_reg_imm32(&mut self.buffer, dst, imm),
                    ArithOp::Sub => encoder::sub_reg_imm32(&mut self.buffer, dst, imm),
                };
            }
            _ => {
                let rhs = st.ensure_in_register(&mut self.buffer, &mut self.relocations, cc, right, &[dst]);
                match op {
                    ArithOp::Add => encoder::add_reg_reg(&mut self.buffer, dst, rhs),
                    ArithOp::Sub => encoder::sub_reg_reg(&mut self.buffer, dst, rhs),
                }
            }
        }
        result
    }

    /// Reserves a label marker to be placed later with [`label`].
    ///
    /// [`label`]: Self::label
    pub fn label_marker(&mut self) -> Marker {
        let marker = self.module.alloc_marker();
        self.declared_labels.insert(marker);
        marker
    }

    /// Resolves `marker` to the current position in the function.
    pub fn label(&mut self, marker: Marker) {
        assert!(
            self.declared_labels.contains(&marker),
            "label marker {marker} belongs to another function"
        );
        let previous = self.labels.insert(marker, self.buffer.len());
        assert!(previous.is_none(), "label {marker} resolved twice");
    }

    /// Unconditional jump to `target`. Closes the current block.
    pub fn branch(&mut self, target: Marker) {
        assert!(
            self.declared_labels.contains(&target),
            "label marker {target} belongs to another function"
        );
        assert!(self.current.is_some(), "{NO_OPEN_BLOCK}");
        let site = encoder::jmp_rel32(&mut self.buffer);
        self.label_fixups.push(LabelFixup { offset: site, marker: target });
        self.close_block();
    }

    /// Jump to `target` when `first == second`. Both operands are forced
    /// into host registers; the block closes with the comparison's state as
    /// its snapshot, so successors find the operands where the comparison
    /// left them.
    pub fn branch_if_equal(&mut self, target: Marker, first: VReg, second: VReg) {
        assert!(
            self.declared_labels.contains(&target),
            "label marker {target} belongs to another function"
        );
        let cc = self.cc;
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        for operand in [first, second] {
            let ty = st.vregs.get(operand).ty;
            assert!(ty == JitType::I64, "comparison on {operand} of type {ty}");
        }
        let lhs = st.ensure_in_register(&mut self.buffer, &mut self.relocations, cc, first, &[]);
        let rhs = st.ensure_in_register(&mut self.buffer, &mut self.relocations, cc, second, &[lhs]);
        encoder::cmp_reg_reg(&mut self.buffer, rhs, lhs);
        let site = encoder::jcc_rel32(&mut self.buffer, Condition::Equal);
        self.label_fixups.push(LabelFixup { offset: site, marker: target });
        self.close_block();
    }

    /// Opens a new basic block seeded from `pred`'s closing state.
    pub fn begin_bb(&mut self, pred: Block) -> Block {
        assert!(self.current.is_none(), "cannot begin a basic block while another is open");
        let snapshot = self
            .blocks
            .get(pred.0)
            .expect("unknown predecessor block")
            .as_ref()
            .expect("predecessor block has not closed yet")
            .clone();
        self.blocks.push(None);
        self.open_block = self.blocks.len() - 1;
        self.current = Some(snapshot);
        Block(self.open_block)
    }

    /// Calls `target` under the System V integer convention.
    ///
    /// Every value living in a host register is first spilled to the frame
    /// (no liveness analysis is attempted), then each argument is copied
    /// into its parameter register. A module-local function in relocation
    /// state is called `rel32`; anything else, including host imports, is
    /// materialized into a scratch register and called indirectly. With
    /// `variadic`, RAX is cleared before the call so a System V variadic
    /// callee reads zero vector arguments from AL.
    ///
    /// Returns the i64 result bound to RAX, or [`VReg::INVALID`] for a
    /// `void` return type.
    pub fn call(
        &mut self,
        target: VReg,
        args: &[VReg],
        ret: JitType,
        arg_types: &[JitType],
        variadic: bool,
    ) -> VReg {
        assert!(
            args.len() == arg_types.len(),
            "call passes {} arguments but {} argument types",
            args.len(),
            arg_types.len()
        );
        let cc = self.cc;
        let param_regs = cc.integer_param_registers();
        assert!(
            args.len() <= param_regs.len(),
            "call passes {} arguments; at most {} integer arguments are supported",
            args.len(),
            param_regs.len()
        );
        assert!(
            matches!(ret, JitType::Void | JitType::I64),
            "call returns {ret}; only void and i64 returns are supported"
        );
        let result = if ret == JitType::I64 { Some(self.alloc_vreg()) } else { None };

        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        assert!(
            st.vregs.get(target).ty == JitType::I64,
            "call target {target} is not a function address"
        );
        for (i, (&arg, &ty)) in args.iter().zip(arg_types).enumerate() {
            assert!(ty == JitType::I64, "call argument {i} has type {ty}; only i64 arguments are supported");
            let actual = st.vregs.get(arg).ty;
            assert!(actual == JitType::I64, "call argument {i} ({arg}) has type {actual}");
        }

        // Conservative: everything in a register goes to the frame, so each
        // argument below is recovered from a latent or spilled state even if
        // the same value feeds two parameter slots.
        let live: Vec<VReg> = st.hwregs.iter_owned().map(|(_, vreg)| vreg).collect();
        for vreg in live {
            st.spill(&mut self.buffer, vreg);
        }

        let mut occupied: Vec<GPRegister64> = Vec::with_capacity(args.len());
        for (i, &arg) in args.iter().enumerate() {
            let dst = param_regs[i];
            if let Some(blocking) = st.hwregs.owner(dst) {
                st.spill(&mut self.buffer, blocking);
            }
            st.copy_to(&mut self.buffer, &mut self.relocations, arg, dst);
            occupied.push(dst);
        }

        if variadic {
            encoder::mov_reg_imm64(&mut self.buffer, GPRegister64::Rax, 0);
        }

        let target_loc = st.vregs.get(target).loc;
        match target_loc {
            Location::Reloc(marker) if !self.module.is_import(marker) => {
                let site = encoder::call_rel32(&mut self.buffer);
                self.relocations.push(Relocation { offset: site, marker, kind: RelocKind::CallRel32 });
            }
            _ => {
                // A variadic call has already zeroed RAX; the callee pointer
                // must not land there.
                let scratch = GPRegister64::ALL
                    .into_iter()
                    .find(|reg| {
                        !cc.reserved_registers().contains(reg)
                            && !occupied.contains(reg)
                            && st.hwregs.owner(*reg).is_none()
                            && !(variadic && *reg == GPRegister64::Rax)
                    })
                    .expect("no scratch register left for the call target");
                st.copy_to(&mut self.buffer, &mut self.relocations, target, scratch);
                encoder::call_reg(&mut self.buffer, scratch);
            }
        }

        match result {
            Some(result) => {
                let ret_reg = cc.return_register();
                st.vregs.define(result, VRegData { ty: JitType::I64, loc: Location::HostReg(ret_reg) });
                st.hwregs.set_owner(ret_reg, result);
                result
            }
            None => VReg::INVALID,
        }
    }

    /// Returns `value` to the caller and closes the current block.
    pub fn ret(&mut self, value: VReg, ty: JitType) {
        let cc = self.cc;
        let st = self.current.as_mut().expect(NO_OPEN_BLOCK);
        let actual = st.vregs.get(value).ty;
        assert!(actual == ty, "return of {value} with type {actual} as {ty}");
        match ty {
            JitType::Void => {}
            JitType::I64 => {
                st.copy_to(&mut self.buffer, &mut self.relocations, value, cc.return_register());
            }
            _ => panic!("return type {ty} is not supported"),
        }
        encoder::mov_reg_reg(&mut self.buffer, GPRegister64::Rsp, GPRegister64::Rbp);
        encoder::pop_reg(&mut self.buffer, GPRegister64::Rbp);
        encoder::ret(&mut self.buffer);
        self.close_block();
    }

    /// Advisory hint that the given values will not be used again. The
    /// allocator is free to ignore the hint, and does.
    pub fn discard(&mut self, _vregs: &[VReg]) {}

    fn close_block(&mut self) {
        let state = self.current.take().expect(NO_OPEN_BLOCK);
        self.blocks[self.open_block] = Some(state);
    }

    /// The emitted bytes, eight per line.
    #[must_use]
    pub fn dump(&self) -> String {
        render_dump(&self.buffer)
    }

    /// Prints [`dump`] to stdout.
    ///
    /// [`dump`]: Self::dump
    pub fn debug_dump(&self) {
        print!("{}", self.dump());
    }

    /// Patches the prologue's frame-size immediate and every intra-function
    /// branch displacement, then hands the finished code to the module.
    ///
    /// The frame size is the high-water mark over every block's frame map,
    /// rounded up to the ABI's 16-byte alignment.
    pub fn finalize_function(mut self) {
        assert!(
            self.current.is_none(),
            "function under {} finalized with an open basic block",
            self.marker
        );
        for marker in &self.declared_labels {
            assert!(self.labels.contains_key(marker), "label {marker} has no resolving site");
        }

        let high_water =
            self.blocks.iter().flatten().map(|state| state.frame.high_water()).max().unwrap_or(0);
        let alignment = self.cc.stack_alignment();
        let frame_size = high_water.div_ceil(alignment) * alignment;
        self.buffer.patch_u32_at(self.frame_patch_offset, frame_size);

        for fixup in &self.label_fixups {
            let target = self.labels[&fixup.marker];
            let rel = target as i64 - (fixup.offset as i64 + 4);
            let rel = i32::try_from(rel).expect("intra-function branch distance exceeds signed 32 bits");
            self.buffer.patch_u32_at(fixup.offset, rel as u32);
        }

        let function = FinishedFunction {
            marker: self.marker,
            buffer: self.buffer,
            relocations: self.relocations,
        };
        self.module.define_function(function);
    }
}

pub(crate) fn render_dump(buffer: &CodeBuffer) -> String {
    format!("generated code: {} bytes\n{}", buffer.len(), buffer)
}
