// src/asm/abi.rs
//! Calling-convention description.
//!
//! The generator only handles the integer/pointer register class; the trait
//! exposes exactly the tables it consults.

use super::register::GPRegister64;

/// Register conventions of one calling convention.
pub trait CallingConvention {
    /// Registers carrying the first integer/pointer arguments, in order.
    fn integer_param_registers(&self) -> &[GPRegister64];

    /// Register carrying an integer return value.
    fn return_register(&self) -> GPRegister64;

    /// Registers the allocator must never hand out. These are the stack and
    /// frame pointers plus the callee-saved set, which the generated code
    /// elects not to save and restore.
    fn reserved_registers(&self) -> &[GPRegister64];

    /// Required stack alignment at call sites, in bytes.
    fn stack_alignment(&self) -> u32;
}

/// System V AMD64 ABI, as used on Unix-like x86-64 systems.
#[derive(Debug, Clone, Copy)]
pub struct SystemV;

impl CallingConvention for SystemV {
    fn integer_param_registers(&self) -> &[GPRegister64] {
        use GPRegister64::{R8, R9, Rcx, Rdi, Rdx, Rsi};
        static REGS: &[GPRegister64] = &[Rdi, Rsi, Rdx, Rcx, R8, R9];
        REGS
    }

    fn return_register(&self) -> GPRegister64 {
        GPRegister64::Rax
    }

    fn reserved_registers(&self) -> &[GPRegister64] {
        use GPRegister64::{R12, R13, R14, R15, Rbp, Rbx, Rsp};
        static REGS: &[GPRegister64] = &[Rsp, Rbp, Rbx, R12, R13, R14, R15];
        REGS
    }

    fn stack_alignment(&self) -> u32 {
        16
    }
}
