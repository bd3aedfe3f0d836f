// src/lib.rs
/// # minijit
///
/// A minimal just-in-time code generation library targeting the x86-64
/// System V ABI on POSIX hosts. Client code builds a module of functions
/// through a small, SSA-flavored instruction builder; linking emits the
/// machine code into an executable mapping and returns native function
/// pointers the host calls directly.
///
/// ## Important modules:
/// * `asm` - Byte buffer, x86-64 instruction encoder, registers, and ABI tables
/// * `jit` - Value model, register allocator, basic blocks, builder, module and linker
/// * `demos` - Demonstration programs built through the public surface
/// * `error` - Error types for host-environment failures
/// * `time` - Timing helper for the demonstration driver
/// * `cli` - Command-line interface of the demonstration binary
pub mod asm;
pub mod cli;
pub mod demos;
pub mod error;
pub mod jit;
pub mod time;
