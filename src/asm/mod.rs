//! # Machine-code emission layer
//!
//! The byte-level half of the crate: a growable code buffer, the x86-64
//! instruction encoder for the fixed vocabulary the generator emits, the
//! register set, and the calling-convention tables. Nothing here knows about
//! virtual registers or modules; the `jit` layer drives these primitives.

pub mod abi;
pub mod buffer;
pub mod encoder;
pub mod register;

// Re-export key types at the module level
pub use abi::{CallingConvention, SystemV};
pub use buffer::CodeBuffer;
pub use encoder::Condition;
pub use register::GPRegister64;
