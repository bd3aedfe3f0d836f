//! # Code generator core
//!
//! The machine-independent half of the crate: virtual registers and their
//! locations, the stack-frame and host-register maps, basic blocks with
//! snapshot inheritance, the function builder, and the module/linker that
//! turns finished buffers into callable code.
//!
//! Construction follows a fixed lifecycle: create a [`Module`], declare a
//! marker per function (imports bound with a native pointer), open a
//! [`FunctionBuilder`] per marker, emit operations, close blocks at branches
//! and returns, finalize each function, then [`Module::link`] and fetch the
//! entry pointers.

pub mod backend;
pub mod block;
pub mod builder;
pub mod frame;
pub mod memory;
pub mod module;
pub mod regalloc;
pub mod reloc;
pub mod types;
pub mod value;

// Re-export key types at the module level
pub use backend::Target;
pub use block::{Block, BlockState};
pub use builder::FunctionBuilder;
pub use memory::ExecutableMemory;
pub use module::Module;
pub use reloc::{LabelFixup, RelocKind, Relocation};
pub use types::{JitType, Marker, VReg};
pub use value::{Location, VRegData, VRegTable};
