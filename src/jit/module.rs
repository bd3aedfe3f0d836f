// src/jit/module.rs
use std::collections::{HashMap, HashSet};

use super::backend::Target;
use super::builder::{FunctionBuilder, render_dump};
use super::memory::ExecutableMemory;
use super::reloc::{Relocation, RelocKind};
use super::types::{JitType, Marker};
use crate::asm::buffer::CodeBuffer;
use crate::error::JitError;

/// A finalized function waiting for the linker: its patched buffer and the
/// inter-function relocations still owed.
#[derive(Debug)]
pub(crate) struct FinishedFunction {
    pub marker: Marker,
    pub buffer: CodeBuffer,
    pub relocations: Vec<Relocation>,
}

/// A compilation unit: declared markers, imported host functions, and the
/// functions built so far.
///
/// Markers are declared up front (or interleaved with construction), bound
/// to host pointers via [`import_function`] or defined via
/// [`new_function`]. [`link`] lays every function out in one executable
/// mapping, resolves all markers, and publishes the entry pointers.
///
/// [`import_function`]: Self::import_function
/// [`new_function`]: Self::new_function
/// [`link`]: Self::link
#[derive(Debug)]
pub struct Module {
    target: Target,
    marker_count: u32,
    imports: HashMap<Marker, usize>,
    defined: HashSet<Marker>,
    functions: Vec<FinishedFunction>,
    offsets: HashMap<Marker, usize>,
    entries: HashMap<Marker, usize>,
    memory: Option<ExecutableMemory>,
    code_len: usize,
}

impl Module {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            marker_count: 0,
            imports: HashMap::new(),
            defined: HashSet::new(),
            functions: Vec::new(),
            offsets: HashMap::new(),
            entries: HashMap::new(),
            memory: None,
            code_len: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Allocates the next marker. Used for functions declared on the module
    /// and, through the builder, for jump labels.
    pub(crate) fn alloc_marker(&mut self) -> Marker {
        let marker = Marker(self.marker_count);
        self.marker_count += 1;
        marker
    }

    /// Declares a function that will be defined or imported later.
    pub fn declare_function(&mut self) -> Marker {
        self.alloc_marker()
    }

    #[inline]
    #[must_use]
    pub fn is_declared(&self, marker: Marker) -> bool {
        marker.0 < self.marker_count
    }

    #[inline]
    #[must_use]
    pub fn is_import(&self, marker: Marker) -> bool {
        self.imports.contains_key(&marker)
    }

    /// Binds `marker` to a native function. The pointer must be
    /// call-compatible with the System V convention for the argument and
    /// return types the generated code uses.
    pub fn import_function(&mut self, marker: Marker, address: *const u8) {
        assert!(self.is_declared(marker), "marker {marker} was never declared on this module");
        assert!(
            !self.imports.contains_key(&marker) && !self.defined.contains(&marker),
            "marker {marker} is already bound"
        );
        self.imports.insert(marker, address as usize);
    }

    /// Opens a builder for the function declared under `marker`, with its
    /// entry block live and the prologue emitted.
    pub fn new_function(&mut self, marker: Marker, arg_types: &[JitType]) -> FunctionBuilder<'_> {
        assert!(self.memory.is_none(), "module is already linked");
        assert!(self.is_declared(marker), "marker {marker} was never declared on this module");
        assert!(!self.is_import(marker), "marker {marker} is bound to a host import");
        assert!(!self.defined.contains(&marker), "marker {marker} is already defined");
        FunctionBuilder::new(self, marker, arg_types)
    }

    pub(crate) fn define_function(&mut self, function: FinishedFunction) {
        assert!(self.defined.insert(function.marker), "marker {} is already defined", function.marker);
        self.functions.push(function);
    }

    /// Resolves every marker and publishes the entry pointers.
    ///
    /// Functions are laid out sequentially in builder-creation order inside
    /// one mapping of `ceil(total / 1024) * 1024` bytes. Near call sites are
    /// patched with a 32-bit PC-relative displacement (a distance outside
    /// the signed 32-bit range is fatal); far sites get the 64-bit absolute
    /// address. The mapping ends read+execute.
    pub fn link(&mut self) -> Result<(), JitError> {
        assert!(self.memory.is_none(), "module is already linked");

        let total: usize = self.functions.iter().map(|f| f.buffer.len()).sum();
        let mapped = total.max(1).div_ceil(1024) * 1024;
        let mut memory = ExecutableMemory::allocate(mapped)?;
        let base = memory.as_ptr() as usize;

        let mut resolved: HashMap<Marker, usize> =
            self.imports.iter().map(|(&marker, &addr)| (marker, addr)).collect();
        let mut offset = 0usize;
        for function in &self.functions {
            self.offsets.insert(function.marker, offset);
            resolved.insert(function.marker, base + offset);
            offset += function.buffer.len();
        }

        let code = unsafe { std::slice::from_raw_parts_mut(memory.as_mut_ptr(), mapped) };
        for function in &self.functions {
            let start = self.offsets[&function.marker];
            code[start..start + function.buffer.len()].copy_from_slice(function.buffer.as_slice());
        }
        for function in &self.functions {
            let start = self.offsets[&function.marker];
            for reloc in &function.relocations {
                let target = *resolved
                    .get(&reloc.marker)
                    .unwrap_or_else(|| panic!("marker {} was never defined or imported", reloc.marker));
                let site = start + reloc.offset;
                match reloc.kind {
                    RelocKind::CallRel32 => {
                        let rel = target as i64 - (base + site) as i64 - 4;
                        let rel = i32::try_from(rel)
                            .expect("call displacement exceeds the signed 32-bit range");
                        code[site..site + 4].copy_from_slice(&rel.to_le_bytes());
                    }
                    RelocKind::Abs64 => {
                        code[site..site + 8].copy_from_slice(&(target as u64).to_le_bytes());
                    }
                }
            }
        }

        memory.make_executable()?;
        self.entries = resolved;
        self.memory = Some(memory);
        self.code_len = total;
        Ok(())
    }

    /// Entry pointer for `marker`. Valid until the module is dropped.
    #[must_use]
    pub fn get_funcptr(&self, marker: Marker) -> *const u8 {
        assert!(self.memory.is_some(), "module is not linked");
        let addr = self
            .entries
            .get(&marker)
            .unwrap_or_else(|| panic!("marker {marker} has no entry point"));
        *addr as *const u8
    }

    /// Entry pointer for `marker`, transmuted to a concrete function type.
    ///
    /// # Safety
    ///
    /// `F` must be a function-pointer type whose signature is
    /// call-compatible with the code generated (or imported) under
    /// `marker`. Calling the result after the module is dropped is
    /// undefined behavior.
    #[must_use]
    pub unsafe fn funcptr<F: Copy>(&self, marker: Marker) -> F {
        let ptr = self.get_funcptr(marker);
        unsafe { std::mem::transmute_copy(&ptr) }
    }

    /// Base address of the linked code region.
    #[must_use]
    pub fn code_base(&self) -> *const u8 {
        self.memory.as_ref().expect("module is not linked").as_ptr()
    }

    /// The linked code bytes (all functions, laid out as mapped).
    #[must_use]
    pub fn linked_code(&self) -> &[u8] {
        let memory = self.memory.as_ref().expect("module is not linked");
        &memory.as_slice()[..self.code_len]
    }

    /// Byte offset of a defined function inside the linked region.
    #[must_use]
    pub fn function_offset(&self, marker: Marker) -> usize {
        assert!(self.memory.is_some(), "module is not linked");
        *self
            .offsets
            .get(&marker)
            .unwrap_or_else(|| panic!("marker {marker} is not a defined function"))
    }

    /// Finalized (pre-link) bytes of a defined function.
    #[must_use]
    pub fn function_bytes(&self, marker: Marker) -> &[u8] {
        self.functions
            .iter()
            .find(|f| f.marker == marker)
            .map(|f| f.buffer.as_slice())
            .unwrap_or_else(|| panic!("marker {marker} is not a defined function"))
    }

    /// Inter-function relocations recorded by a defined function.
    #[must_use]
    pub fn function_relocations(&self, marker: Marker) -> &[Relocation] {
        self.functions
            .iter()
            .find(|f| f.marker == marker)
            .map(|f| f.relocations.as_slice())
            .unwrap_or_else(|| panic!("marker {marker} is not a defined function"))
    }

    /// Hex dump of a defined function's finalized bytes.
    #[must_use]
    pub fn dump(&self, marker: Marker) -> String {
        let function = self
            .functions
            .iter()
            .find(|f| f.marker == marker)
            .unwrap_or_else(|| panic!("marker {marker} is not a defined function"));
        render_dump(&function.buffer)
    }

    /// Prints [`dump`] to stdout.
    ///
    /// [`dump`]: Self::dump
    pub fn debug_dump(&self, marker: Marker) {
        print!("{}", self.dump(marker));
    }
}
