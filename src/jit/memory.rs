// src/jit/memory.rs
use crate::error::JitError;
use std::io;
use std::ptr;

/// An anonymous private mapping holding generated code.
///
/// Allocated read-write, filled by the linker, then flipped to read+execute.
/// Unmapped on drop; function pointers into the region must not outlive it.
#[derive(Debug)]
pub struct ExecutableMemory {
    ptr: *mut u8,
    len: usize,
}

impl ExecutableMemory {
    /// Maps `len` bytes read-write.
    pub fn allocate(len: usize) -> Result<Self, JitError> {
        let ptr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(JitError::Map { size: len, source: io::Error::last_os_error() });
        }
        Ok(Self { ptr: ptr.cast(), len })
    }

    /// Flips the mapping to read+execute. No further writes are legal.
    pub fn make_executable(&mut self) -> Result<(), JitError> {
        let rc = unsafe { libc::mprotect(self.ptr.cast(), self.len, libc::PROT_READ | libc::PROT_EXEC) };
        if rc != 0 {
            return Err(JitError::Protect { source: io::Error::last_os_error() });
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    #[inline]
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr
    }

    /// The mapped bytes. Readable in both the RW and RX phases.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for ExecutableMemory {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr.cast(), self.len);
        }
    }
}
