// src/asm/register.rs
use std::fmt;

/// General-purpose 64-bit registers.
///
/// Primary registers for integer arithmetic, addressing, and data
/// manipulation. Conventional uses: RAX (accumulator/return), RCX (counter),
/// RDX (data), RSI/RDI (string operations), RBP (base pointer), RSP (stack
/// pointer). The discriminants are the hardware register numbers used in
/// ModRM/SIB encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GPRegister64 {
    Rax = 0,
    Rcx = 1,
    Rdx = 2,
    Rbx = 3,
    Rsp = 4,
    Rbp = 5,
    Rsi = 6,
    Rdi = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
}

impl GPRegister64 {
    /// All sixteen registers in hardware-number order.
    pub const ALL: [Self; 16] = [
        Self::Rax,
        Self::Rcx,
        Self::Rdx,
        Self::Rbx,
        Self::Rsp,
        Self::Rbp,
        Self::Rsi,
        Self::Rdi,
        Self::R8,
        Self::R9,
        Self::R10,
        Self::R11,
        Self::R12,
        Self::R13,
        Self::R14,
        Self::R15,
    ];

    /// Hardware register number (0..=15).
    #[inline]
    #[must_use]
    pub const fn encoding(self) -> u8 {
        self as u8
    }

    /// Low three bits, the part that fits the ModRM reg/rm fields.
    #[inline]
    #[must_use]
    pub const fn low3(self) -> u8 {
        self.encoding() & 0x7
    }

    /// R8..=R15 need a REX extension bit.
    #[inline]
    #[must_use]
    pub const fn is_extended(self) -> bool {
        self.encoding() >= 8
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.encoding() as usize
    }
}

impl fmt::Display for GPRegister64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rax => "rax",
            Self::Rcx => "rcx",
            Self::Rdx => "rdx",
            Self::Rbx => "rbx",
            Self::Rsp => "rsp",
            Self::Rbp => "rbp",
            Self::Rsi => "rsi",
            Self::Rdi => "rdi",
            Self::R8 => "r8",
            Self::R9 => "r9",
            Self::R10 => "r10",
            Self::R11 => "r11",
            Self::R12 => "r12",
            Self::R13 => "r13",
            Self::R14 => "r14",
            Self::R15 => "r15",
        };
        f.write_str(name)
    }
}
