//! Failure and debugger-hook conditions raised out of `Cpu::step`.

use std::fmt;

/// Everything `Cpu::step` can hand back besides a cycle count.
///
/// These propagate out of `step`/`run` rather than being retried or
/// swallowed internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvrError {
    /// The memory space refused a program-memory read at this word address.
    AddressUnreadable(u32),
    /// The memory space refused a data-memory write of `value` at this address.
    AddressUnwritable(u16, u8),
    /// The decoder could not classify the opcode word at `pc`.
    ///
    /// Only raised when `InvalidOpcodePolicy::ThrowException` is active;
    /// under `DoNop` the instruction is silently skipped instead.
    UnknownOpcode(u32, u16),
    /// An instruction that requires a 22-bit PC (EIJMP, EICALL, ELPM with
    /// RAMPZ) was executed on a CPU constructed with a 16-bit PC.
    InvalidOperation,
    /// SPM or DES: not implemented by this core.
    NotImplemented,
    /// `BREAK` was executed. Not a failure: an attached debugger may
    /// intercept this and resume, or the caller may abort. `pc` is the
    /// address of the `BREAK` instruction itself.
    BreakInterrupt(u32),
}

impl fmt::Display for AvrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressUnreadable(addr) => {
                write!(f, "program memory unreadable at word address ${addr:05X}")
            }
            Self::AddressUnwritable(addr, value) => {
                write!(f, "data memory at ${addr:04X} refused write of ${value:02X}")
            }
            Self::UnknownOpcode(pc, opcode) => {
                write!(f, "unknown opcode ${opcode:04X} at ${pc:05X}")
            }
            Self::InvalidOperation => {
                write!(f, "instruction requires a 22-bit PC but this CPU has a 16-bit PC")
            }
            Self::NotImplemented => write!(f, "instruction not implemented by this core"),
            Self::BreakInterrupt(pc) => write!(f, "BREAK at ${pc:05X}"),
        }
    }
}

impl std::error::Error for AvrError {}
