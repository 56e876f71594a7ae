use std::io;

use thiserror::Error;

/// Everything that can go wrong inside the machine.
///
/// Load errors are fatal at startup. Stack faults and fetch faults pause the
/// machine; data bounds errors are logged and skipped by the executor.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("address {addr:#06x} is outside the address space")]
    OutOfBounds { addr: usize },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("ROM is empty")]
    EmptyRom,

    #[error("stack overflow at {pc:#06x} (opcode {opcode:#06x})")]
    StackOverflow { pc: u16, opcode: u16 },

    #[error("stack underflow at {pc:#06x} (opcode {opcode:#06x})")]
    StackUnderflow { pc: u16, opcode: u16 },

    #[error("cannot fetch an instruction at {pc:#06x}")]
    FetchOutOfBounds { pc: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}
