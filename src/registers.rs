use std::fmt;

use crate::memory::CHIP8_PROGRAM_ADDR;

/// how many return addresses fit on the call stack
pub const CHIP8_STACK_DEPTH: usize = 16;

/// index of VF, the carry/borrow/collision flag
pub const FLAG: usize = 0xf;

/// Fixed-capacity call stack. `len` is the next free slot, so it is always in
/// `0..=CHIP8_STACK_DEPTH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    slots: [u16; CHIP8_STACK_DEPTH],
    len: usize,
}

/// push/pop failure; the caller attaches pc and opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackFault {
    Overflow,
    Underflow,
}

impl CallStack {
    pub fn new() -> Self {
        CallStack {
            slots: [0; CHIP8_STACK_DEPTH],
            len: 0,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), StackFault> {
        let slot = self.slots.get_mut(self.len).ok_or(StackFault::Overflow)?;
        *slot = addr;
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackFault> {
        if self.len == 0 {
            return Err(StackFault::Underflow);
        }
        self.len -= 1;
        Ok(self.slots[self.len])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

/// The CHIP-8 register file: V0..VF, I, PC and the call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: CallStack,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; 16],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            stack: CallStack::new(),
        }
    }

    pub fn flag(&self) -> u8 {
        self.v[FLAG]
    }

    pub fn set_flag(&mut self, set: bool) {
        self.v[FLAG] = set as u8;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC={:04X} I={:04X} SP={}", self.pc, self.i, self.stack.len())?;
        for (n, v) in self.v.iter().enumerate() {
            write!(f, " V{:X}={:02X}", n, v)?;
        }
        Ok(())
    }
}
