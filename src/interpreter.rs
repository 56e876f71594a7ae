/// # interpreter
///
/// The machine state and the fetch/decode/execute cycle.
///
/// One `cycle()` fetches the big-endian word at PC, moves PC on by 2, and only
/// then executes, so jump and call targets are absolute and a skip is just
/// another 2. The interpreter never reads the clock: timers move when the
/// scheduler calls `tick_timers()`, and the keypad is whatever the input
/// device last wrote into it.
///
/// Faults come in two kinds:
///  * stack overflow/underflow, and fetching from past the end of memory,
///    pause the machine and are returned to the caller
///  * data accesses that run off the end of memory (sprites, BCD, register
///    dump/load) do as much as fits, log a warning and carry on. writes that
///    would land below the program area are trimmed the same way, which keeps
///    the font intact
///
/// Unknown opcodes are logged and skipped.
use log::{trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

use crate::config::Quirks;
use crate::display::DisplayBuffer;
use crate::error::MachineError;
use crate::instruction::{Instruction, Op};
use crate::keypad::Keypad;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR, CHIP8_RAM_SIZE_BYTES};
use crate::registers::{Registers, StackFault};
use crate::timer::Timers;

/// where the machine is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Paused,
    Quit,
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    registers: Registers,
    display: DisplayBuffer,
    timers: Timers,
    keypad: Keypad,
    state: MachineState,
    quirks: Quirks,
    rng: StdRng,
}

impl Chip8Interpreter {
    pub fn new(quirks: Quirks) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// same as `new`, but CXNN is reproducible
    pub fn with_seed(quirks: Quirks, seed: u64) -> Self {
        Self::with_rng(quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(quirks: Quirks, rng: StdRng) -> Self {
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            registers: Registers::new(),
            display: DisplayBuffer::default(),
            timers: Timers::new(),
            keypad: Keypad::new(),
            state: MachineState::Running,
            quirks,
            rng,
        }
    }

    /// load a chip8 program, returning its size
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, MachineError> {
        let mut memory = Chip8MemoryMap::new();
        let size = memory.load_program(reader)?;
        self.reset(memory);
        Ok(size)
    }

    /// start afresh with a new ROM. nothing is kept from the previous program
    /// and on failure the machine is left as it was
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), MachineError> {
        let mut memory = Chip8MemoryMap::new();
        memory.load_rom(rom)?;
        self.reset(memory);
        Ok(())
    }

    fn reset(&mut self, memory: Chip8MemoryMap) {
        self.memory = memory;
        self.registers = Registers::new();
        self.display.clear();
        self.timers = Timers::new();
        self.keypad.release_all();
        self.state = MachineState::Running;
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn set_state(&mut self, state: MachineState) {
        self.state = state;
    }

    /// Running <-> Paused; a machine that has quit stays quit
    pub fn toggle_pause(&mut self) -> MachineState {
        self.state = match self.state {
            MachineState::Running => MachineState::Paused,
            MachineState::Paused => MachineState::Running,
            MachineState::Quit => MachineState::Quit,
        };
        self.state
    }

    /// one 1/60s tick of the delay and sound timers
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// fetch, decode and execute one instruction. does nothing unless running
    pub fn cycle(&mut self) -> Result<(), MachineError> {
        if self.state != MachineState::Running {
            return Ok(());
        }
        let pc = self.registers.pc;
        let opcode = match self.memory.get_word(pc) {
            Ok(word) => word,
            Err(_) => {
                self.state = MachineState::Paused;
                return Err(MachineError::FetchOutOfBounds { pc });
            }
        };
        self.registers.pc = pc.wrapping_add(2);

        let ins = Instruction::from_word(opcode);
        let op = ins.op();
        trace!("{:04X}: {:04X}  {:<16} {}", pc, opcode, op.to_string(), self.registers);

        if let Err(e) = self.execute(pc, ins, op) {
            self.state = MachineState::Paused;
            return Err(e);
        }
        Ok(())
    }

    fn execute(&mut self, pc: u16, ins: Instruction, op: Op) -> Result<(), MachineError> {
        let opcode = ins.opcode;
        let r = &mut self.registers;
        match op {
            Op::Cls => self.display.clear(),
            Op::Ret => {
                r.pc = r.stack.pop().map_err(|f| stack_error(f, pc, opcode))?;
            }
            Op::Jp(addr) => r.pc = addr,
            Op::Call(addr) => {
                r.stack.push(r.pc).map_err(|f| stack_error(f, pc, opcode))?;
                r.pc = addr;
            }
            Op::SeImm(x, nn) => self.skip_if(self.registers.v[x] == nn),
            Op::SneImm(x, nn) => self.skip_if(self.registers.v[x] != nn),
            Op::SeReg(x, y) => self.skip_if(self.registers.v[x] == self.registers.v[y]),
            Op::SneReg(x, y) => self.skip_if(self.registers.v[x] != self.registers.v[y]),
            Op::LdImm(x, nn) => r.v[x] = nn,
            Op::AddImm(x, nn) => r.v[x] = r.v[x].wrapping_add(nn),
            Op::Ld(x, y) => r.v[x] = r.v[y],
            Op::Or(x, y) => r.v[x] |= r.v[y],
            Op::And(x, y) => r.v[x] &= r.v[y],
            Op::Xor(x, y) => r.v[x] ^= r.v[y],
            // for the flag-setting ALU ops VF is written last, so the flag
            // wins when X is F
            Op::Add(x, y) => {
                let (sum, carry) = r.v[x].overflowing_add(r.v[y]);
                r.v[x] = sum;
                r.set_flag(carry);
            }
            Op::Sub(x, y) => {
                let (a, b) = (r.v[x], r.v[y]);
                r.v[x] = a.wrapping_sub(b);
                r.set_flag(a >= b);
            }
            Op::Subn(x, y) => {
                let (a, b) = (r.v[x], r.v[y]);
                r.v[x] = b.wrapping_sub(a);
                r.set_flag(b >= a);
            }
            Op::Shr(x) => {
                let s = r.v[x];
                r.v[x] = s >> 1;
                r.set_flag(s & 0x01 != 0);
            }
            Op::Shl(x) => {
                let s = r.v[x];
                r.v[x] = s << 1;
                r.set_flag(s & 0x80 != 0);
            }
            Op::LdI(addr) => r.i = addr,
            Op::JpV0(addr) => r.pc = addr.wrapping_add(r.v[0] as u16),
            Op::Rnd(x, nn) => self.registers.v[x] = self.rng.gen::<u8>() & nn,
            Op::Drw(x, y, n) => self.draw(pc, opcode, x, y, n)?,
            Op::Skp(x) => self.skip_if(self.keypad.is_pressed(self.registers.v[x])),
            Op::Sknp(x) => self.skip_if(!self.keypad.is_pressed(self.registers.v[x])),
            Op::LdFromDelay(x) => r.v[x] = self.timers.delay,
            Op::LdDelay(x) => self.timers.delay = r.v[x],
            Op::LdSound(x) => self.timers.sound = r.v[x],
            Op::WaitKey(x) => match self.keypad.first_pressed() {
                Some(key) => r.v[x] = key,
                // go round again until something is pressed
                None => r.pc = r.pc.wrapping_sub(2),
            },
            Op::AddI(x) => {
                let sum = r.i as u32 + r.v[x] as u32;
                r.i = sum as u16;
                if self.quirks.index_overflow_sets_flag {
                    r.set_flag(sum > 0x0fff);
                }
            }
            Op::LdFont(x) => r.i = Chip8MemoryMap::font_addr(r.v[x]),
            Op::Bcd(x) => {
                let v = r.v[x];
                let digits = [v / 100, v / 10 % 10, v % 10];
                self.store(pc, opcode, &digits)?;
            }
            Op::Dump(x) => {
                let v = self.registers.v;
                self.store(pc, opcode, &v[..=x])?;
                self.advance_index(x);
            }
            Op::Load(x) => {
                let len = self.clip(pc, opcode, x + 1);
                let i = self.registers.i;
                let src = self.memory.get_ro_slice(i, len)?;
                self.registers.v[..len].copy_from_slice(src);
                self.advance_index(x);
            }
            Op::Unknown(_) => warn!("{:04X}: unknown opcode {:04X}, ignored", pc, opcode),
        }
        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.registers.pc = self.registers.pc.wrapping_add(2);
        }
    }

    /// DXYN: XOR N rows of sprite data from I onto the screen at (VX, VY).
    /// VF ends up 1 if any lit pixel was turned off
    fn draw(
        &mut self,
        pc: u16,
        opcode: u16,
        x: usize,
        y: usize,
        n: u8,
    ) -> Result<(), MachineError> {
        let (x, y) = (self.registers.v[x] as usize, self.registers.v[y] as usize);
        self.registers.set_flag(false);
        let len = self.clip(pc, opcode, n as usize);
        let rows = self.memory.get_ro_slice(self.registers.i, len)?;
        let collision = self.display.draw_sprite(x, y, rows);
        self.registers.set_flag(collision);
        Ok(())
    }

    /// write data at I. anything past the end of memory, or below the
    /// program area where the font lives, is dropped with a warning
    fn store(&mut self, pc: u16, opcode: u16, data: &[u8]) -> Result<(), MachineError> {
        let len = self.clip(pc, opcode, data.len());
        let i = self.registers.i as usize;
        let skip = (CHIP8_PROGRAM_ADDR as usize).saturating_sub(i).min(len);
        if skip > 0 {
            warn!(
                "{:04X}: {:04X} writes below {:#06x}; skipped {} of {} bytes",
                pc,
                opcode,
                CHIP8_PROGRAM_ADDR,
                skip,
                data.len()
            );
        }
        self.memory.write(&data[skip..len], (i + skip) as u16)
    }

    /// how much of [I, I+len) lies inside memory. the rest is dropped, with a
    /// warning
    fn clip(&self, pc: u16, opcode: u16, len: usize) -> usize {
        let start = self.registers.i as usize;
        let fits = CHIP8_RAM_SIZE_BYTES.saturating_sub(start).min(len);
        if fits < len {
            warn!(
                "{:04X}: {:04X} reaches {:#06x}, past the end of memory; skipped {} of {} bytes",
                pc,
                opcode,
                start + len - 1,
                len - fits,
                len
            );
        }
        fits
    }

    fn advance_index(&mut self, x: usize) {
        if self.quirks.load_store_increments_index {
            self.registers.i = self.registers.i.wrapping_add(x as u16 + 1);
        }
    }
}

fn stack_error(fault: StackFault, pc: u16, opcode: u16) -> MachineError {
    match fault {
        StackFault::Overflow => MachineError::StackOverflow { pc, opcode },
        StackFault::Underflow => MachineError::StackUnderflow { pc, opcode },
    }
}
