//! Instruction decoding.
//!
//! A fetched word is split into its fields once ([`Instruction`]) and then
//! classified into a tagged [`Op`]. Every one of the 65536 words decodes to
//! something; words with no meaning become [`Op::Unknown`].
use std::fmt;

/// One fetched word, broken into the fields the instruction set uses.
///
/// ```text
///  opcode: ABCD
///  nnn:     BCD  (12 bit address)
///  nn:       CD  (8 bit immediate)
///  n:         D  (4 bit immediate)
///  x:       B    (first register)
///  y:        C   (second register)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u16,
    pub nnn: u16,
    pub nn: u8,
    pub n: u8,
    pub x: usize,
    pub y: usize,
}

impl Instruction {
    pub fn decode(hi: u8, lo: u8) -> Self {
        Self::from_word(u16::from_be_bytes([hi, lo]))
    }

    pub fn from_word(opcode: u16) -> Self {
        Instruction {
            opcode,
            nnn: opcode & 0x0fff,
            nn: (opcode & 0x00ff) as u8,
            n: (opcode & 0x000f) as u8,
            x: ((opcode >> 8) & 0x0f) as usize,
            y: ((opcode >> 4) & 0x0f) as usize,
        }
    }

    /// the high nibble, which picks the instruction family
    pub fn family(&self) -> u8 {
        (self.opcode >> 12) as u8
    }

    pub fn op(&self) -> Op {
        Op::from(*self)
    }
}

/// The instruction set, one variant per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jp(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SeImm(usize, u8),
    /// 4XNN
    SneImm(usize, u8),
    /// 5XY0
    SeReg(usize, usize),
    /// 6XNN
    LdImm(usize, u8),
    /// 7XNN
    AddImm(usize, u8),
    /// 8XY0
    Ld(usize, usize),
    /// 8XY1
    Or(usize, usize),
    /// 8XY2
    And(usize, usize),
    /// 8XY3
    Xor(usize, usize),
    /// 8XY4
    Add(usize, usize),
    /// 8XY5
    Sub(usize, usize),
    /// 8XY6
    Shr(usize),
    /// 8XY7
    Subn(usize, usize),
    /// 8XYE
    Shl(usize),
    /// 9XY0
    SneReg(usize, usize),
    /// ANNN
    LdI(u16),
    /// BNNN
    JpV0(u16),
    /// CXNN
    Rnd(usize, u8),
    /// DXYN
    Drw(usize, usize, u8),
    /// EX9E
    Skp(usize),
    /// EXA1
    Sknp(usize),
    /// FX07
    LdFromDelay(usize),
    /// FX0A
    WaitKey(usize),
    /// FX15
    LdDelay(usize),
    /// FX18
    LdSound(usize),
    /// FX1E
    AddI(usize),
    /// FX29
    LdFont(usize),
    /// FX33
    Bcd(usize),
    /// FX55
    Dump(usize),
    /// FX65
    Load(usize),
    Unknown(u16),
}

impl From<Instruction> for Op {
    fn from(ins: Instruction) -> Self {
        let Instruction {
            opcode,
            nnn,
            nn,
            n,
            x,
            y,
        } = ins;
        match ins.family() {
            0x0 => match opcode {
                0x00e0 => Op::Cls,
                0x00ee => Op::Ret,
                _ => Op::Unknown(opcode),
            },
            0x1 => Op::Jp(nnn),
            0x2 => Op::Call(nnn),
            0x3 => Op::SeImm(x, nn),
            0x4 => Op::SneImm(x, nn),
            0x5 if n == 0 => Op::SeReg(x, y),
            0x6 => Op::LdImm(x, nn),
            0x7 => Op::AddImm(x, nn),
            0x8 => match n {
                0x0 => Op::Ld(x, y),
                0x1 => Op::Or(x, y),
                0x2 => Op::And(x, y),
                0x3 => Op::Xor(x, y),
                0x4 => Op::Add(x, y),
                0x5 => Op::Sub(x, y),
                0x6 => Op::Shr(x),
                0x7 => Op::Subn(x, y),
                0xe => Op::Shl(x),
                _ => Op::Unknown(opcode),
            },
            0x9 if n == 0 => Op::SneReg(x, y),
            0xa => Op::LdI(nnn),
            0xb => Op::JpV0(nnn),
            0xc => Op::Rnd(x, nn),
            0xd => Op::Drw(x, y, n),
            0xe => match nn {
                0x9e => Op::Skp(x),
                0xa1 => Op::Sknp(x),
                _ => Op::Unknown(opcode),
            },
            0xf => match nn {
                0x07 => Op::LdFromDelay(x),
                0x0a => Op::WaitKey(x),
                0x15 => Op::LdDelay(x),
                0x18 => Op::LdSound(x),
                0x1e => Op::AddI(x),
                0x29 => Op::LdFont(x),
                0x33 => Op::Bcd(x),
                0x55 => Op::Dump(x),
                0x65 => Op::Load(x),
                _ => Op::Unknown(opcode),
            },
            _ => Op::Unknown(opcode),
        }
    }
}

/// disassembly, for tracing
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Cls => write!(f, "CLS"),
            Op::Ret => write!(f, "RET"),
            Op::Jp(a) => write!(f, "JP {:03X}", a),
            Op::Call(a) => write!(f, "CALL {:03X}", a),
            Op::SeImm(x, nn) => write!(f, "SE V{:X}, {:02X}", x, nn),
            Op::SneImm(x, nn) => write!(f, "SNE V{:X}, {:02X}", x, nn),
            Op::SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            Op::LdImm(x, nn) => write!(f, "LD V{:X}, {:02X}", x, nn),
            Op::AddImm(x, nn) => write!(f, "ADD V{:X}, {:02X}", x, nn),
            Op::Ld(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Op::Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            Op::And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Op::Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Op::Add(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Op::Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Op::Shr(x) => write!(f, "SHR V{:X}", x),
            Op::Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Op::Shl(x) => write!(f, "SHL V{:X}", x),
            Op::SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            Op::LdI(a) => write!(f, "LD I, {:03X}", a),
            Op::JpV0(a) => write!(f, "JP V0, {:03X}", a),
            Op::Rnd(x, nn) => write!(f, "RND V{:X}, {:02X}", x, nn),
            Op::Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {:X}", x, y, n),
            Op::Skp(x) => write!(f, "SKP V{:X}", x),
            Op::Sknp(x) => write!(f, "SKNP V{:X}", x),
            Op::LdFromDelay(x) => write!(f, "LD V{:X}, DT", x),
            Op::WaitKey(x) => write!(f, "LD V{:X}, K", x),
            Op::LdDelay(x) => write!(f, "LD DT, V{:X}", x),
            Op::LdSound(x) => write!(f, "LD ST, V{:X}", x),
            Op::AddI(x) => write!(f, "ADD I, V{:X}", x),
            Op::LdFont(x) => write!(f, "LD F, V{:X}", x),
            Op::Bcd(x) => write!(f, "LD B, V{:X}", x),
            Op::Dump(x) => write!(f, "LD [I], V{:X}", x),
            Op::Load(x) => write!(f, "LD V{:X}, [I]", x),
            Op::Unknown(opcode) => write!(f, "??? {:04X}", opcode),
        }
    }
}
