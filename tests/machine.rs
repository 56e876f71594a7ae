use std::io::Write;

use chip8vm::config::Quirks;
use chip8vm::error::MachineError;
use chip8vm::interpreter::{Chip8Interpreter, MachineState};
use chip8vm::memory::{MemoryMap, CHIP8_MAX_PROGRAM_BYTES};

fn machine(quirks: Quirks, rom: &[u8]) -> Chip8Interpreter {
    let mut m = Chip8Interpreter::with_seed(quirks, 0);
    m.load_rom(rom).unwrap();
    m
}

#[test]
fn rom_that_fills_memory_loads() {
    let mut m = Chip8Interpreter::new(Quirks::default());
    let rom = vec![0x12; CHIP8_MAX_PROGRAM_BYTES];
    let mut reader: &[u8] = &rom;
    assert_eq!(m.load_program(&mut reader).unwrap(), 4096 - 0x200);
}

#[test]
fn rom_one_byte_too_big_is_rejected() {
    let mut m = Chip8Interpreter::new(Quirks::default());
    let rom = vec![0; CHIP8_MAX_PROGRAM_BYTES + 1];
    let mut reader: &[u8] = &rom;
    assert!(matches!(
        m.load_program(&mut reader),
        Err(MachineError::RomTooLarge { .. })
    ));
}

#[test]
fn empty_rom_is_rejected() {
    let mut m = Chip8Interpreter::new(Quirks::default());
    let mut reader: &[u8] = &[];
    assert!(matches!(
        m.load_program(&mut reader),
        Err(MachineError::EmptyRom)
    ));
}

#[test]
fn rom_loads_from_a_file() {
    let path = std::env::temp_dir().join(format!("chip8vm-test-{}.ch8", std::process::id()));
    {
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x60, 0x05, 0x70, 0x0a]).unwrap();
    }
    let mut m = Chip8Interpreter::new(Quirks::default());
    let mut f = std::fs::File::open(&path).unwrap();
    assert_eq!(m.load_program(&mut f).unwrap(), 4);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(m.memory().get_word(0x202).unwrap(), 0x700a);
}

#[test]
fn load_then_add() {
    let mut m = machine(Quirks::default(), &[0x60, 0x05, 0x70, 0x0a]);
    m.cycle().unwrap();
    m.cycle().unwrap();
    assert_eq!(m.registers().v[0], 15);
    assert_eq!(m.registers().pc, 0x204);
}

#[test]
fn jump_to_self_spins_in_place() {
    let mut m = machine(Quirks::default(), &[0x12, 0x00]);
    for _ in 0..10_000 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().pc, 0x200);
    assert_eq!(m.state(), MachineState::Running);
}

// LD I, 300; LD V0, 01; LD V1, 02; LD [I], V1; LD V1, [I]
const STORE_LOAD: [u8; 10] = [0xa3, 0x00, 0x60, 0x01, 0x61, 0x02, 0xf1, 0x55, 0xf1, 0x65];

#[test]
fn register_dump_leaves_index_by_default() {
    let mut m = machine(Quirks::default(), &STORE_LOAD);
    for _ in 0..5 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().i, 0x300);
    assert_eq!(m.registers().v[..2], [1, 2]);
}

#[test]
fn register_dump_advances_index_with_quirk() {
    let quirks = Quirks {
        load_store_increments_index: true,
        ..Quirks::default()
    };
    let mut m = machine(quirks, &STORE_LOAD);
    for _ in 0..4 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().i, 0x302);
    assert_eq!(m.memory().get_ro_slice(0x300, 2).unwrap(), &[1, 2]);
    // the load now reads from 0x302, which is empty
    m.cycle().unwrap();
    assert_eq!(m.registers().i, 0x304);
    assert_eq!(m.registers().v[..2], [0, 0]);
}

// LD I, FFF; LD V2, 01; ADD I, V2
const INDEX_OVERFLOW: [u8; 6] = [0xaf, 0xff, 0x62, 0x01, 0xf2, 0x1e];

#[test]
fn add_to_index_leaves_flag_by_default() {
    let mut m = machine(Quirks::default(), &INDEX_OVERFLOW);
    for _ in 0..3 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().i, 0x1000);
    assert_eq!(m.registers().v[0xf], 0);
}

#[test]
fn add_to_index_sets_flag_with_quirk() {
    let quirks = Quirks {
        index_overflow_sets_flag: true,
        ..Quirks::default()
    };
    let mut m = machine(quirks, &INDEX_OVERFLOW);
    for _ in 0..3 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().i, 0x1000);
    assert_eq!(m.registers().v[0xf], 1);
}

#[test]
fn stack_overflow_pauses_until_resumed() {
    let mut m = machine(Quirks::default(), &[0x22, 0x00]);
    let fault = (0..100).find_map(|_| m.cycle().err());
    assert!(matches!(fault, Some(MachineError::StackOverflow { .. })));
    assert_eq!(m.state(), MachineState::Paused);
    m.toggle_pause();
    assert_eq!(m.state(), MachineState::Running);
}

// LD I, FFF; LD V1, 02; ADD I, V1; LD B, V1; DRW V0, V0, 1; JP 20A
const INDEX_BEYOND_MEMORY: [u8; 12] = [
    0xaf, 0xff, 0x61, 0x02, 0xf1, 0x1e, 0xf1, 0x33, 0xd0, 0x01, 0x12, 0x0a,
];

#[test]
fn index_beyond_memory_keeps_running() {
    let mut m = machine(Quirks::default(), &INDEX_BEYOND_MEMORY);
    for _ in 0..6 {
        m.cycle().unwrap();
    }
    assert_eq!(m.registers().i, 0x1001);
    assert_eq!(m.registers().pc, 0x20a);
    assert_eq!(m.state(), MachineState::Running);
    assert!(m.display().is_blank());
}
