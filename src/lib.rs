//! A CHIP-8 virtual machine with a terminal front end.
//!
//! ## Design
//!
//! * the machine is one explicit value (`Chip8Interpreter`) that owns memory,
//!   registers, the frame buffer, timers and the keypad snapshot; everything
//!   else borrows it
//! * instructions are decoded into a tagged `Op` and executed with a single
//!   exhaustive match
//! * display, input and sound sit behind traits so the interpreter doesn't
//!   need to know how they work, and tests can plug in dummies
//! * one instruction per trip round the main loop, sleeping to hit the
//!   configured rate; timers and redraws run off the wall clock at 60Hz
//!
//! Model
//!
//! run
//!  |-- config (command line)
//!  |-- interpreter(quirks)
//!  |    `-- load ROM at 0x200
//!  |-- display, input, sound
//!  `-- scheduler(interpreter, display, input, sound)
//!       |-- input.poll()          -> keypad, quit / pause
//!       |-- interpreter.cycle()   unless paused
//!       |-- tick timers           for each 1/60s elapsed
//!       |-- display.draw()        at most once per 1/60s
//!       `-- sleep until the next instruction is due
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod sound;
pub mod timer;

use std::fs::File;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

pub use config::{Config, Params};

use display::{MonoTermDisplay, CHIP8_DISPLAY_HEIGHT, CHIP8_DISPLAY_WIDTH};
use input::TermInput;
use interpreter::Chip8Interpreter;
use scheduler::Scheduler;
use sound::{Mute, SimpleBeep, Sound};

/// load the ROM, set up the terminal and run until the user quits
pub fn run(params: Params) -> Result<()> {
    let config = Config::from(params);

    let mut interpreter = Chip8Interpreter::new(config.quirks);
    let mut rom = File::open(&config.rom)
        .with_context(|| format!("could not open ROM {}", config.rom.display()))?;
    let size = interpreter
        .load_program(&mut rom)
        .with_context(|| format!("could not load ROM {}", config.rom.display()))?;
    info!("loaded {} ({} bytes)", config.rom.display(), size);

    let mut input = TermInput::new().context("could not put the terminal into raw mode")?;
    let mut display =
        MonoTermDisplay::new(CHIP8_DISPLAY_WIDTH, CHIP8_DISPLAY_HEIGHT, config.render)
            .context("could not set up the display")?;
    let mut sound: Box<dyn Sound> = if config.beep {
        Box::new(SimpleBeep::new())
    } else {
        Box::new(Mute::new())
    };

    let mut scheduler = Scheduler::new(
        &mut interpreter,
        &mut display,
        &mut input,
        sound.as_mut(),
        config.ips,
        Instant::now(),
    );
    scheduler.run().context("lost the terminal")?;
    Ok(())
}
