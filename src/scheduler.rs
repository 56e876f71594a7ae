//! The main loop.
//!
//! Each iteration polls input, runs at most one instruction, ticks the timers
//! for every 1/60s that has passed, and redraws if a frame is due. The loop
//! then sleeps until the next instruction slot, so the instruction rate is
//! set by `ips` while timers and frames stay at 60Hz wall-clock.
//!
//! `iterate` takes the time as an argument and never sleeps, which lets tests
//! drive the loop with made-up clocks; `run` is the real-time wrapper.
use log::{info, warn};
use std::io;
use std::time::{Duration, Instant};

use crate::display::Display;
use crate::input::{Input, Signal};
use crate::interpreter::{Chip8Interpreter, MachineState};
use crate::sound::Sound;
use crate::timer::{tick_interval, Cadence};

/// if we fall this far behind, give up on catching up
const MAX_LAG: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Scheduler<'a> {
    interpreter: &'a mut Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    instruction_interval: Duration,
    timers: Cadence,
    frames: Cadence,
    sound_failed: bool,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        interpreter: &'a mut Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        ips: u32,
        start: Instant,
    ) -> Self {
        Scheduler {
            interpreter,
            display,
            input,
            sound,
            instruction_interval: Duration::from_secs(1) / ips.max(1),
            timers: Cadence::new(tick_interval(), start),
            frames: Cadence::new(tick_interval(), start),
            sound_failed: false,
        }
    }

    /// loop until the user quits
    pub fn run(&mut self) -> Result<(), io::Error> {
        let mut deadline = Instant::now();
        loop {
            if self.iterate(Instant::now())? == Flow::Stop {
                return Ok(());
            }
            deadline += self.instruction_interval;
            let now = Instant::now();
            if deadline > now {
                spin_sleep::sleep(deadline - now);
            } else if now - deadline > MAX_LAG {
                deadline = now;
            }
        }
    }

    /// one trip round the loop at time `now`
    pub fn iterate(&mut self, now: Instant) -> Result<Flow, io::Error> {
        for signal in self.input.poll(self.interpreter.keypad_mut(), now)? {
            self.signal(signal);
        }
        if self.interpreter.state() == MachineState::Quit {
            self.update_sound();
            return Ok(Flow::Stop);
        }

        if let Err(e) = self.interpreter.cycle() {
            warn!("{}; machine paused", e);
            self.display.set_paused(true);
        }

        // paused machines don't count time
        let ticks = self.timers.due(now);
        if self.interpreter.state() == MachineState::Running {
            for _ in 0..ticks {
                self.interpreter.tick_timers();
            }
        }
        self.update_sound();

        if self.frames.due(now) > 0 {
            self.display.draw(self.interpreter.display())?;
        }
        Ok(Flow::Continue)
    }

    fn signal(&mut self, signal: Signal) {
        match signal {
            Signal::Quit => {
                info!("quit");
                self.interpreter.set_state(MachineState::Quit);
            }
            Signal::TogglePause => {
                let state = self.interpreter.toggle_pause();
                info!("{}", if state == MachineState::Paused { "paused" } else { "resumed" });
                self.display.set_paused(state == MachineState::Paused);
            }
        }
    }

    /// the tone follows the sound timer, and is off whenever we aren't running
    fn update_sound(&mut self) {
        if self.sound_failed {
            return;
        }
        let wanted = self.interpreter.state() == MachineState::Running
            && self.interpreter.timers().is_sounding();
        if wanted == self.sound.is_beeping() {
            return;
        }
        let result = if wanted {
            self.sound.beep()
        } else {
            self.sound.stop()
        };
        if let Err(e) = result {
            warn!("sound disabled: {}", e);
            self.sound_failed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Quirks;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::sound::Mute;

    fn machine(rom: &[u8]) -> Chip8Interpreter {
        let mut m = Chip8Interpreter::with_seed(Quirks::default(), 1);
        m.load_rom(rom).unwrap();
        m
    }

    // LD V0, FF; LD DT, V0; JP 204
    const SET_DELAY: [u8; 6] = [0x60, 0xff, 0xf0, 0x15, 0x12, 0x04];

    fn run_for(
        m: &mut Chip8Interpreter,
        display: &mut DummyDisplay,
        input: &mut DummyInput,
        sound: &mut Mute,
        step: Duration,
        until: Duration,
    ) -> usize {
        let start = Instant::now();
        let ips = (Duration::from_secs(1).as_nanos() / step.as_nanos()) as u32;
        let mut s = Scheduler::new(m, display, input, sound, ips, start);
        let mut t = step;
        let mut iterations = 0;
        while t <= until {
            if s.iterate(start + t).unwrap() == Flow::Stop {
                break;
            }
            iterations += 1;
            t += step;
        }
        iterations
    }

    #[test]
    fn test_timers_tick_at_sixty_hz() {
        for step_us in [1000, 100, 5000] {
            let mut m = machine(&SET_DELAY);
            let mut display = DummyDisplay::new();
            run_for(
                &mut m,
                &mut display,
                &mut DummyInput::new(&[]),
                &mut Mute::new(),
                Duration::from_micros(step_us),
                Duration::from_secs(1),
            );
            assert_eq!(m.timers().delay, 255 - 60, "step {}us", step_us);
            assert_eq!(display.frames, 60, "step {}us", step_us);
        }
    }

    #[test]
    fn test_one_instruction_per_iteration() {
        // ADD V0, 01; JP 200
        let mut m = machine(&[0x70, 0x01, 0x12, 0x00]);
        let n = run_for(
            &mut m,
            &mut DummyDisplay::new(),
            &mut DummyInput::new(&[]),
            &mut Mute::new(),
            Duration::from_millis(1),
            Duration::from_millis(100),
        );
        assert_eq!(n, 100);
        assert_eq!(m.registers().v[0], 50);
    }

    #[test]
    fn test_pause_freezes_machine_but_still_draws() {
        let mut m = machine(&SET_DELAY);
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let start = Instant::now();
        {
            let mut s = Scheduler::new(&mut m, &mut display, &mut input, &mut sound, 1000, start);
            s.iterate(start).unwrap();
            s.iterate(start + Duration::from_millis(1)).unwrap();
        }
        assert_eq!(m.timers().delay, 0xff);
        input.send(Signal::TogglePause);
        {
            let mut s = Scheduler::new(&mut m, &mut display, &mut input, &mut sound, 1000, start);
            for ms in 2..500 {
                s.iterate(start + Duration::from_millis(ms)).unwrap();
            }
        }
        assert_eq!(m.state(), MachineState::Paused);
        assert_eq!(m.registers().pc, 0x204);
        assert_eq!(m.timers().delay, 0xff);
        assert!(display.paused);
        assert!(display.frames > 0);
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut m = machine(&SET_DELAY);
        let mut input = DummyInput::new(&[]);
        input.send(Signal::Quit);
        let n = run_for(
            &mut m,
            &mut DummyDisplay::new(),
            &mut input,
            &mut Mute::new(),
            Duration::from_millis(1),
            Duration::from_secs(1),
        );
        assert_eq!(n, 0);
        assert_eq!(m.state(), MachineState::Quit);
    }

    #[test]
    fn test_stack_fault_pauses() {
        let mut m = machine(&[0x00, 0xee]);
        let mut display = DummyDisplay::new();
        run_for(
            &mut m,
            &mut display,
            &mut DummyInput::new(&[]),
            &mut Mute::new(),
            Duration::from_millis(1),
            Duration::from_millis(50),
        );
        assert_eq!(m.state(), MachineState::Paused);
        assert!(display.paused);
        assert_eq!(m.registers().pc, 0x202);
    }

    #[test]
    fn test_wait_for_key_keeps_loop_alive() {
        // LD V5, K; JP 202
        let mut m = machine(&[0xf5, 0x0a, 0x12, 0x02]);
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        run_for(
            &mut m,
            &mut display,
            &mut input,
            &mut Mute::new(),
            Duration::from_millis(1),
            Duration::from_millis(100),
        );
        assert_eq!(m.registers().pc, 0x200);
        assert_eq!(display.frames, 6);

        input.hold(&[0xb]);
        run_for(
            &mut m,
            &mut display,
            &mut input,
            &mut Mute::new(),
            Duration::from_millis(1),
            Duration::from_millis(1),
        );
        assert_eq!(m.registers().pc, 0x202);
        assert_eq!(m.registers().v[5], 0xb);
    }

    #[test]
    fn test_sound_follows_timer() {
        // LD V0, 03; LD ST, V0; JP 204
        let mut m = machine(&[0x60, 0x03, 0xf0, 0x18, 0x12, 0x04]);
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let start = Instant::now();
        let mut s = Scheduler::new(&mut m, &mut display, &mut input, &mut sound, 1000, start);
        s.iterate(start).unwrap();
        s.iterate(start + Duration::from_millis(1)).unwrap();
        assert!(s.sound.is_beeping());
        // three ticks later it's quiet again
        s.iterate(start + Duration::from_millis(51)).unwrap();
        assert!(!s.sound.is_beeping());
        drop(s);
        assert_eq!(sound.beeps, 1);
    }
}
