use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::{debug, error};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

use crate::keypad::Keypad;

/// map of keys on the left-hand side of a qwerty keyboard to the hex keypad
///
///  1 2 3 4      1 2 3 C
///  q w e r  =>  4 5 6 D
///  a s d f      7 8 9 E
///  z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00), // x
    ('1', 0x01), // 1
    ('2', 0x02), // 2
    ('3', 0x03), // 3
    ('q', 0x04), // q
    ('w', 0x05), // w
    ('e', 0x06), // e
    ('a', 0x07), // a
    ('s', 0x08), // s
    ('d', 0x09), // d
    ('z', 0x0a), // z
    ('c', 0x0b), // c
    ('4', 0x0c), // 4
    ('r', 0x0d), // r
    ('f', 0x0e), // f
    ('v', 0x0f), // v
];

/// terminals only tell us about presses (and autorepeat), never releases, so
/// a key counts as held for this long after we last heard about it
pub const KEY_HOLD: Duration = Duration::from_millis(200);

/// lifecycle requests from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Quit,
    TogglePause,
}

/// reads keypresses
pub trait Input {
    /// take in everything that has happened since the last poll, update the
    /// keypad to match, and hand back any lifecycle requests
    fn poll(&mut self, keypad: &mut Keypad, now: Instant) -> Result<Vec<Signal>, io::Error>;
}

/// Turns key events into keypad state; no I/O so it can be driven directly.
struct KeyState {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; 16],
}

impl KeyState {
    fn new() -> Self {
        KeyState {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; 16],
        }
    }

    fn key_event(&mut self, evt: KeyEvent, now: Instant) -> Option<Signal> {
        match evt.code {
            KeyCode::Esc => Some(Signal::Quit),
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Signal::Quit)
            }
            KeyCode::Char(' ') => Some(Signal::TogglePause),
            KeyCode::Char(key) => {
                match self.keymap.get(&key.to_ascii_lowercase()) {
                    Some(mapped_key) => self.last_seen[*mapped_key as usize] = Some(now),
                    None => debug!("can't map {:?} to a CHIP-8 key", key),
                }
                None
            }
            _ => None,
        }
    }

    fn update(&self, keypad: &mut Keypad, now: Instant) {
        for (key, seen) in self.last_seen.iter().enumerate() {
            let held = seen.map_or(false, |t| now.saturating_duration_since(t) < KEY_HOLD);
            keypad.set(key as u8, held);
        }
    }
}

/// Input from the controlling terminal, using crossterm in raw mode.
pub struct TermInput {
    keys: KeyState,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput {
            keys: KeyState::new(),
        })
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            error!("could not leave raw mode: {}", e);
        }
    }
}

impl Input for TermInput {
    fn poll(&mut self, keypad: &mut Keypad, now: Instant) -> Result<Vec<Signal>, io::Error> {
        let mut signals = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                signals.extend(self.keys.key_event(evt, now));
            }
        }
        self.keys.update(keypad, now);
        Ok(signals)
    }
}

/// dummy Input implementation for testing
pub struct DummyInput {
    keys: Vec<u8>,
    signals: VecDeque<Signal>,
}

impl DummyInput {
    /// the given keys are held down until changed
    pub fn new(keys: &[u8]) -> Self {
        DummyInput {
            keys: Vec::from(keys),
            signals: VecDeque::new(),
        }
    }

    pub fn hold(&mut self, keys: &[u8]) {
        self.keys = Vec::from(keys);
    }

    /// deliver a signal on the next poll
    pub fn send(&mut self, signal: Signal) {
        self.signals.push_back(signal);
    }
}

impl Input for DummyInput {
    fn poll(&mut self, keypad: &mut Keypad, _now: Instant) -> Result<Vec<Signal>, io::Error> {
        keypad.release_all();
        for key in &self.keys {
            keypad.set(*key, true);
        }
        Ok(self.signals.drain(..).collect())
    }
}
