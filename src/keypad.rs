/// The 16-key hex keypad, as last seen by the input device.
///
/// The interpreter only ever reads it; the input device writes it between
/// cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad([bool; 16]);

impl Keypad {
    pub fn new() -> Self {
        Keypad([false; 16])
    }

    /// is the key pressed? only the low nibble of `key` counts
    pub fn is_pressed(&self, key: u8) -> bool {
        self.0[(key & 0x0f) as usize]
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.0[(key & 0x0f) as usize] = pressed;
    }

    pub fn release_all(&mut self) {
        self.0 = [false; 16];
    }

    /// lowest-numbered key that is down, if any
    pub fn first_pressed(&self) -> Option<u8> {
        self.0.iter().position(|down| *down).map(|k| k as u8)
    }
}
