use crate::memory::Memory;

pub const JOYP_ADDR: u16 = 0xFF00;

const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_BUTTONS: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// Bit within its row, and whether the row is the direction pad.
    const fn line(self) -> (u8, bool) {
        match self {
            Button::Right => (0x01, true),
            Button::Left => (0x02, true),
            Button::Up => (0x04, true),
            Button::Down => (0x08, true),
            Button::A => (0x01, false),
            Button::B => (0x02, false),
            Button::Select => (0x04, false),
            Button::Start => (0x08, false),
        }
    }
}

/// P1/JOYP register. Button rows are active low.
#[derive(Debug, Clone)]
pub struct Joypad {
    select: u8,
    directions: u8,
    buttons: u8,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            select: 0x00,
            directions: 0x0F,
            buttons: 0x0F,
        }
    }

    /// Update a button. Returns true when the button went from released to
    /// pressed, which requests the joypad interrupt.
    pub fn set_button(&mut self, button: Button, pressed: bool) -> bool {
        let (bit, direction) = button.line();
        let row = if direction {
            &mut self.directions
        } else {
            &mut self.buttons
        };
        let was_released = *row & bit != 0;
        if pressed {
            *row &= !bit;
        } else {
            *row |= bit;
        }
        pressed && was_released
    }

    fn lines(&self) -> u8 {
        let mut lines = 0x0F;
        if self.select & SELECT_DIRECTIONS == 0 {
            lines &= self.directions;
        }
        if self.select & SELECT_BUTTONS == 0 {
            lines &= self.buttons;
        }
        lines
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory for Joypad {
    fn read_byte(&self, _addr: u16) -> u8 {
        0xC0 | self.select | self.lines()
    }

    fn write_byte(&mut self, _addr: u16, value: u8) {
        self.select = value & 0x30;
    }
}
