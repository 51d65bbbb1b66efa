//! TMDS characters and the fixed symbol tables.
//!
//! Every pixel clock carries one 10-bit character per channel. A character is
//! one of:
//!
//! - **Control** (4 codes): carries HSYNC/VSYNC on channel 0 and the
//!   preamble bits on channels 1 and 2.
//! - **TERC4** (16 codes): auxiliary data island nibbles.
//! - **Data**: 8b/10b transition-minimized pixel data.
//!
//! The video guard band reuses two fixed characters and marks the boundary
//! between a control period and a video data period.

use std::fmt::{Display, Formatter};

use crate::utils::errors::CharacterError;

/// Largest value representable in a character plus one.
pub const CHARACTER_RANGE: u16 = 0x400;

/// Control code table, `(character, [vsync, hsync])`.
pub const CONTROL_CODES: [(u16, u8); 4] = [
    (0b1101010100, 0b00),
    (0b0010101011, 0b01),
    (0b0101010100, 0b10),
    (0b1010101011, 0b11),
];

/// TERC4 table, `(character, nibble)`.
pub const TERC4_CODES: [(u16, u8); 16] = [
    (0b1010011100, 0b0000),
    (0b1001100011, 0b0001),
    (0b1011100100, 0b0010),
    (0b1011100010, 0b0011),
    (0b0101110001, 0b0100),
    (0b0100011110, 0b0101),
    (0b0110001110, 0b0110),
    (0b0100111100, 0b0111),
    (0b1011001100, 0b1000),
    (0b0100111001, 0b1001),
    (0b0110011100, 0b1010),
    (0b1011000110, 0b1011),
    (0b1010001110, 0b1100),
    (0b1001110001, 0b1101),
    (0b0101100011, 0b1110),
    (0b1011000011, 0b1111),
];

/// Video guard band characters for channels 0, 1 and 2.
pub const VIDEO_GUARD_BAND: [u16; 3] = [0b1011001100, 0b0100110011, 0b1011001100];

/// Control value carried by channels 1 and 2 during a video preamble.
pub const VIDEO_PREAMBLE: [u8; 2] = [0b01, 0b00];

pub const HSYNC_BIT: u8 = 0b01;
pub const VSYNC_BIT: u8 = 0b10;

/// A 10-bit TMDS character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Character(u16);

impl Character {
    pub const fn new(value: u16) -> Result<Self, CharacterError> {
        if value >= CHARACTER_RANGE {
            return Err(CharacterError::OutOfRange(value));
        }

        Ok(Self(value))
    }

    /// Keeps the low 10 bits of `value`.
    pub const fn from_masked(value: u32) -> Self {
        Self((value & 0x3FF) as u16)
    }

    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Character {
    type Error = CharacterError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Character> for u16 {
    fn from(c: Character) -> Self {
        c.0
    }
}

impl Display for Character {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:010b}", self.0)
    }
}

/// Returns the 2-bit sync value of a control character.
pub const fn try_decode_as_control(c: Character) -> Option<u8> {
    match c.0 {
        0b1101010100 => Some(0b00),
        0b0010101011 => Some(0b01),
        0b0101010100 => Some(0b10),
        0b1010101011 => Some(0b11),
        _ => None,
    }
}

/// Returns the nibble of a TERC4 character.
pub const fn try_decode_as_terc4(c: Character) -> Option<u8> {
    let mut i = 0;

    while i < TERC4_CODES.len() {
        if TERC4_CODES[i].0 == c.0 {
            return Some(TERC4_CODES[i].1);
        }
        i += 1;
    }

    None
}

/// Decodes a transition-minimized data character to its 8-bit value.
///
/// Bit 9 marks an inverted payload, bit 8 selects XOR (set) or XNOR (clear)
/// differential coding between adjacent bits.
pub const fn decode_data(c: Character) -> u8 {
    let c = c.0;

    let d = if c & 0x200 != 0 {
        !(c as u8)
    } else {
        c as u8
    };

    let q = d ^ (d << 1);

    if c & 0x100 != 0 { q } else { q ^ 0xFE }
}

/// Channel 0 is not inspected, it carries live sync state.
pub const fn is_video_preamble(_ch0: Character, ch1: Character, ch2: Character) -> bool {
    matches!(
        (try_decode_as_control(ch1), try_decode_as_control(ch2)),
        (Some(0b01), Some(0b00))
    )
}

pub const fn is_video_guard_band(ch0: Character, ch1: Character, ch2: Character) -> bool {
    ch0.0 == VIDEO_GUARD_BAND[0] && ch1.0 == VIDEO_GUARD_BAND[1] && ch2.0 == VIDEO_GUARD_BAND[2]
}
