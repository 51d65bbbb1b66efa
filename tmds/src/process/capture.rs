use std::collections::VecDeque;

use log::error;

use crate::structs::character::Character;
use crate::utils::errors::CaptureError;

/// Size of one capture word in bytes.
pub const WORD_BYTES: usize = 4;

/// Set when the three characters of the word are valid.
pub const VALID_BIT: u32 = 1 << 31;

pub const RESERVED_BIT: u32 = 1 << 30;

const CHANNEL_SHIFT: [u32; 3] = [0, 10, 20];

/// The outputs of a character source for one pixel clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tick {
    pub characters: [Character; 3],
    pub valid: bool,
}

impl Tick {
    pub const fn new(characters: [Character; 3]) -> Self {
        Self {
            characters,
            valid: true,
        }
    }

    /// A tick whose characters must not be consumed.
    pub const fn invalid() -> Self {
        Self {
            characters: [Character::from_masked(0); 3],
            valid: false,
        }
    }

    /// Unpacks a capture word: channel `n` in bits `10n..10n+10`, valid flag
    /// in bit 31.
    pub const fn from_word(word: u32) -> Self {
        Self {
            characters: [
                Character::from_masked(word >> CHANNEL_SHIFT[0]),
                Character::from_masked(word >> CHANNEL_SHIFT[1]),
                Character::from_masked(word >> CHANNEL_SHIFT[2]),
            ],
            valid: word & VALID_BIT != 0,
        }
    }

    pub const fn to_word(&self) -> u32 {
        let mut word = 0;
        let mut i = 0;

        while i < 3 {
            word |= (self.characters[i].value() as u32) << CHANNEL_SHIFT[i];
            i += 1;
        }

        if self.valid { word | VALID_BIT } else { word }
    }

    pub fn to_le_bytes(&self) -> [u8; WORD_BYTES] {
        self.to_word().to_le_bytes()
    }

    pub fn values(&self) -> [u16; 3] {
        self.characters.map(Character::value)
    }
}

/// Splits a byte stream of capture words into [`Tick`]s.
///
/// # Example
///
/// ```rust
/// use tmds::process::capture::{CaptureReader, Tick};
/// use tmds::structs::character::Character;
///
/// let tick = Tick::new([Character::new(0b1101010100)?; 3]);
///
/// let mut reader = CaptureReader::default();
/// reader.push_bytes(&tick.to_le_bytes());
/// reader.push_bytes(&[0x00, 0x00]);
///
/// assert_eq!(reader.next().transpose()?, Some(tick));
/// assert_eq!(reader.next().transpose()?, None);
/// assert_eq!(reader.remaining(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct CaptureReader {
    buffer: VecDeque<u8>,
    words: u64,
    errors: usize,
}

impl CaptureReader {
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Bytes buffered that do not yet form a whole word.
    pub fn remaining(&self) -> usize {
        self.buffer.len()
    }

    /// Words consumed so far, including rejected ones.
    pub fn words(&self) -> u64 {
        self.words
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }
}

impl Iterator for CaptureReader {
    type Item = Result<Tick, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.len() < WORD_BYTES {
            return None;
        }

        let mut bytes = [0u8; WORD_BYTES];
        for (dst, src) in bytes.iter_mut().zip(self.buffer.drain(..WORD_BYTES)) {
            *dst = src;
        }

        let index = self.words;
        self.words += 1;

        let word = u32::from_le_bytes(bytes);
        if word & RESERVED_BIT != 0 {
            self.errors += 1;
            let err = CaptureError::ReservedBitSet { index, word };
            error!("{err}");
            return Some(Err(err));
        }

        Some(Ok(Tick::from_word(word)))
    }
}
