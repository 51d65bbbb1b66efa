//! Reference TMDS encoder and a test pattern character source.
//!
//! The encoder follows the DVI 1.0 transition-minimizing and DC balancing
//! rules, so its output is exactly what [`decode_data`] expects. The source
//! walks a raster described by [`VideoTiming`] and emits one [`Tick`] per
//! pixel clock, with a video preamble and leading guard band in front of
//! every active line.
//!
//! [`decode_data`]: crate::structs::character::decode_data

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::process::capture::Tick;
use crate::process::validate::{GUARD_BAND_DOTS, MIN_PREAMBLE_SPACING, PREAMBLE_DOTS};
use crate::structs::character::{
    CONTROL_CODES, Character, HSYNC_BIT, VIDEO_GUARD_BAND, VIDEO_PREAMBLE, VSYNC_BIT,
};
use crate::structs::frame::Pixel;
use crate::utils::errors::TimingError;

/// Invalid ticks emitted before the first valid characters.
pub const DEFAULT_PIPELINE_LATENCY: usize = 4;

/// Encoder state for one channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TmdsEncoder {
    disparity: i32,
}

impl TmdsEncoder {
    /// Running disparity (ones minus zeros) of the characters sent so far.
    pub fn disparity(&self) -> i32 {
        self.disparity
    }

    pub fn encode_data(&mut self, d: u8) -> Character {
        let ones = d.count_ones();
        let xnor = ones > 4 || (ones == 4 && d & 1 == 0);

        let mut q_m = (d & 1) as u16;
        for i in 1..8 {
            let bit = ((q_m >> (i - 1)) ^ (d as u16 >> i) ^ xnor as u16) & 1;
            q_m |= bit << i;
        }
        if !xnor {
            q_m |= 0x100;
        }

        let n1 = (q_m & 0xFF).count_ones() as i32;
        let n0 = 8 - n1;
        let xor = !xnor;

        let q_out = if self.disparity == 0 || n1 == n0 {
            if xor {
                self.disparity += n1 - n0;
                q_m
            } else {
                self.disparity += n0 - n1;
                0x200 | (q_m ^ 0xFF)
            }
        } else if (self.disparity > 0 && n1 > n0) || (self.disparity < 0 && n0 > n1) {
            self.disparity += 2 * xor as i32 + (n0 - n1);
            0x200 | (q_m ^ 0xFF)
        } else {
            self.disparity += -2 * xnor as i32 + (n1 - n0);
            q_m
        };

        Character::from_masked(q_out as u32)
    }

    /// Control characters reset the running disparity.
    pub fn encode_control(&mut self, value: u8) -> Character {
        self.disparity = 0;
        Character::from_masked(CONTROL_CODES[(value & 0b11) as usize].0 as u32)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    /// Level of the sync bit while the pulse is (or is not) active.
    pub fn level(self, in_pulse: bool) -> bool {
        match self {
            Polarity::Positive => in_pulse,
            Polarity::Negative => !in_pulse,
        }
    }
}

/// Timing of one raster axis, in dots for the horizontal axis and lines for
/// the vertical one. The raster starts with the sync pulse, followed by the
/// back porch, the active region and the front porch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTiming {
    pub active: usize,
    pub front_porch: usize,
    pub sync: usize,
    pub back_porch: usize,
    #[serde(default)]
    pub sync_polarity: Polarity,
}

impl AxisTiming {
    pub fn blanking(&self) -> usize {
        self.front_porch + self.sync + self.back_porch
    }

    pub fn total(&self) -> usize {
        self.active + self.blanking()
    }

    pub fn active_start(&self) -> usize {
        self.sync + self.back_porch
    }

    fn is_active(&self, position: usize) -> bool {
        (self.active_start()..self.active_start() + self.active).contains(&position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTiming {
    pub horizontal: AxisTiming,
    pub vertical: AxisTiming,
}

impl VideoTiming {
    /// 640x480 at 60 Hz, 25.175 MHz pixel clock.
    pub fn vga_640x480() -> Self {
        Self {
            horizontal: AxisTiming {
                active: 640,
                front_porch: 16,
                sync: 96,
                back_porch: 48,
                sync_polarity: Polarity::Negative,
            },
            vertical: AxisTiming {
                active: 480,
                front_porch: 10,
                sync: 2,
                back_porch: 33,
                sync_polarity: Polarity::Negative,
            },
        }
    }

    /// A 16x8 mode small enough for quick checks.
    pub fn tiny() -> Self {
        Self {
            horizontal: AxisTiming {
                active: 16,
                front_porch: 4,
                sync: 4,
                back_porch: 16,
                sync_polarity: Polarity::Positive,
            },
            vertical: AxisTiming {
                active: 8,
                front_porch: 1,
                sync: 2,
                back_porch: 2,
                sync_polarity: Polarity::Positive,
            },
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let timing: Self = serde_yaml_ng::from_str(yaml)?;
        timing.validate()?;
        Ok(timing)
    }

    pub fn validate(&self) -> Result<(), TimingError> {
        for (axis, timing) in [("Horizontal", &self.horizontal), ("Vertical", &self.vertical)] {
            if timing.active == 0 {
                return Err(TimingError::EmptyActive { axis });
            }
            if timing.sync == 0 {
                return Err(TimingError::EmptySync { axis });
            }
        }

        let h = &self.horizontal;
        let lead_in = PREAMBLE_DOTS + GUARD_BAND_DOTS;

        if h.back_porch < lead_in {
            return Err(TimingError::BackPorchTooShort {
                back_porch: h.back_porch,
                required: lead_in,
            });
        }

        if h.blanking() < MIN_PREAMBLE_SPACING + lead_in {
            return Err(TimingError::BlankingTooShort {
                blanking: h.blanking(),
                required: MIN_PREAMBLE_SPACING + lead_in,
            });
        }

        Ok(())
    }

    /// Pixel clocks per frame.
    pub fn dots_per_frame(&self) -> usize {
        self.horizontal.total() * self.vertical.total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Eight vertical bars: white, yellow, cyan, green, magenta, red, blue,
    /// black.
    ColorBars,
    /// Red ramps left to right, green top to bottom, blue is constant.
    Gradient,
    Solid(Pixel),
}

impl Pattern {
    pub fn pixel(&self, x: usize, y: usize, width: usize, height: usize) -> Pixel {
        let ramp = |pos: usize, len: usize| (pos * 255 / len.saturating_sub(1).max(1)) as u8;

        match *self {
            Pattern::ColorBars => {
                let bar = 7 - (x * 8 / width.max(1)).min(7);
                let level = |bit: usize| if bar & bit != 0 { 0xFF } else { 0x00 };
                Pixel::new(level(0b010), level(0b100), level(0b001))
            }
            Pattern::Gradient => Pixel::new(ramp(x, width), ramp(y, height), 0x80),
            Pattern::Solid(pixel) => pixel,
        }
    }
}

/// Emits the character stream of a test pattern, one tick per pixel clock.
///
/// The stream opens with [`DEFAULT_PIPELINE_LATENCY`] invalid ticks and then
/// starts at the first dot of the vertical sync. Without a frame limit the
/// iterator never ends. With a limit of `n`, it stops once the frame start
/// that closes the `n`-th frame has been sent. A limit of 0 leaves only the
/// latency ticks.
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    timing: VideoTiming,
    pattern: Pattern,
    encoders: [TmdsEncoder; 3],
    latency: usize,
    frame_limit: Option<usize>,
    x: usize,
    y: usize,
    frame: usize,
}

impl TestPatternSource {
    pub fn new(timing: VideoTiming, pattern: Pattern) -> Result<Self> {
        timing.validate()?;

        debug!(
            "Test pattern {:?}, {}x{} active, {}x{} total",
            pattern,
            timing.horizontal.active,
            timing.vertical.active,
            timing.horizontal.total(),
            timing.vertical.total()
        );

        Ok(Self {
            timing,
            pattern,
            encoders: [TmdsEncoder::default(); 3],
            latency: DEFAULT_PIPELINE_LATENCY,
            frame_limit: None,
            x: 0,
            y: 0,
            frame: 0,
        })
    }

    pub fn with_latency(mut self, latency: usize) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn timing(&self) -> &VideoTiming {
        &self.timing
    }

    fn finished(&self) -> bool {
        match self.frame_limit {
            Some(0) => true,
            Some(limit) => self.frame >= limit && self.y > self.timing.vertical.sync,
            None => false,
        }
    }

    fn control(&mut self, values: [u8; 3]) -> Tick {
        let [e0, e1, e2] = &mut self.encoders;
        Tick::new([
            e0.encode_control(values[0]),
            e1.encode_control(values[1]),
            e2.encode_control(values[2]),
        ])
    }

    fn character_at(&mut self, x: usize, y: usize) -> Tick {
        let h = self.timing.horizontal;
        let v = self.timing.vertical;

        let mut sync = 0;
        if h.sync_polarity.level(x < h.sync) {
            sync |= HSYNC_BIT;
        }
        if v.sync_polarity.level(y < v.sync) {
            sync |= VSYNC_BIT;
        }

        if !v.is_active(y) {
            return self.control([sync, 0, 0]);
        }

        let active_x = h.active_start();

        if h.is_active(x) {
            let pixel = self.pattern.pixel(x - active_x, y - v.active_start(), h.active, v.active);
            let [e0, e1, e2] = &mut self.encoders;
            return Tick::new([
                e0.encode_data(pixel.b),
                e1.encode_data(pixel.g),
                e2.encode_data(pixel.r),
            ]);
        }

        let guard_band_start = active_x - GUARD_BAND_DOTS;
        let preamble_start = guard_band_start - PREAMBLE_DOTS;

        if (guard_band_start..active_x).contains(&x) {
            Tick::new(VIDEO_GUARD_BAND.map(|c| Character::from_masked(c as u32)))
        } else if (preamble_start..guard_band_start).contains(&x) {
            self.control([sync, VIDEO_PREAMBLE[0], VIDEO_PREAMBLE[1]])
        } else {
            self.control([sync, 0, 0])
        }
    }
}

impl Iterator for TestPatternSource {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        if self.latency > 0 {
            self.latency -= 1;
            return Some(Tick::invalid());
        }

        if self.finished() {
            return None;
        }

        let tick = self.character_at(self.x, self.y);

        self.x += 1;
        if self.x == self.timing.horizontal.total() {
            self.x = 0;
            self.y += 1;
            if self.y == self.timing.vertical.total() {
                self.y = 0;
                self.frame += 1;
            }
        }

        Some(tick)
    }
}
