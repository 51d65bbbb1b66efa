use anyhow::{Result, anyhow, bail};
use log::Level::Warn;
use log::{debug, info, trace};
use serde::Serialize;

use crate::log_or_err;
use crate::structs::character::{
    Character, HSYNC_BIT, VIDEO_GUARD_BAND, VSYNC_BIT, decode_data, is_video_guard_band,
    is_video_preamble, try_decode_as_control,
};
use crate::structs::frame::{Frame, FrameBoundary, Pixel};
use crate::utils::errors::{SyncError, Violation};

/// Control dots required ahead of a preamble.
pub const MIN_PREAMBLE_SPACING: usize = 4;

/// Length of a video preamble in dots.
pub const PREAMBLE_DOTS: usize = 8;

/// Length of a video guard band in dots.
pub const GUARD_BAND_DOTS: usize = 2;

/// Position of the validator within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Control period. `preamble` holds the preamble dot count once a video
    /// preamble has started.
    Control {
        dots: usize,
        preamble: Option<usize>,
    },
    /// Leading video guard band.
    GuardBand { dots: usize },
    /// Active video. `trailing_guard_band` counts guard band characters seen
    /// after pixel data which are not yet known to be a trailing guard band.
    ///
    /// Unlike the leading guard band, this run is not checked dot by dot:
    /// it may still turn out to be pixel data. Its length is checked once,
    /// when a control character ends it, and reported as
    /// `GuardBandIncorrectLength` unless it is 0 or 2 dots.
    VideoData { trailing_guard_band: usize },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Control {
            dots: 0,
            preamble: None,
        }
    }
}

/// A timing violation with the stream position it was detected at.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("tick {tick}, frame {frame}, line {line}: {violation}")]
pub struct Diagnostic {
    pub tick: u64,
    pub frame: usize,
    pub line: usize,
    pub violation: Violation,
}

/// Violation counts by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatorStats {
    pub preamble_spacing: usize,
    pub preamble_too_long: usize,
    pub preamble_incorrect_length: usize,
    pub guard_band_too_long: usize,
    pub guard_band_incorrect_length: usize,
    pub frame_size_mismatch: usize,
}

impl ValidatorStats {
    fn record(&mut self, violation: &Violation) {
        let counter = match violation {
            Violation::PreambleSpacing { .. } => &mut self.preamble_spacing,
            Violation::PreambleTooLong { .. } => &mut self.preamble_too_long,
            Violation::PreambleIncorrectLength { .. } => &mut self.preamble_incorrect_length,
            Violation::GuardBandTooLong { .. } => &mut self.guard_band_too_long,
            Violation::GuardBandIncorrectLength { .. } => &mut self.guard_band_incorrect_length,
            Violation::FrameSizeMismatch { .. } => &mut self.frame_size_mismatch,
        };
        *counter += 1;
    }

    pub fn total(&self) -> usize {
        self.preamble_spacing
            + self.preamble_too_long
            + self.preamble_incorrect_length
            + self.guard_band_too_long
            + self.guard_band_incorrect_length
            + self.frame_size_mismatch
    }
}

/// Classifies character triples and rebuilds frames from them.
///
/// Feed one triple per valid pixel clock to
/// [`validate_characters`](Self::validate_characters). A vertical sync rising
/// edge closes the current frame and returns its [`FrameBoundary`]; hand the
/// boundary geometry to [`extract_frame`](Self::extract_frame) to take the
/// pixels out before the next line starts.
///
/// Channel misalignment and video data outside a video data period are
/// returned as [`SyncError`]s. Timing violations are collected as
/// [`Diagnostic`]s and logged, or returned as errors once the fail level is
/// lowered to `Warn`.
///
/// # Example
///
/// ```rust
/// use tmds::process::encode::{Pattern, TestPatternSource, VideoTiming};
/// use tmds::process::validate::StreamValidator;
///
/// let source = TestPatternSource::new(VideoTiming::tiny(), Pattern::ColorBars)?;
/// let mut validator = StreamValidator::default();
/// let mut frames = Vec::new();
///
/// for tick in source.filter(|t| t.valid).take(20_000) {
///     let [ch0, ch1, ch2] = tick.values();
///     if let Some(boundary) = validator.validate_characters(ch0, ch1, ch2)? {
///         if let Some(frame) = validator.extract_frame(boundary.width, boundary.height)? {
///             if !boundary.partial {
///                 frames.push(frame);
///             }
///         }
///     }
/// }
///
/// assert!(!frames.is_empty());
/// assert!(validator.take_diagnostics().is_empty());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct StreamValidator {
    phase: Phase,

    previous_hsync: bool,
    previous_vsync: bool,
    seen_vsync: bool,

    frames: usize,
    ticks: u64,

    active_dots: usize,
    previous_active_dots: usize,
    active_lines: usize,

    buffer: Vec<Pixel>,
    diagnostics: Vec<Diagnostic>,
    stats: ValidatorStats,

    pub fail_level: log::Level,
}

impl Default for StreamValidator {
    fn default() -> Self {
        Self {
            phase: Phase::default(),

            previous_hsync: false,
            previous_vsync: false,
            seen_vsync: false,

            frames: 0,
            ticks: 0,

            active_dots: 0,
            previous_active_dots: 0,
            active_lines: 0,

            buffer: Vec::new(),
            diagnostics: Vec::new(),
            stats: ValidatorStats::default(),

            fail_level: log::Level::Error,
        }
    }
}

impl StreamValidator {
    /// Sets the failure level for timing violations.
    ///
    /// - `log::Level::Error`: violations are logged and collected (default)
    /// - `log::Level::Warn`: the first violation is returned as an error
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    /// Consumes the characters of one pixel clock.
    pub fn validate_characters(
        &mut self,
        ch0: u16,
        ch1: u16,
        ch2: u16,
    ) -> Result<Option<FrameBoundary>> {
        self.ticks += 1;

        let mut chars = [Character::default(); 3];
        for (channel, (slot, value)) in chars.iter_mut().zip([ch0, ch1, ch2]).enumerate() {
            *slot = Character::new(value)
                .map_err(|_| SyncError::CharacterOutOfRange { channel, value })?;
        }

        match chars.map(try_decode_as_control) {
            [Some(sync), Some(_), Some(_)] => self.control(chars, sync),
            [None, None, None] => {
                let [c0, c1, c2] = chars;
                if is_video_guard_band(c0, c1, c2) {
                    self.guard_band()?;
                } else {
                    self.video_data(chars)?;
                }
                Ok(None)
            }
            [c0, c1, c2] => bail!(SyncError::ChannelMisaligned {
                tick: self.ticks,
                ch0: c0.is_some(),
                ch1: c1.is_some(),
                ch2: c2.is_some(),
            }),
        }
    }

    /// Takes the accumulated pixels as a frame of the given geometry.
    ///
    /// Returns `None` when no pixel data was collected. A pixel count other
    /// than `expected_width * expected_height` is reported as a violation and
    /// the frame is returned incomplete.
    pub fn extract_frame(
        &mut self,
        expected_width: usize,
        expected_height: usize,
    ) -> Result<Option<Frame>> {
        if self.buffer.is_empty() {
            info!("No pixel data for frame {}", self.frames);
            return Ok(None);
        }

        let capacity = self.buffer.len();
        let frame = Frame {
            index: self.frames,
            width: expected_width,
            height: expected_height,
            pixels: std::mem::replace(&mut self.buffer, Vec::with_capacity(capacity)),
        };

        if !frame.is_complete() {
            self.report(Violation::FrameSizeMismatch {
                frame: frame.index,
                pixels: frame.pixel_count(),
                width: expected_width,
                height: expected_height,
                expected: expected_width
                    .checked_mul(expected_height)
                    .unwrap_or(usize::MAX),
            })?;
        }

        debug!("{frame}");
        Ok(Some(frame))
    }

    /// Drops the accumulated pixels, returning how many were dropped.
    pub fn discard_frame(&mut self) -> usize {
        let count = self.buffer.len();
        self.buffer.clear();
        count
    }

    /// Drains the violations collected so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn stats(&self) -> &ValidatorStats {
        &self.stats
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn active_lines(&self) -> usize {
        self.active_lines
    }

    pub fn active_dots(&self) -> usize {
        self.active_dots
    }

    /// Width of the last line that carried pixel data.
    pub fn declared_width(&self) -> usize {
        self.previous_active_dots
    }

    pub fn pending_pixels(&self) -> usize {
        self.buffer.len()
    }

    pub fn in_control_period(&self) -> bool {
        matches!(self.phase, Phase::Control { .. })
    }

    pub fn in_preamble(&self) -> bool {
        matches!(
            self.phase,
            Phase::Control {
                preamble: Some(_),
                ..
            }
        )
    }

    pub fn in_guard_band(&self) -> bool {
        matches!(self.phase, Phase::GuardBand { .. })
    }

    pub fn in_video_data_period(&self) -> bool {
        matches!(self.phase, Phase::GuardBand { .. } | Phase::VideoData { .. })
    }

    fn control(&mut self, chars: [Character; 3], sync: u8) -> Result<Option<FrameBoundary>> {
        let mut violations = Vec::new();

        let (mut dots, mut preamble) = match self.phase {
            Phase::Control { dots, preamble } => (dots, preamble),
            Phase::GuardBand { dots } | Phase::VideoData {
                trailing_guard_band: dots,
            } => {
                if dots != 0 && dots != GUARD_BAND_DOTS {
                    violations.push(Violation::GuardBandIncorrectLength { dots });
                }
                (0, None)
            }
        };

        dots += 1;

        let [c0, c1, c2] = chars;
        if is_video_preamble(c0, c1, c2) {
            preamble = match preamble {
                None => {
                    let control_dots = dots - 1;
                    if control_dots < MIN_PREAMBLE_SPACING {
                        violations.push(Violation::PreambleSpacing { control_dots });
                    }
                    Some(1)
                }
                Some(preamble_dots) => {
                    let preamble_dots = preamble_dots + 1;
                    if preamble_dots > PREAMBLE_DOTS {
                        violations.push(Violation::PreambleTooLong {
                            dots: preamble_dots,
                        });
                    }
                    Some(preamble_dots)
                }
            };
        }

        self.phase = Phase::Control { dots, preamble };

        let hsync = sync & HSYNC_BIT != 0;
        let vsync = sync & VSYNC_BIT != 0;
        let mut boundary = None;

        if !self.previous_hsync && hsync {
            if self.previous_active_dots == 0 || self.active_dots != 0 {
                self.previous_active_dots = self.active_dots;
            }

            // VSYNC is sampled on HSYNC rising edges only.
            if !self.previous_vsync && vsync {
                boundary = Some(self.close_frame());
            }

            self.previous_vsync = vsync;
            self.active_dots = 0;
        }

        self.previous_hsync = hsync;

        for violation in violations {
            self.report(violation)?;
        }

        Ok(boundary)
    }

    fn close_frame(&mut self) -> FrameBoundary {
        self.frames += 1;

        let boundary = FrameBoundary {
            index: self.frames,
            width: self.previous_active_dots,
            height: self.active_lines,
            partial: !self.seen_vsync,
        };

        trace!(
            "VSYNC rising edge at tick {}, closing frame {} ({}x{}, {} pixels)",
            self.ticks,
            boundary.index,
            boundary.width,
            boundary.height,
            self.buffer.len()
        );

        self.seen_vsync = true;
        self.active_lines = 0;
        boundary
    }

    fn guard_band(&mut self) -> Result<()> {
        match self.phase {
            Phase::Control { dots, preamble } => {
                let preamble_dots = preamble.unwrap_or(0);

                if dots <= preamble_dots {
                    bail!(SyncError::GuardBandWithoutControlPeriod {
                        tick: self.ticks,
                        control_dots: dots,
                        preamble_dots,
                    });
                }

                self.phase = Phase::GuardBand { dots: 1 };
                self.active_lines += 1;

                if preamble_dots != PREAMBLE_DOTS {
                    self.report(Violation::PreambleIncorrectLength {
                        dots: preamble_dots,
                    })?;
                }
            }
            Phase::GuardBand { dots } => {
                let dots = dots + 1;
                self.phase = Phase::GuardBand { dots };

                if dots > GUARD_BAND_DOTS {
                    self.report(Violation::GuardBandTooLong { dots })?;
                }
            }
            Phase::VideoData {
                trailing_guard_band,
            } => {
                self.phase = Phase::VideoData {
                    trailing_guard_band: trailing_guard_band + 1,
                };
            }
        }

        Ok(())
    }

    fn video_data(&mut self, chars: [Character; 3]) -> Result<()> {
        let mut violation = None;

        match self.phase {
            Phase::Control { .. } => {
                bail!(SyncError::DataOutsideVideoPeriod { tick: self.ticks });
            }
            Phase::GuardBand { dots } => {
                if self.active_dots != 0 {
                    bail!(SyncError::ActiveDotsBeforeGuardBandEnd {
                        tick: self.ticks,
                        active_dots: self.active_dots,
                    });
                }

                if dots != GUARD_BAND_DOTS {
                    violation = Some(Violation::GuardBandIncorrectLength { dots });
                }
            }
            Phase::VideoData {
                trailing_guard_band,
            } => {
                // Pixel data that happened to match the guard band pattern.
                let guard_band = VIDEO_GUARD_BAND.map(|v| Character::from_masked(v as u32));
                for _ in 0..trailing_guard_band {
                    self.push_pixel(guard_band);
                }
            }
        }

        self.phase = Phase::VideoData {
            trailing_guard_band: 0,
        };
        self.push_pixel(chars);

        if let Some(violation) = violation {
            self.report(violation)?;
        }

        Ok(())
    }

    fn push_pixel(&mut self, [ch0, ch1, ch2]: [Character; 3]) {
        self.active_dots += 1;
        self.buffer.push(Pixel {
            r: decode_data(ch2),
            g: decode_data(ch1),
            b: decode_data(ch0),
        });
    }

    fn report(&mut self, violation: Violation) -> Result<()> {
        let diagnostic = Diagnostic {
            tick: self.ticks,
            frame: self.frames,
            line: self.active_lines,
            violation,
        };

        self.stats.record(&violation);
        self.diagnostics.push(diagnostic);

        log_or_err!(self, Warn, anyhow!(diagnostic));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::character::CONTROL_CODES;

    const DATA: u16 = 0b0100000000;

    fn ctl(value: u8) -> u16 {
        CONTROL_CODES[value as usize].0
    }

    fn control(sync: u8) -> [u16; 3] {
        [ctl(sync), ctl(0b00), ctl(0b00)]
    }

    fn preamble(sync: u8) -> [u16; 3] {
        [ctl(sync), ctl(0b01), ctl(0b00)]
    }

    fn data(value: u16) -> [u16; 3] {
        [value, value, value]
    }

    struct Stream(Vec<[u16; 3]>);

    impl Stream {
        fn new() -> Self {
            Self(Vec::new())
        }

        fn push(mut self, triple: [u16; 3], count: usize) -> Self {
            self.0.extend(std::iter::repeat_n(triple, count));
            self
        }

        /// HSYNC rising edge, then a full line layout ahead of `pixels` data dots.
        fn line(self, pixels: usize, vsync: bool) -> Self {
            let v = if vsync { VSYNC_BIT } else { 0 };
            self.push(control(v | HSYNC_BIT), 2)
                .push(control(v), 2)
                .push(preamble(v), PREAMBLE_DOTS)
                .push(VIDEO_GUARD_BAND, GUARD_BAND_DOTS)
                .push(data(DATA), pixels)
        }

        fn feed(self, validator: &mut StreamValidator) -> Vec<FrameBoundary> {
            self.0
                .into_iter()
                .filter_map(|[a, b, c]| validator.validate_characters(a, b, c).unwrap())
                .collect()
        }
    }

    fn violations(validator: &mut StreamValidator) -> Vec<Violation> {
        validator
            .take_diagnostics()
            .into_iter()
            .map(|d| d.violation)
            .collect()
    }

    #[test]
    fn well_formed_line_has_no_violations() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 16)
            .push(VIDEO_GUARD_BAND, 2)
            .push(control(0), 3)
            .push(control(HSYNC_BIT), 1)
            .feed(&mut validator);

        assert_eq!(violations(&mut validator), vec![]);
        assert_eq!(validator.pending_pixels(), 16);
        assert_eq!(validator.declared_width(), 16);
        assert_eq!(validator.active_dots(), 0);
        assert_eq!(validator.active_lines(), 1);
        assert!(validator.in_control_period());
    }

    #[test]
    fn short_preamble_is_reported_once() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 6)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 4)
            .push(control(0), 4)
            .feed(&mut validator);

        assert_eq!(
            violations(&mut validator),
            vec![Violation::PreambleIncorrectLength { dots: 6 }]
        );
        assert_eq!(validator.stats().preamble_incorrect_length, 1);
        assert_eq!(validator.stats().total(), 1);
    }

    #[test]
    fn long_preamble_and_guard_band() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 9)
            .push(VIDEO_GUARD_BAND, 3)
            .push(data(DATA), 1)
            .feed(&mut validator);

        assert_eq!(
            violations(&mut validator),
            vec![
                Violation::PreambleTooLong { dots: 9 },
                Violation::PreambleIncorrectLength { dots: 9 },
                Violation::GuardBandTooLong { dots: 3 },
                Violation::GuardBandIncorrectLength { dots: 3 },
            ]
        );
    }

    #[test]
    fn preamble_spacing() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 2)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 1)
            .feed(&mut validator);

        assert_eq!(
            violations(&mut validator),
            vec![Violation::PreambleSpacing { control_dots: 2 }]
        );
    }

    #[test]
    fn preamble_tracking() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 3)
            .feed(&mut validator);

        assert!(validator.in_preamble());
        assert!(validator.in_control_period());
        assert_eq!(
            validator.phase(),
            Phase::Control {
                dots: 7,
                preamble: Some(3)
            }
        );

        Stream::new()
            .push(VIDEO_GUARD_BAND, 1)
            .feed(&mut validator);

        assert!(!validator.in_preamble());
        assert!(validator.in_guard_band());
        assert!(validator.in_video_data_period());
    }

    #[test]
    fn vsync_edges_count_frames() {
        let mut validator = StreamValidator::default();

        let boundaries = Stream::new()
            .push(control(0), 1)
            .line(0, true)
            .line(5, false)
            .line(5, false)
            .push(control(0), 1)
            .line(5, true)
            .line(5, false)
            .push(control(0), 1)
            .line(0, true)
            .feed(&mut validator);

        assert_eq!(validator.frames(), 3);
        assert_eq!(boundaries.len(), 3);
        assert!(boundaries[0].partial);
        assert!(!boundaries[1].partial);

        // The line opened by the first edge has a guard band but no pixels.
        assert_eq!(
            boundaries[1],
            FrameBoundary {
                index: 2,
                width: 5,
                height: 3,
                partial: false
            }
        );
        assert_eq!(boundaries[2].height, 2);
        assert_eq!(validator.active_lines(), 1);
    }

    #[test]
    fn two_vsync_edges_reset_line_counter() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(VSYNC_BIT | HSYNC_BIT), 1)
            .feed(&mut validator);
        assert_eq!(validator.frames(), 1);
        assert_eq!(validator.active_lines(), 0);

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 3)
            .push(control(0), 2)
            .push(control(HSYNC_BIT), 1)
            .push(control(0), 1)
            .feed(&mut validator);
        assert_eq!(validator.active_lines(), 1);

        Stream::new()
            .push(control(VSYNC_BIT | HSYNC_BIT), 1)
            .feed(&mut validator);
        assert_eq!(validator.frames(), 2);
        assert_eq!(validator.active_lines(), 0);
    }

    #[test]
    fn vsync_without_hsync_edge_is_ignored() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(HSYNC_BIT), 2)
            .push(control(HSYNC_BIT | VSYNC_BIT), 2)
            .feed(&mut validator);

        assert_eq!(validator.frames(), 0);
    }

    #[test]
    fn declared_width_keeps_last_active_line() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 1)
            .line(7, false)
            .push(control(0), 1)
            .push(control(HSYNC_BIT), 1)
            .push(control(0), 1)
            .push(control(HSYNC_BIT), 1)
            .feed(&mut validator);

        assert_eq!(validator.declared_width(), 7);
    }

    #[test]
    fn extract_empty_frame() {
        let mut validator = StreamValidator::default();

        assert_eq!(validator.extract_frame(640, 480).unwrap(), None);
        assert!(validator.take_diagnostics().is_empty());
    }

    #[test]
    fn extract_frame_checks_size() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 1)
            .line(4, false)
            .line(4, false)
            .feed(&mut validator);

        let frame = validator.extract_frame(4, 2).unwrap().unwrap();
        assert!(frame.is_complete());
        assert_eq!(frame.pixels[0], Pixel::new(0, 0, 0));
        assert_eq!(validator.pending_pixels(), 0);
        assert!(validator.take_diagnostics().is_empty());

        Stream::new().line(3, false).feed(&mut validator);

        let frame = validator.extract_frame(4, 2).unwrap().unwrap();
        assert!(!frame.is_complete());
        assert_eq!(
            violations(&mut validator),
            vec![Violation::FrameSizeMismatch {
                frame: 0,
                pixels: 3,
                width: 4,
                height: 2,
                expected: 8
            }]
        );
    }

    #[test]
    fn extract_frame_overflowing_geometry() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 1)
            .feed(&mut validator);

        let frame = validator.extract_frame(usize::MAX, 2).unwrap().unwrap();
        assert!(!frame.is_complete());
        assert_eq!(
            violations(&mut validator),
            vec![Violation::FrameSizeMismatch {
                frame: 0,
                pixels: 1,
                width: usize::MAX,
                height: 2,
                expected: usize::MAX
            }]
        );
    }

    #[test]
    fn pixel_channel_mapping() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push([0b0000000000, 0b0100110011, 0b1111111111], 1)
            .feed(&mut validator);

        let frame = validator.extract_frame(1, 1).unwrap().unwrap();
        assert_eq!(frame.pixels, vec![Pixel::new(0x00, 0x55, 0xFE)]);
    }

    #[test]
    fn guard_band_inside_active_video_is_pixel_data() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 1)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 1)
            .feed(&mut validator);

        assert_eq!(validator.active_dots(), 4);
        let frame = validator.extract_frame(4, 1).unwrap().unwrap();
        assert_eq!(frame.pixels[1], Pixel::new(0xAB, 0x55, 0xAB));
        assert!(validator.take_diagnostics().is_empty());
    }

    #[test]
    fn short_trailing_guard_band() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 2)
            .push(VIDEO_GUARD_BAND, 1)
            .push(control(0), 1)
            .feed(&mut validator);

        assert_eq!(
            violations(&mut validator),
            vec![Violation::GuardBandIncorrectLength { dots: 1 }]
        );
        assert_eq!(validator.pending_pixels(), 2);
    }

    #[test]
    fn long_trailing_guard_band_is_reported_once() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 2)
            .push(VIDEO_GUARD_BAND, 3)
            .feed(&mut validator);

        assert!(validator.take_diagnostics().is_empty());

        Stream::new().push(control(0), 1).feed(&mut validator);

        assert_eq!(
            violations(&mut validator),
            vec![Violation::GuardBandIncorrectLength { dots: 3 }]
        );
        assert_eq!(validator.pending_pixels(), 2);
    }

    #[test]
    fn second_line_without_hsync_edge_is_fatal() {
        let mut validator = StreamValidator::default();

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .push(data(DATA), 4)
            .push(control(0), 4)
            .push(preamble(0), 8)
            .push(VIDEO_GUARD_BAND, 2)
            .feed(&mut validator);

        let err = validator.validate_characters(DATA, DATA, DATA).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SyncError>(),
            Some(&SyncError::ActiveDotsBeforeGuardBandEnd {
                tick: 33,
                active_dots: 4
            })
        );
    }

    #[test]
    fn misaligned_channels_are_fatal() {
        let mut validator = StreamValidator::default();

        let err = validator
            .validate_characters(ctl(0), DATA, ctl(0))
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<SyncError>(),
            Some(&SyncError::ChannelMisaligned {
                tick: 1,
                ch0: true,
                ch1: false,
                ch2: true
            })
        );
    }

    #[test]
    fn data_outside_video_period_is_fatal() {
        let mut validator = StreamValidator::default();

        Stream::new().push(control(0), 4).feed(&mut validator);

        let err = validator.validate_characters(DATA, DATA, DATA).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::DataOutsideVideoPeriod { tick: 5 })
        ));
    }

    #[test]
    fn guard_band_without_control_period_is_fatal() {
        let mut validator = StreamValidator::default();
        let [a, b, c] = VIDEO_GUARD_BAND;

        let err = validator.validate_characters(a, b, c).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::GuardBandWithoutControlPeriod { .. })
        ));
    }

    #[test]
    fn out_of_range_character_is_fatal() {
        let mut validator = StreamValidator::default();

        let err = validator
            .validate_characters(ctl(0), 0x400, ctl(0))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<SyncError>(),
            Some(&SyncError::CharacterOutOfRange {
                channel: 1,
                value: 0x400
            })
        );
    }

    #[test]
    fn strict_mode_fails_on_violation() {
        let mut validator = StreamValidator::default();
        validator.set_fail_level(log::Level::Warn);

        Stream::new()
            .push(control(0), 4)
            .push(preamble(0), 7)
            .feed(&mut validator);

        let [a, b, c] = VIDEO_GUARD_BAND;
        let err = validator.validate_characters(a, b, c).unwrap_err();
        let diagnostic = err.downcast_ref::<Diagnostic>().unwrap();

        assert_eq!(
            diagnostic.violation,
            Violation::PreambleIncorrectLength { dots: 7 }
        );
        assert_eq!(diagnostic.tick, 12);
    }
}
