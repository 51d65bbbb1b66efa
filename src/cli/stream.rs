use anyhow::Result;
use log::Level;
use tmds::process::capture::CaptureReader;
use tmds::process::validate::StreamValidator;
use tmds::structs::frame::Frame;

/// Bytes read from the input per iteration.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Moves capture bytes through the reader and the validator.
pub struct StreamDriver {
    pub reader: CaptureReader,
    pub validator: StreamValidator,
    pub strict: bool,
    pub keep_partial: bool,

    pub invalid_ticks: u64,
    pub skipped_partial: usize,
    pub empty_frames: usize,
}

impl StreamDriver {
    pub fn new(strict: bool, keep_partial: bool) -> Self {
        let mut validator = StreamValidator::default();
        validator.set_fail_level(if strict { Level::Warn } else { Level::Error });

        Self {
            reader: CaptureReader::default(),
            validator,
            strict,
            keep_partial,
            invalid_ticks: 0,
            skipped_partial: 0,
            empty_frames: 0,
        }
    }

    /// Validates every whole word of `chunk` and hands each finished frame
    /// to `on_frame`. Returns `Ok(false)` once `on_frame` asks to stop.
    pub fn process<F>(&mut self, chunk: &[u8], mut on_frame: F) -> Result<bool>
    where
        F: FnMut(Frame) -> Result<bool>,
    {
        self.reader.push_bytes(chunk);

        while let Some(tick) = self.reader.next() {
            let tick = match tick {
                Ok(tick) => tick,
                Err(e) if self.strict => return Err(e.into()),
                Err(_) => continue,
            };

            if !tick.valid {
                self.invalid_ticks += 1;
                continue;
            }

            let [ch0, ch1, ch2] = tick.values();
            let Some(boundary) = self.validator.validate_characters(ch0, ch1, ch2)? else {
                continue;
            };

            if boundary.partial && !self.keep_partial {
                let dropped = self.validator.discard_frame();
                if dropped > 0 {
                    log::info!(
                        "Skipping partial frame {} ({dropped} pixels before the first vertical sync)",
                        boundary.index
                    );
                    self.skipped_partial += 1;
                }
                continue;
            }

            match self.validator.extract_frame(boundary.width, boundary.height)? {
                Some(frame) => {
                    if !on_frame(frame)? {
                        return Ok(false);
                    }
                }
                None => self.empty_frames += 1,
            }
        }

        // Violations are logged and counted in the validator stats.
        self.validator.take_diagnostics();
        Ok(true)
    }

    /// Logs what is left over at end of input.
    pub fn finish(&self) {
        if self.reader.remaining() > 0 {
            log::warn!(
                "{} trailing bytes do not form a whole capture word",
                self.reader.remaining()
            );
        }

        let pending = self.validator.pending_pixels();
        if pending > 0 {
            log::info!(
                "Dropping {pending} pixels of frame {} without a closing vertical sync",
                self.validator.frames() + 1
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmds::process::encode::{Pattern, TestPatternSource, VideoTiming};

    fn capture(frames: usize) -> Vec<u8> {
        TestPatternSource::new(VideoTiming::tiny(), Pattern::ColorBars)
            .unwrap()
            .with_frame_limit(frames)
            .flat_map(|t| t.to_le_bytes())
            .collect()
    }

    #[test]
    fn frames_across_chunks() {
        let data = capture(2);
        let mut driver = StreamDriver::new(false, false);
        let mut frames = Vec::new();

        for chunk in data.chunks(1001) {
            let more = driver
                .process(chunk, |frame| {
                    frames.push(frame);
                    Ok(true)
                })
                .unwrap();
            assert!(more);
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(driver.invalid_ticks, 4);
        assert_eq!(driver.skipped_partial, 0);
        assert_eq!(driver.validator.stats().total(), 0);
        assert!(driver.validator.take_diagnostics().is_empty());
        assert_eq!(driver.reader.remaining(), 0);
    }

    #[test]
    fn stop_requested() {
        let data = capture(3);
        let mut driver = StreamDriver::new(false, false);
        let mut count = 0;

        let more = driver
            .process(&data, |_| {
                count += 1;
                Ok(count < 2)
            })
            .unwrap();

        assert!(!more);
        assert_eq!(count, 2);
    }

    #[test]
    fn partial_first_frame() {
        let data = capture(2);
        let timing = VideoTiming::tiny();
        // Start at the third active line of the first frame.
        let line = timing.vertical.active_start() + 2;
        let tail = &data[(4 + line * timing.horizontal.total()) * 4..];

        let mut count = 0;
        let mut driver = StreamDriver::new(false, false);
        driver
            .process(tail, |_| {
                count += 1;
                Ok(true)
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(driver.skipped_partial, 1);

        let mut driver = StreamDriver::new(false, true);
        let mut frames = Vec::new();
        driver
            .process(tail, |frame| {
                frames.push(frame);
                Ok(true)
            })
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].index, frames[0].height), (1, 6));
        assert_eq!(frames[1].height, 8);
    }

    #[test]
    fn reserved_bit() {
        let data = 0x4000_0000u32.to_le_bytes();

        let mut driver = StreamDriver::new(false, false);
        assert!(driver.process(&data, |_| Ok(true)).unwrap());

        let mut driver = StreamDriver::new(true, false);
        assert!(driver.process(&data, |_| Ok(true)).is_err());
    }
}
