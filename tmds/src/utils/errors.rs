#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterError {
    #[error("Character must be a 10-bit value. Read {0:#05X}")]
    OutOfRange(u16),
}

/// Unrecoverable loss of synchronization between the channels or with the
/// line structure. Processing cannot continue after one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Character out of range on channel {channel}: {value:#05X} is not a 10-bit value")]
    CharacterOutOfRange { channel: usize, value: u16 },

    #[error(
        "Channels are not aligned at tick {tick}: control decode ch0={ch0}, ch1={ch1}, ch2={ch2}"
    )]
    ChannelMisaligned {
        tick: u64,
        ch0: bool,
        ch1: bool,
        ch2: bool,
    },

    #[error("Video data at tick {tick} outside of a video data period")]
    DataOutsideVideoPeriod { tick: u64 },

    #[error(
        "Guard band at tick {tick} without a preceding control period ({control_dots} control dots, {preamble_dots} preamble dots)"
    )]
    GuardBandWithoutControlPeriod {
        tick: u64,
        control_dots: usize,
        preamble_dots: usize,
    },

    #[error("Guard band ended at tick {tick} with {active_dots} active dots already on the line")]
    ActiveDotsBeforeGuardBandEnd { tick: u64, active_dots: usize },
}

/// Noncompliant but still parseable stream timing.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    #[error("Preamble spacing violation. Current control period {control_dots} dots")]
    PreambleSpacing { control_dots: usize },

    #[error("Preamble too long, {dots} dots")]
    PreambleTooLong { dots: usize },

    #[error("Preamble incorrect length, {dots} dots (expected 8)")]
    PreambleIncorrectLength { dots: usize },

    #[error("Video guard band too long, {dots} dots")]
    GuardBandTooLong { dots: usize },

    #[error("Video guard band incorrect length, {dots} dots (expected 2)")]
    GuardBandIncorrectLength { dots: usize },

    #[error("Frame {frame} has {pixels} pixels, expected {width}x{height} = {expected}")]
    FrameSizeMismatch {
        frame: usize,
        pixels: usize,
        width: usize,
        height: usize,
        expected: usize,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    #[error("{axis} active region must not be empty")]
    EmptyActive { axis: &'static str },

    #[error("{axis} sync width must not be zero")]
    EmptySync { axis: &'static str },

    #[error(
        "Horizontal blanking of {blanking} dots cannot hold {required} control, preamble and guard band dots"
    )]
    BlankingTooShort { blanking: usize, required: usize },

    #[error("Horizontal back porch of {back_porch} dots cannot hold {required} preamble and guard band dots")]
    BackPorchTooShort { back_porch: usize, required: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("Reserved bit set in capture word {index}: {word:#010X}")]
    ReservedBitSet { index: u64, word: u32 },
}
