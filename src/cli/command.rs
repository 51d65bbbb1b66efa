use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use tmds::process::encode::{DEFAULT_PIPELINE_LATENCY, Pattern, VideoTiming};
use tmds::structs::frame::Pixel;

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{} ({}, built {})\ntmds {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        env!("BUILD_TIMESTAMP"),
        env!("TMDS_VERSION"),
    )
});

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION.as_str(),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for validating and decoding TMDS video character captures",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat timing violations as fatal errors (fail on first violation).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decode a character capture into PPM frames.
    Decode(DecodeArgs),

    /// Print capture timing summary
    Info(InfoArgs),

    /// Write a capture of a generated test pattern.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input capture (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output path prefix for frame files.
    #[arg(long, value_name = "PREFIX")]
    pub output_path: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<usize>,

    /// Also write the frame that started before the first vertical sync.
    #[arg(long)]
    pub keep_partial: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input capture (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = InfoFormat::Text)]
    pub format: InfoFormat,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output capture file (use "-" for stdout).
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Video timing YAML file.
    #[arg(long, value_name = "FILE", conflicts_with = "mode")]
    pub timing: Option<PathBuf>,

    /// Built-in video mode.
    #[arg(long, value_enum, default_value_t = VideoMode::Tiny)]
    pub mode: VideoMode,

    /// Image content.
    #[arg(long, value_enum, default_value_t = PatternKind::ColorBars)]
    pub pattern: PatternKind,

    /// Color of the solid pattern as RRGGBB.
    #[arg(long, value_name = "RRGGBB", value_parser = parse_color, default_value = "808080")]
    pub color: Pixel,

    /// Number of frames.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub frames: usize,

    /// Invalid ticks before the first character.
    #[arg(long, value_name = "TICKS", default_value_t = DEFAULT_PIPELINE_LATENCY)]
    pub latency: usize,
}

impl GenerateArgs {
    pub fn pattern(&self) -> Pattern {
        match self.pattern {
            PatternKind::ColorBars => Pattern::ColorBars,
            PatternKind::Gradient => Pattern::Gradient,
            PatternKind::Solid => Pattern::Solid(self.color),
        }
    }
}

fn parse_color(s: &str) -> Result<Pixel, String> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 {
        return Err(format!("expected six hex digits, got {s:?}"));
    }

    let value = u32::from_str_radix(s, 16).map_err(|e| e.to_string())?;
    Ok(Pixel::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum InfoFormat {
    /// Human-readable summary.
    Text,
    /// YAML document.
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum VideoMode {
    /// 640x480 at 60 Hz.
    Vga,
    /// 16x8, for quick checks.
    Tiny,
}

impl VideoMode {
    pub fn timing(self) -> VideoTiming {
        match self {
            VideoMode::Vga => VideoTiming::vga_640x480(),
            VideoMode::Tiny => VideoTiming::tiny(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum PatternKind {
    /// Eight vertical color bars.
    ColorBars,
    /// Red and green ramps.
    Gradient,
    /// A single color, see --color.
    Solid,
}
