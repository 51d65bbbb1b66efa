#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! TMDS carries video over three channels. Each pixel clock every channel
//! sends one 10-bit character.
//!
//! ### Stream Organization
//!
//! **Control periods**: channel 0 carries HSYNC and VSYNC, channels 1 and 2
//! carry control bits. Eight dots of the video preamble announce a video data
//! period.
//!
//! **Video data periods**: a two dot leading guard band followed by
//! transition-minimized 8-bit pixel components. Channel 0 carries blue,
//! channel 1 green and channel 2 red.
//!
//! ## Quick Start
//!
//! 1. Split capture bytes into ticks using [`process::capture::CaptureReader`]
//! 2. Validate the characters using [`process::validate::StreamValidator`]
//! 3. Take the frame out of the validator at each
//!    [`FrameBoundary`](structs::frame::FrameBoundary)
//!
//! ```rust,no_run
//! use tmds::process::{capture::CaptureReader, validate::StreamValidator};
//!
//! let mut reader = CaptureReader::default();
//! let mut validator = StreamValidator::default();
//!
//! let data = std::fs::read("capture.bin")?;
//! reader.push_bytes(&data);
//!
//! for tick in reader {
//!     let tick = tick?;
//!     if !tick.valid {
//!         continue;
//!     }
//!
//!     let [ch0, ch1, ch2] = tick.values();
//!     if let Some(boundary) = validator.validate_characters(ch0, ch1, ch2)? {
//!         if let Some(frame) = validator.extract_frame(boundary.width, boundary.height)? {
//!             println!("{frame}");
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Stream processing.
///
/// - **Capture** ([`process::capture`]): Capture word framing
/// - **Validation** ([`process::validate`]): Timing checks and frame assembly
/// - **Encoding** ([`process::encode`]): Reference encoder and test patterns
pub mod process;

/// Characters, pixels and frames.
pub mod structs;

/// Error types and the strict mode helper.
pub mod utils;
