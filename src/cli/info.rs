use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use tmds::process::validate::ValidatorStats;

use super::command::{Cli, InfoArgs, InfoFormat};
use super::stream::{CHUNK_SIZE, StreamDriver};
use crate::input::InputReader;

#[derive(Debug, Default, Serialize)]
struct CaptureReport {
    input: String,
    bytes: u64,
    ticks: u64,
    invalid_ticks: u64,
    rejected_words: usize,
    trailing_bytes: usize,
    frames: usize,
    incomplete_frames: usize,
    partial_frames_skipped: usize,
    resolution: Option<Resolution>,
    resolution_changes: usize,
    violations: ValidatorStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
struct Resolution {
    width: usize,
    height: usize,
}

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing capture: {}", args.input.display());

    let mut input_reader = InputReader::new(&args.input)?;
    let mut driver = StreamDriver::new(cli.strict, false);
    let mut report = CaptureReport {
        input: args.input.display().to_string(),
        ..Default::default()
    };

    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Analyzing frames...");
        Some(pb)
    } else {
        None
    };

    input_reader.process_chunks(CHUNK_SIZE, |chunk| {
        report.bytes += chunk.len() as u64;

        driver.process(chunk, |frame| {
            let resolution = Resolution {
                width: frame.width,
                height: frame.height,
            };

            match report.resolution {
                Some(current) if current != resolution => {
                    log::info!(
                        "Resolution changed at frame {}: {}x{} -> {}x{}",
                        frame.index,
                        current.width,
                        current.height,
                        resolution.width,
                        resolution.height
                    );
                    report.resolution_changes += 1;
                }
                _ => {}
            }
            report.resolution = Some(resolution);

            report.frames += 1;
            if !frame.is_complete() {
                report.incomplete_frames += 1;
            }

            if let Some(ref pb) = pb {
                pb.set_message(format!("{} frames", report.frames));
            }

            Ok(true)
        })
    })?;

    driver.finish();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    report.ticks = driver.validator.ticks();
    report.invalid_ticks = driver.invalid_ticks;
    report.rejected_words = driver.reader.error_count();
    report.trailing_bytes = driver.reader.remaining();
    report.partial_frames_skipped = driver.skipped_partial;
    report.violations = *driver.validator.stats();

    match args.format {
        InfoFormat::Text => print_report(&report),
        InfoFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
    }

    Ok(())
}

fn print_report(report: &CaptureReport) {
    println!();
    println!("Capture Information");
    println!("===================");
    println!();
    println!("  Input                     {}", report.input);
    println!("  Size                      {} bytes", report.bytes);
    println!("  Valid ticks               {}", report.ticks);
    println!("  Invalid ticks             {}", report.invalid_ticks);
    if report.rejected_words > 0 {
        println!("  Rejected words            {}", report.rejected_words);
    }
    if report.trailing_bytes > 0 {
        println!("  Trailing bytes            {}", report.trailing_bytes);
    }
    println!();

    println!("Video");
    println!("  Frames                    {}", report.frames);
    if report.incomplete_frames > 0 {
        println!("  Incomplete frames         {}", report.incomplete_frames);
    }
    if report.partial_frames_skipped > 0 {
        println!("  Partial frames skipped    {}", report.partial_frames_skipped);
    }
    match report.resolution {
        Some(r) => println!("  Resolution                {}x{}", r.width, r.height),
        None => println!("  Resolution                unknown"),
    }
    if report.resolution_changes > 0 {
        println!("  Resolution changes        {}", report.resolution_changes);
    }
    println!();

    let v = &report.violations;
    println!("Timing Violations");
    if v.total() == 0 {
        println!("  None");
    } else {
        for (name, count) in [
            ("Preamble spacing", v.preamble_spacing),
            ("Preamble too long", v.preamble_too_long),
            ("Preamble length", v.preamble_incorrect_length),
            ("Guard band too long", v.guard_band_too_long),
            ("Guard band length", v.guard_band_incorrect_length),
            ("Frame size mismatch", v.frame_size_mismatch),
        ] {
            if count > 0 {
                println!("  {name:<26}{count}");
            }
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_report() {
        let report = CaptureReport {
            input: "capture.bin".to_string(),
            frames: 2,
            resolution: Some(Resolution {
                width: 16,
                height: 8,
            }),
            ..Default::default()
        };

        let yaml = serde_yaml_ng::to_string(&report).unwrap();
        assert!(yaml.contains("input: capture.bin\n"));
        assert!(yaml.contains("frames: 2\n"));
        assert!(yaml.contains("  width: 16\n"));
        assert!(yaml.contains("  preamble_spacing: 0\n"));
    }
}
