use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tmds::process::encode::{TestPatternSource, VideoTiming};

use super::command::{Cli, GenerateArgs};

pub fn cmd_generate(args: &GenerateArgs, _cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.frames == 0 {
        return Err(anyhow!("Frame count must be at least 1"));
    }

    let timing = match &args.timing {
        Some(path) => {
            let yaml = fs::read_to_string(path)
                .with_context(|| format!("Cannot read timing file {}", path.display()))?;
            VideoTiming::from_yaml(&yaml)
                .with_context(|| format!("Invalid timing file {}", path.display()))?
        }
        None => args.mode.timing(),
    };

    let pattern = args.pattern();
    log::info!(
        "Generating {} frames of {:?} at {}x{} ({} dots per frame)",
        args.frames,
        pattern,
        timing.horizontal.active,
        timing.vertical.active,
        timing.dots_per_frame()
    );

    let source = TestPatternSource::new(timing, pattern)?
        .with_latency(args.latency)
        .with_frame_limit(args.frames);

    let mut writer: Box<dyn Write> = if args.output.as_os_str() == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        Box::new(BufWriter::new(File::create(&args.output).with_context(
            || format!("Cannot create {}", args.output.display()),
        )?))
    };

    let total = (args.frames * timing.dots_per_frame()) as u64;
    let pb = if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} ticks ({percent}%)\n{msg} | elapsed: {elapsed_precise}",
        )?);
        Some(pb)
    } else {
        None
    };

    let mut ticks = 0u64;
    for tick in source {
        writer.write_all(&tick.to_le_bytes())?;
        ticks += 1;

        if ticks % 65536 == 0 {
            if let Some(ref pb) = pb {
                pb.set_position(ticks.min(total));
            }
        }
    }
    writer.flush()?;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("{ticks} ticks"));
    }

    log::info!(
        "Wrote {ticks} ticks ({} bytes) to {}",
        ticks * 4,
        args.output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Commands;
    use clap::Parser as ClapParser;

    #[test]
    fn zero_frames_is_rejected() {
        let output = std::env::temp_dir().join("tmdsd-zero-frames.bin");
        let _ = fs::remove_file(&output);

        let path = output.to_string_lossy().into_owned();

        let cli = Cli::try_parse_from(["tmdsd", "generate", &path, "--frames", "0"]).unwrap();
        let Commands::Generate(ref args) = cli.command else {
            panic!("expected generate");
        };

        assert!(cmd_generate(args, &cli, None).is_err());
        assert!(!output.exists());
    }
}
