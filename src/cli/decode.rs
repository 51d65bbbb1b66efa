use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tmds::structs::frame::Frame;

use super::command::{Cli, DecodeArgs};
use super::stream::{CHUNK_SIZE, StreamDriver};
use crate::input::InputReader;
use crate::ppm::save_frame;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    macro_rules! pb_update {
        ($pb:expr, $method:ident($($args:expr),*)) => {
            if let Some(ref pb) = $pb {
                pb.$method($($args),*);
            }
        };
    }

    if args.frames == Some(0) {
        return Err(anyhow!("Frame count must be at least 1"));
    }

    log::info!(
        "Decoding capture: {} (strict mode: {})",
        args.input.display(),
        cli.strict
    );

    match &args.output_path {
        Some(prefix) => log::info!("Output path specified: {}", prefix.display()),
        None => log::info!("No output path, frames are only validated"),
    }

    let pb = if let Some(multi) = multi {
        let pb = if let Some(total) = InputReader::size(&args.input) {
            let pb = multi.add(ProgressBar::new(total));
            pb.set_style(ProgressStyle::with_template(
                "{bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
            )?);
            pb
        } else {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template(
                "{spinner:.green} {bytes}\n{msg} | elapsed: {elapsed_precise}",
            )?);
            pb
        };
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("waiting for first frame");
        Some(pb)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel::<Frame>();
    let pb_clone = pb.clone();
    let frame_limit = args.frames;
    let mut driver = StreamDriver::new(cli.strict, args.keep_partial);
    let input_path = args.input.clone();

    let validate_thread = thread::spawn(move || -> Result<StreamDriver> {
        let mut sent = 0usize;
        let mut input_reader = InputReader::new(&input_path)?;

        input_reader.process_chunks(CHUNK_SIZE, |chunk| {
            pb_update!(pb_clone, inc(chunk.len() as u64));

            driver.process(chunk, |frame| {
                if tx.send(frame).is_err() {
                    return Ok(false);
                }
                sent += 1;
                Ok(frame_limit.is_none_or(|limit| sent < limit))
            })
        })?;

        driver.finish();
        Ok(driver)
    });

    let start_time = Instant::now();
    let mut written = 0usize;

    while let Ok(frame) = rx.recv() {
        if !frame.is_complete() {
            log::warn!(
                "{frame} is incomplete ({} of {} pixels)",
                frame.pixel_count(),
                frame.width * frame.height
            );
        }

        if let Some(prefix) = &args.output_path {
            let path = save_frame(prefix, &frame)?;
            log::debug!("Wrote {}", path.display());
        }

        written += 1;
        log::info!("{frame}");

        if let Some(ref pb) = pb {
            let fps = written as f64 / start_time.elapsed().as_secs_f64().max(1e-3);
            pb.set_message(format!("frames: {written} | {fps:.1} frames/s"));
        }
    }

    match validate_thread.join() {
        Ok(Ok(driver)) => {
            pb_update!(pb, finish_with_message(format!("frames: {written}")));

            let validator = &driver.validator;
            log::info!(
                "Processing complete: {} ticks ({} invalid), {written} frames, {} violations",
                validator.ticks(),
                driver.invalid_ticks,
                validator.stats().total()
            );
            if driver.skipped_partial > 0 {
                log::info!("Skipped {} partial frame", driver.skipped_partial);
            }
            if driver.reader.error_count() > 0 {
                log::warn!(
                    "{} capture words rejected",
                    driver.reader.error_count()
                );
            }
        }
        Ok(Err(e)) => {
            pb_update!(pb, finish_with_message("decode failed"));
            return Err(e);
        }
        Err(_) => {
            pb_update!(pb, finish_with_message("validation thread panicked"));
            return Err(anyhow!("Validation thread panicked"));
        }
    }

    Ok(())
}
