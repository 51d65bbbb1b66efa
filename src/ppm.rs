use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tmds::structs::frame::Frame;

/// Writes `frame` as a binary (P6) portable pixmap.
pub fn write_ppm<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    write!(writer, "P6\n{} {}\n255\n", frame.width, frame.height)?;
    writer.write_all(&frame.rgb_bytes())?;
    Ok(())
}

/// `PREFIX.frame{index}.ppm` next to the prefix.
pub fn frame_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = prefix.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".frame{index}.ppm"));
    prefix.with_file_name(name)
}

pub fn save_frame(prefix: &Path, frame: &Frame) -> Result<PathBuf> {
    let path = frame_path(prefix, frame.index);

    let mut writer = BufWriter::new(File::create(&path)?);
    write_ppm(&mut writer, frame)?;
    writer.flush()?;

    Ok(path)
}
