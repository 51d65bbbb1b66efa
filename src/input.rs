use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Capture input from a file or from stdin ("-").
pub struct InputReader {
    reader: Box<dyn Read>,
}

impl InputReader {
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();

        if is_pipe(path) {
            return Ok(Self {
                reader: Box::new(io::stdin().lock()),
            });
        }

        let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;

        Ok(Self {
            reader: Box::new(BufReader::new(file)),
        })
    }

    /// Input size in bytes, `None` for pipes.
    pub fn size<P: AsRef<Path>>(input_path: P) -> Option<u64> {
        let path = input_path.as_ref();
        if is_pipe(path) {
            return None;
        }
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    /// Feeds the input to `callback` in chunks of at most `chunk_size` bytes
    /// until EOF or until the callback returns `Ok(false)`.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let bytes_read = match self.reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if !callback(&buffer[..bytes_read])? {
                break;
            }
        }

        Ok(())
    }
}

fn is_pipe(path: &Path) -> bool {
    path.as_os_str() == "-"
}
