//! Utility functions for the CLI.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use unlzw_core::ByteSink;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Reader that advances a progress bar by the bytes read through it.
pub struct ProgressReader<R> {
    inner: R,
    pb: ProgressBar,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, pb: ProgressBar) -> Self {
        Self { inner, pb }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pb.inc(n as u64);
        Ok(n)
    }
}

impl<R: Seek> Seek for ProgressReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Sink that only counts what it is given.
#[derive(Debug, Default)]
pub struct CountingSink {
    pub count: u64,
}

impl ByteSink for CountingSink {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.count += buf.len() as u64;
        Ok(buf.len())
    }
}

/// `foo.Z` becomes `foo`; anything else gets `.out` appended.
pub fn default_output_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == "Z") {
        return input.with_extension("");
    }
    let mut name = input.as_os_str().to_owned();
    name.push(".out");
    PathBuf::from(name)
}
