//! Buffered, length-capped delivery of decompressed bytes.
//!
//! Decoders write through an [`OutputSink`], which stages small writes in a
//! fixed buffer and forwards them to a caller-supplied [`ByteSink`]. When the
//! caller knows how long the output should be, bytes past that length are
//! dropped without complaint: compressed streams routinely decode a little
//! further than the container says they should.

use crate::error::{LzwError, Result};
use std::io::{self, Write};

/// Size of the staging buffer in bytes.
pub const STAGING_SIZE: usize = 1024;

/// Destination for decompressed bytes.
pub trait ByteSink {
    /// Accept a chunk of bytes, returning how many were taken.
    ///
    /// Anything less than `buf.len()` ends the decode session with a sink
    /// error; partial writes are never retried.
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push any bytes buffered inside the sink to their destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSink for Vec<u8> {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write_chunk(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Adapter that lets any [`Write`] implementation act as a [`ByteSink`].
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the adapter and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Staging writer in front of a [`ByteSink`], with an optional length cap.
#[derive(Debug)]
pub struct OutputSink<S: ByteSink> {
    sink: S,
    staging: Box<[u8; STAGING_SIZE]>,
    staged: usize,
    /// Bytes already handed to `sink`.
    written: u64,
    limit: Option<u64>,
}

impl<S: ByteSink> OutputSink<S> {
    /// Create an output sink. `limit` caps the total number of bytes that
    /// will ever reach `sink`.
    pub fn new(sink: S, limit: Option<u64>) -> Self {
        Self {
            sink,
            staging: Box::new([0u8; STAGING_SIZE]),
            staged: 0,
            written: 0,
            limit,
        }
    }

    /// Queue bytes for output, truncating at the limit.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let buf = match self.limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.len());
                let take = usize::try_from(room).map_or(buf.len(), |room| room.min(buf.len()));
                &buf[..take]
            }
            None => buf,
        };
        if buf.is_empty() {
            return Ok(());
        }

        if self.staged + buf.len() <= STAGING_SIZE {
            self.staging[self.staged..self.staged + buf.len()].copy_from_slice(buf);
            self.staged += buf.len();
            return Ok(());
        }

        self.flush_staging()?;

        if buf.len() > STAGING_SIZE {
            return self.write_through(buf);
        }

        self.staging[..buf.len()].copy_from_slice(buf);
        self.staged = buf.len();
        Ok(())
    }

    /// Hand all staged bytes to the sink and flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_staging()?;
        self.sink
            .flush()
            .map_err(|e| LzwError::sink(format!("flush failed: {e}")))
    }

    fn flush_staging(&mut self) -> Result<()> {
        if self.staged == 0 {
            return Ok(());
        }
        let staged = self.staged;
        self.staged = 0;

        let accepted = self
            .sink
            .write_chunk(&self.staging[..staged])
            .map_err(|e| LzwError::sink(format!("write failed: {e}")))?;
        self.account(accepted, staged)
    }

    fn write_through(&mut self, buf: &[u8]) -> Result<()> {
        let accepted = self
            .sink
            .write_chunk(buf)
            .map_err(|e| LzwError::sink(format!("write failed: {e}")))?;
        self.account(accepted, buf.len())
    }

    fn account(&mut self, accepted: usize, requested: usize) -> Result<()> {
        self.written += accepted.min(requested) as u64;
        if accepted != requested {
            return Err(LzwError::sink(format!(
                "short write: {accepted} of {requested} bytes accepted"
            )));
        }
        Ok(())
    }

    /// Bytes delivered to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Bytes delivered plus bytes still staged.
    pub fn len(&self) -> u64 {
        self.written + self.staged as u64
    }

    /// Whether nothing has been written or staged yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length cap, if any.
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether the length cap has been reached.
    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.len() >= limit)
    }

    /// Get a reference to the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Consume the output sink and return the underlying sink.
    ///
    /// Staged bytes that were never flushed are lost.
    pub fn into_inner(self) -> S {
        self.sink
    }
}
