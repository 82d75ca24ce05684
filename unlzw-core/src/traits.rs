//! Core traits for streaming decoders.

use crate::error::{LzwError, Result};
use std::io::{ErrorKind as IoErrorKind, Read};

/// Size of the buffer used when pulling input from a reader.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Status of a streaming decode after consuming a chunk of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// More input can be accepted.
    NeedsInput,
    /// Decoding is complete; further input is ignored.
    Done,
}

/// A push-style decoder that consumes compressed input in arbitrary chunks
/// and writes decompressed bytes to a sink it owns.
///
/// Chunk boundaries are invisible to the decoder: feeding the same input in
/// one call or in many produces the same output.
pub trait StreamDecoder {
    /// Feed the next chunk of compressed input.
    ///
    /// Once an error has been returned, every later call returns the same
    /// error without looking at its input.
    fn feed(&mut self, input: &[u8]) -> Result<DecodeStatus>;

    /// Signal end of input and flush all pending output.
    ///
    /// Returns the total number of bytes delivered to the sink.
    fn finish(&mut self) -> Result<u64>;

    /// Check if the decoder has stopped accepting input.
    fn is_finished(&self) -> bool;

    /// Decode a complete input held in memory (convenience method).
    fn decode_all(&mut self, input: &[u8]) -> Result<u64> {
        self.feed(input)?;
        self.finish()
    }

    /// Pull input from `reader` in fixed-size chunks until it is exhausted,
    /// `limit` bytes have been read, or the decoder is done.
    ///
    /// Returns the total number of bytes delivered to the sink.
    fn decode_from<R: Read>(&mut self, reader: &mut R, limit: Option<u64>) -> Result<u64>
    where
        Self: Sized,
    {
        let mut buffer = [0u8; READ_CHUNK_SIZE];
        let mut remaining = limit;

        loop {
            let want = match remaining {
                Some(0) => break,
                Some(n) => usize::try_from(n).map_or(READ_CHUNK_SIZE, |n| n.min(READ_CHUNK_SIZE)),
                None => READ_CHUNK_SIZE,
            };

            let got = match reader.read(&mut buffer[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(LzwError::from(e)),
            };
            if let Some(n) = remaining.as_mut() {
                *n -= got as u64;
            }

            if self.feed(&buffer[..got])? == DecodeStatus::Done {
                break;
            }
        }

        self.finish()
    }
}
