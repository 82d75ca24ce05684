//! # unlzw: Pure Rust Streaming LZW Decompression
//!
//! This crate decodes the two historical LZW dialects still found inside
//! archives and embedded payloads:
//!
//! - **Unix `compress`** (`.Z` files and the raw streams some containers
//!   embed): 9 to 16-bit codes growing as the table fills, optional clear
//!   code 256, and the bitgroup padding quirk on every width change.
//! - **ZIP Shrink** (method 1): 9 to 13-bit codes, with code 256 escaping
//!   either a width increase or a *partial clear* that reclaims only leaf
//!   entries of the dictionary.
//!
//! ## Features
//!
//! - **Pure Rust**: No C dependencies, 100% safe Rust
//! - **Streaming**: feed input in chunks of any size; chunking never changes
//!   the output
//! - **Bounded**: memory is fixed by the maximum code size, work per chunk is
//!   bounded by its length, output can be capped at a known length
//! - **Hostile input**: corrupt streams produce an error, never a panic or an
//!   endless loop
//!
//! ## Example
//!
//! ```rust
//! use unlzw::decompress_unix;
//!
//! // `.Z` header (16-bit codes, clear code) followed by the 9-bit codes 'A' 'A'
//! let compressed = [0x1f, 0x9d, 0x90, 0x41, 0x82, 0x00];
//! let decompressed = decompress_unix(&compressed).unwrap();
//! assert_eq!(decompressed, b"AA");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use unlzw::{LzwConfig, LzwDecoder, StreamDecoder};
//!
//! let mut decoder = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, Vec::new(), None).unwrap();
//! for chunk in [&[0x1f, 0x9d][..], &[0x90, 0x41], &[0x82, 0x00]] {
//!     decoder.feed(chunk).unwrap();
//! }
//! decoder.finish().unwrap();
//! assert_eq!(decoder.into_sink(), b"AA");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod config;
mod decoder;
pub mod table;

pub use config::{
    Dialect, HeaderStyle, LzwConfig, MAX_MAX_CODE_SIZE, MIN_CODE_SIZE, SHRINK_MAX_CODE_SIZE,
    UNIX_COMPRESS_MAGIC,
};
pub use decoder::{DecoderState, LzwDecoder};
pub use table::{Code, CodeTable, EntryKind, SlotPolicy, TableEntry};
pub use unlzw_core::{
    ByteSink, DecodeStatus, ErrorKind, LzwError, OutputSink, Result, StreamDecoder, WriterSink,
};

use std::io::{Read, Seek, SeekFrom, Write};

/// Decompress an in-memory LZW stream with the given configuration.
///
/// # Parameters
///
/// - `data`: LZW-compressed input
/// - `config`: dialect and header layout
/// - `expected_len`: output length, if known; output is cut off there
///
/// # Returns
///
/// Decompressed byte sequence.
///
/// # Example
///
/// ```rust
/// use unlzw::{decompress, LzwConfig};
///
/// // Headerless stream, 12-bit codes: 'a' then code 257 ("aa")
/// let data = [0x61, 0x02, 0x02];
/// let out = decompress(&data, LzwConfig::unix_compress_raw(12, true), None).unwrap();
/// assert_eq!(out, b"aaa");
/// ```
pub fn decompress(data: &[u8], config: LzwConfig, expected_len: Option<u64>) -> Result<Vec<u8>> {
    let mut decoder = LzwDecoder::new(config, Vec::new(), expected_len)?;
    decoder.decode_all(data)?;
    Ok(decoder.into_sink())
}

/// Decompress a `.Z` file held in memory (convenience function).
///
/// This is equivalent to `decompress(data, LzwConfig::UNIX_COMPRESS, None)`.
pub fn decompress_unix(data: &[u8]) -> Result<Vec<u8>> {
    decompress(data, LzwConfig::UNIX_COMPRESS, None)
}

/// Decompress a ZIP Shrink member (convenience function).
///
/// `expected_len` is the uncompressed size from the ZIP header.
///
/// # Example
///
/// ```rust
/// use unlzw::unshrink;
///
/// // 9-bit codes 'h' 'i'
/// let data = [0x68, 0xd2, 0x00];
/// assert_eq!(unshrink(&data, 2).unwrap(), b"hi");
/// ```
pub fn unshrink(data: &[u8], expected_len: u64) -> Result<Vec<u8>> {
    decompress(data, LzwConfig::ZIP_SHRINK, Some(expected_len))
}

/// Decompress an in-memory stream into any writer.
///
/// Returns the number of bytes written.
pub fn decompress_to_writer<W: Write>(
    data: &[u8],
    config: LzwConfig,
    expected_len: Option<u64>,
    writer: W,
) -> Result<u64> {
    let mut decoder = LzwDecoder::new(config, WriterSink::new(writer), expected_len)?;
    decoder.decode_all(data)
}

/// Decompress the `len` bytes at offset `pos` of `reader` into `sink`.
///
/// This is how container readers hand over an embedded payload: the range
/// is read in fixed-size chunks and fed to the decoder, and reading stops
/// early once `expected_len` bytes have been produced. Bytes delivered
/// before an error stay in the sink.
///
/// Returns the number of bytes written.
pub fn decompress_range<R, S>(
    reader: &mut R,
    pos: u64,
    len: u64,
    config: LzwConfig,
    sink: S,
    expected_len: Option<u64>,
) -> Result<u64>
where
    R: Read + Seek,
    S: ByteSink,
{
    let mut decoder = LzwDecoder::new(config, sink, expected_len)?;
    reader.seek(SeekFrom::Start(pos))?;
    decoder.decode_from(reader, Some(len))
}
