//! # unlzw Core
//!
//! Core components shared by the unlzw decoders.
//!
//! - [`bitstream`]: LSB-first pending-bits accumulator for fixed-width codes
//! - [`sink`]: Output sink trait and the staging, length-capped writer
//! - [`traits`]: Streaming decoder trait
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Front ends                                          │
//! │     CLI, container readers locating compressed ranges  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZW state machine (Unix compress, ZIP Shrink)      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Plumbing (this crate)                               │
//! │     BitAccumulator, OutputSink, StreamDecoder, errors  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use unlzw_core::bitstream::BitAccumulator;
//! use unlzw_core::sink::OutputSink;
//!
//! let mut acc = BitAccumulator::new();
//! acc.add_byte(0x41);
//! acc.add_byte(0x00);
//! let code = acc.take_code(9);
//!
//! let mut out = OutputSink::new(Vec::new(), Some(1));
//! out.write(&[code as u8, 0x42]).unwrap();
//! out.flush().unwrap();
//! assert_eq!(out.into_inner(), b"A");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod sink;
pub mod traits;

// Re-exports for convenience
pub use bitstream::BitAccumulator;
pub use error::{ErrorKind, LzwError, Result};
pub use sink::{ByteSink, OutputSink, WriterSink};
pub use traits::{DecodeStatus, StreamDecoder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::BitAccumulator;
    pub use crate::error::{ErrorKind, LzwError, Result};
    pub use crate::sink::{ByteSink, OutputSink, WriterSink};
    pub use crate::traits::{DecodeStatus, StreamDecoder};
}
