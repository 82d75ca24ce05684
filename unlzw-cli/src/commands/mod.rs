//! Command implementations for the unlzw CLI.

pub mod decompress;
pub mod info;

pub use decompress::{DecompressOptions, StreamFormat, cmd_decompress};
pub use info::cmd_info;
