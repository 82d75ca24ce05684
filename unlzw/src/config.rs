//! LZW dialect configuration (Unix compress, ZIP Shrink).

use std::fmt;
use std::str::FromStr;
use unlzw_core::error::{LzwError, Result};

/// Smallest code width any supported dialect starts at.
pub const MIN_CODE_SIZE: u8 = 9;

/// Largest code width the code table can be sized for.
pub const MAX_MAX_CODE_SIZE: u8 = 16;

/// Fixed maximum code width of ZIP Shrink.
pub const SHRINK_MAX_CODE_SIZE: u8 = 13;

/// Magic bytes opening a `.Z` file.
pub const UNIX_COMPRESS_MAGIC: [u8; 2] = [0x1f, 0x9d];

/// LZW variant to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Unix `compress` (`.Z`): dynamic code growth, optional clear code 256,
    /// bitgroup padding whenever the code width changes.
    UnixCompress,
    /// PKZIP "Shrink" (method 1): code 256 escapes a width increase or a
    /// partial clear, codes 9..=13 bits.
    ZipShrink,
}

impl Dialect {
    /// Map a ZIP compression method number to a dialect.
    ///
    /// Only method 1 (Shrink) is LZW-based and supported here; the Reduce
    /// methods and everything else are reported as not implemented.
    pub fn from_zip_method(method: u16) -> Result<Self> {
        match method {
            1 => Ok(Self::ZipShrink),
            2..=5 => Err(LzwError::not_implemented(format!(
                "zip method {method} (Reduce) is not an LZW method"
            ))),
            _ => Err(LzwError::not_implemented(format!(
                "zip method {method} is not supported"
            ))),
        }
    }

    /// Short name of the dialect.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnixCompress => "compress",
            Self::ZipShrink => "shrink",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = LzwError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "compress" | "unix-compress" | "z" => Ok(Self::UnixCompress),
            "shrink" | "zip-shrink" => Ok(Self::ZipShrink),
            other => Err(LzwError::not_implemented(format!(
                "unsupported LZW dialect: {other}"
            ))),
        }
    }
}

/// Header layout preceding a Unix `compress` code stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderStyle {
    /// No header; code size and clear-code flag come from the configuration.
    #[default]
    None,
    /// `1f 9d <mode>`: the standard `.Z` file header.
    ThreeByte,
    /// `<mode>` only; a clear code is always implied.
    OneByte,
}

impl HeaderStyle {
    /// Number of header bytes before the first code.
    pub fn size(&self) -> usize {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
            Self::OneByte => 1,
        }
    }
}

/// LZW configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzwConfig {
    /// Which LZW variant to decode.
    pub dialect: Dialect,
    /// Header layout. Always [`HeaderStyle::None`] for ZIP Shrink.
    pub header_style: HeaderStyle,
    /// Maximum code size in bits. Ignored when it is read from a header.
    pub max_code_size: u8,
    /// Whether code 256 is a clear code. Ignored when read from a header.
    pub has_clear_code: bool,
}

impl LzwConfig {
    /// A `.Z` file: three-byte header carrying the code size and flags.
    pub const UNIX_COMPRESS: Self = Self {
        dialect: Dialect::UnixCompress,
        header_style: HeaderStyle::ThreeByte,
        max_code_size: MAX_MAX_CODE_SIZE,
        has_clear_code: true,
    };

    /// A ZIP Shrink member.
    pub const ZIP_SHRINK: Self = Self {
        dialect: Dialect::ZipShrink,
        header_style: HeaderStyle::None,
        max_code_size: SHRINK_MAX_CODE_SIZE,
        has_clear_code: false,
    };

    /// Unix `compress` stream with the given header layout.
    ///
    /// With [`HeaderStyle::None`] this assumes 16-bit codes and a clear code;
    /// use [`unix_compress_raw`](Self::unix_compress_raw) to choose.
    pub fn unix_compress(header_style: HeaderStyle) -> Self {
        Self {
            header_style,
            ..Self::UNIX_COMPRESS
        }
    }

    /// Headerless Unix `compress` stream with explicit parameters.
    pub fn unix_compress_raw(max_code_size: u8, has_clear_code: bool) -> Self {
        Self {
            dialect: Dialect::UnixCompress,
            header_style: HeaderStyle::None,
            max_code_size,
            has_clear_code,
        }
    }

    /// Headerless Unix `compress` stream described by a stored mode byte.
    ///
    /// Containers that strip the `.Z` magic keep the mode byte elsewhere.
    /// The low five bits give the maximum code size and a clear code is
    /// always assumed, as with a one-byte header.
    pub fn unix_compress_mode(mode: u8) -> Self {
        Self::unix_compress_raw(mode & 0x1f, true)
    }

    /// Code width at the start of a stream and after every clear.
    pub fn min_code_size(&self) -> u8 {
        MIN_CODE_SIZE
    }

    /// Number of header bytes the decoder expects.
    pub fn header_size(&self) -> usize {
        match self.dialect {
            Dialect::UnixCompress => self.header_style.size(),
            Dialect::ZipShrink => 0,
        }
    }

    /// Check that the configuration describes something this engine decodes.
    pub fn validate(&self) -> Result<()> {
        match self.dialect {
            Dialect::ZipShrink => {
                if self.header_style != HeaderStyle::None {
                    return Err(LzwError::not_implemented(
                        "ZIP Shrink streams have no header",
                    ));
                }
            }
            Dialect::UnixCompress => {
                if self.header_style == HeaderStyle::None {
                    check_code_size(self.max_code_size)
                        .map_err(|e| LzwError::not_implemented(e.message().to_string()))?;
                }
            }
        }
        Ok(())
    }
}

impl Default for LzwConfig {
    fn default() -> Self {
        Self::UNIX_COMPRESS
    }
}

/// Reject maximum code sizes outside 9..=16 bits.
pub(crate) fn check_code_size(max_code_size: u8) -> Result<()> {
    if !(MIN_CODE_SIZE..=MAX_MAX_CODE_SIZE).contains(&max_code_size) {
        return Err(LzwError::format(format!(
            "unsupported maximum code size: {max_code_size} bits (must be {MIN_CODE_SIZE}-{MAX_MAX_CODE_SIZE})"
        )));
    }
    Ok(())
}
