//! Decompress command implementation.

use crate::utils::{ProgressReader, create_progress_bar, default_output_path};
use clap::ValueEnum;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::PathBuf;
use unlzw::{HeaderStyle, LzwConfig, UNIX_COMPRESS_MAGIC, WriterSink, decompress_range};

/// Layout of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamFormat {
    /// .Z file: `1f 9d` magic and mode byte
    Z,
    /// Unix compress stream preceded by a lone mode byte
    Z1,
    /// Headerless Unix compress stream (see --max-bits, --no-clear)
    Raw,
    /// ZIP Shrink (method 1) member data
    Shrink,
}

impl StreamFormat {
    fn config(self, max_bits: u8, has_clear_code: bool) -> LzwConfig {
        match self {
            Self::Z => LzwConfig::UNIX_COMPRESS,
            Self::Z1 => LzwConfig::unix_compress(HeaderStyle::OneByte),
            Self::Raw => LzwConfig::unix_compress_raw(max_bits, has_clear_code),
            Self::Shrink => LzwConfig::ZIP_SHRINK,
        }
    }
}

/// Options for the decompress command.
pub struct DecompressOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<StreamFormat>,
    pub max_bits: u8,
    pub has_clear_code: bool,
    pub offset: u64,
    pub length: Option<u64>,
    pub expected_len: Option<u64>,
    pub progress: bool,
}

pub fn cmd_decompress(opts: &DecompressOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::open(&opts.input)?;
    let file_len = file.metadata()?.len();
    if opts.offset > file_len {
        return Err(format!(
            "offset {} is past the end of {} ({} bytes)",
            opts.offset,
            opts.input.display(),
            file_len
        )
        .into());
    }
    let available = file_len - opts.offset;
    let length = opts.length.map_or(available, |len| len.min(available));

    let format = match opts.format {
        Some(format) => format,
        None => detect_format(&mut file, opts.offset)?,
    };
    let config = format.config(opts.max_bits, opts.has_clear_code);
    tracing::debug!("format: {format:?}, config: {config:?}");

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&opts.input));
    if output == opts.input {
        return Err("output file would overwrite the input".into());
    }

    let pb = create_progress_bar(length, opts.progress);
    let mut reader = ProgressReader::new(BufReader::new(file), pb.clone());
    let writer = BufWriter::new(File::create(&output)?);

    let result = decompress_range(
        &mut reader,
        opts.offset,
        length,
        config,
        WriterSink::new(writer),
        opts.expected_len,
    );
    pb.finish_and_clear();
    let written = result?;

    println!(
        "{} -> {} ({} bytes in, {} bytes out)",
        opts.input.display(),
        output.display(),
        length,
        written
    );
    Ok(())
}

fn detect_format(file: &mut File, offset: u64) -> std::io::Result<StreamFormat> {
    let mut magic = [0u8; 2];
    file.seek(SeekFrom::Start(offset))?;
    let format = match file.read_exact(&mut magic) {
        Ok(()) if magic == UNIX_COMPRESS_MAGIC => StreamFormat::Z,
        Ok(()) => StreamFormat::Raw,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => StreamFormat::Raw,
        Err(e) => return Err(e),
    };
    tracing::debug!("detected format: {format:?}");
    Ok(format)
}
