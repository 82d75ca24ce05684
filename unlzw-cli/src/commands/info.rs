//! Info command implementation.

use crate::utils::CountingSink;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use unlzw::{
    LzwConfig, LzwDecoder, LzwError, MAX_MAX_CODE_SIZE, MIN_CODE_SIZE, StreamDecoder,
    UNIX_COMPRESS_MAGIC,
};

/// JSON output for the info command.
#[derive(Debug, Serialize)]
struct HeaderJson {
    file: String,
    size: u64,
    mode: u8,
    max_code_size: u8,
    has_clear_code: bool,
    reserved_bits: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    uncompressed_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = BufReader::new(File::open(input)?);
    let size = std::fs::metadata(input)?.len();

    let mut header = [0u8; 3];
    reader
        .read_exact(&mut header)
        .map_err(|_| LzwError::format("truncated header"))?;
    if header[..2] != UNIX_COMPRESS_MAGIC {
        return Err(LzwError::format("Not in compress format").into());
    }

    let mode = header[2];
    let max_code_size = mode & 0x1f;
    let has_clear_code = mode & 0x80 != 0;

    // Decode into a counter to learn the uncompressed size
    let mut decoder = LzwDecoder::new(LzwConfig::UNIX_COMPRESS, CountingSink::default(), None)?;
    let decoded = decoder
        .feed(&header)
        .and_then(|_| decoder.decode_from(&mut reader, None));
    let (uncompressed_size, error) = match decoded {
        Ok(_) => (Some(decoder.get_ref().count), None),
        Err(e) => (None, Some(e.to_string())),
    };

    if json {
        let info = HeaderJson {
            file: input.display().to_string(),
            size,
            mode,
            max_code_size,
            has_clear_code,
            reserved_bits: mode & 0x60,
            uncompressed_size,
            error,
        };
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Compress Header");
    println!("===============");
    println!("File: {}", input.display());
    println!("Size: {} bytes", size);
    println!("Magic: {:02x} {:02x}", header[0], header[1]);
    println!("Mode byte: 0x{:02x}", mode);
    print!("Max code size: {} bits", max_code_size);
    if !(MIN_CODE_SIZE..=MAX_MAX_CODE_SIZE).contains(&max_code_size) {
        print!(" (unsupported)");
    }
    println!();
    println!(
        "Clear code: {}",
        if has_clear_code { "yes" } else { "no" }
    );
    if mode & 0x60 != 0 {
        println!("Reserved bits: 0x{:02x}", mode & 0x60);
    }

    match (uncompressed_size, error) {
        (Some(n), _) => {
            println!();
            println!("Uncompressed size: {} bytes", n);
            if n > 0 {
                println!(
                    "Compression ratio: {:.1}%",
                    (1.0 - size as f64 / n as f64) * 100.0
                );
            }
        }
        (None, Some(e)) => {
            println!();
            println!("Stream is damaged: {}", e);
        }
        (None, None) => {}
    }

    Ok(())
}
