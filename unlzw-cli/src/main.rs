//! unlzw CLI - LZW decompressor
//!
//! Decodes Unix `compress` (.Z) files and raw LZW streams (Unix compress or
//! ZIP Shrink) cut out of other containers.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use commands::{DecompressOptions, StreamFormat, cmd_decompress, cmd_info};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "unlzw")]
#[command(author, version, about = "Pure Rust LZW decompressor")]
#[command(long_about = "
unlzw decodes Unix compress (.Z) files and raw LZW streams.

Examples:
  unlzw decompress file.txt.Z
  unlzw decompress file.txt.Z -o file.txt
  unlzw decompress member.bin --format shrink --expected-len 4096
  unlzw decompress image.bin --format raw --max-bits 12 --offset 512 --length 2048
  unlzw info file.txt.Z --json
")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompress an LZW stream
    #[command(alias = "d")]
    Decompress {
        /// Input file
        input: PathBuf,

        /// Output file (default: input without `.Z`, or with `.out` appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stream format (default: `z` if the file starts with the .Z magic, else `raw`)
        #[arg(short, long, value_enum)]
        format: Option<StreamFormat>,

        /// Maximum code size for raw streams
        #[arg(long, default_value_t = 16)]
        max_bits: u8,

        /// Raw stream has no clear code
        #[arg(long)]
        no_clear: bool,

        /// Start of the stream within the input file
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Length of the stream (default: to end of file)
        #[arg(long)]
        length: Option<u64>,

        /// Stop after this many output bytes
        #[arg(long)]
        expected_len: Option<u64>,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// Show the header of a .Z file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        input: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    } else {
        EnvFilter::new(default)
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decompress {
            input,
            output,
            format,
            max_bits,
            no_clear,
            offset,
            length,
            expected_len,
            progress,
        } => cmd_decompress(&DecompressOptions {
            input,
            output,
            format,
            max_bits,
            has_clear_code: !no_clear,
            offset,
            length,
            expected_len,
            progress,
        }),
        Commands::Info { input, json } => cmd_info(&input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
