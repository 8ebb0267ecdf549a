use clap::{Args, Subcommand};
use std::path::PathBuf;

use commprims_frame::{FrameLayout, DEFAULT_HEADER, DEFAULT_PAYLOAD_LEN, DEFAULT_TRAILER};

use crate::exit::{frame_error, CliResult};
use crate::output::OutputFormat;

pub mod encode;
pub mod exchange;
pub mod scan;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one frame.
    Encode(EncodeArgs),
    /// Recover frames from a byte stream.
    Scan(ScanArgs),
    /// Exercise the triple-slot exchange across two threads.
    Exchange(ExchangeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Scan(args) => scan::run(args, format),
        Command::Exchange(args) => exchange::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Sentinel and checksum options shared by `encode` and `scan`.
#[derive(Args, Debug, Clone, Copy)]
pub struct SentinelArgs {
    /// Header sentinel byte (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_byte, default_value_t = DEFAULT_HEADER)]
    pub header: u8,
    /// Trailer sentinel byte (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_byte, default_value_t = DEFAULT_TRAILER)]
    pub trailer: u8,
    /// Use the byte-sum checksum carried in the last payload byte.
    #[arg(long)]
    pub checksum: bool,
}

impl SentinelArgs {
    pub fn layout(&self, payload_len: usize) -> CliResult<FrameLayout> {
        let layout = FrameLayout::new(payload_len).with_sentinels(self.header, self.trailer);
        layout
            .validate()
            .map_err(|err| frame_error("invalid frame layout", err))?;
        Ok(layout)
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Kind byte (decimal or 0x-prefixed hex).
    #[arg(long, short = 'k', value_parser = parse_byte)]
    pub kind: u8,
    /// Payload as hex, e.g. "01 02 03". With --checksum a sum byte is appended.
    #[arg(long, short = 'p', default_value = "")]
    pub payload: String,
    /// Emit the frame this many times.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub repeat: u64,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// File to read. Default: stdin.
    pub input: Option<PathBuf>,
    /// Payload size of every frame in the stream.
    #[arg(long, default_value_t = DEFAULT_PAYLOAD_LEN)]
    pub payload_size: usize,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Give up after N consecutive windows without a frame.
    #[arg(long)]
    pub max_misses: Option<u64>,
    #[command(flatten)]
    pub sentinels: SentinelArgs,
}

#[derive(Args, Debug)]
pub struct ExchangeArgs {
    /// Values the producer pushes (0..COUNT).
    #[arg(long, default_value_t = 1000)]
    pub count: u32,
    /// Times the consumer samples while the producer runs.
    #[arg(long, default_value_t = 10)]
    pub samples: usize,
    /// Pause between consumer samples, in microseconds.
    #[arg(long, default_value_t = 50)]
    pub interval_us: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse::<u8>(),
    };
    parsed.map_err(|_| format!("not a byte value: {input:?} (expected 0-255 or 0x00-0xFF)"))
}
