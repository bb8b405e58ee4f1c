use clap::{Args, Subcommand};
use std::path::PathBuf;

use framewire_frame::{FrameType, CURRENT_PROTOCOL_VERSION, DEFAULT_MAX_BUFFER_SIZE};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one frame and write its wire bytes to stdout.
    Encode(EncodeArgs),
    /// Read a byte stream and print every frame in it.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Body type: json, protobuf, msgpack, or a numeric tag.
    #[arg(long = "type", short = 't', default_value = "json", value_parser = parse_frame_type)]
    pub frame_type: u8,
    /// Protocol version written to the header.
    #[arg(long, default_value_t = CURRENT_PROTOCOL_VERSION)]
    pub protocol_version: u8,
    /// Sub-version written to the header.
    #[arg(long, default_value_t = 0)]
    pub sub_version: u8,
    /// JSON body (validated before framing).
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string body.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read body from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Write the frame as a hex line instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Treat input as hex text; whitespace is ignored.
    #[arg(long)]
    pub hex: bool,
    /// Maximum bytes buffered while waiting for a frame to complete.
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER_SIZE)]
    pub max_buffer_size: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show protocol limits and build details.
    #[arg(long)]
    pub extended: bool,
}

fn parse_frame_type(input: &str) -> Result<u8, String> {
    match input.to_ascii_lowercase().as_str() {
        "json" => Ok(FrameType::Json.into()),
        "protobuf" | "proto" => Ok(FrameType::Protobuf.into()),
        "msgpack" => Ok(FrameType::MsgPack.into()),
        other => other
            .parse::<u8>()
            .map_err(|_| format!("unknown frame type: {input}")),
    }
}
