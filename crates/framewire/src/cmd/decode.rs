use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use framewire_frame::{BufferPool, Frame, StreamConfig, StreamDecoder};
use tracing::info;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_frames, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut source = open_input(args.input.as_deref(), args.hex)?;

    let mut decoder = StreamDecoder::with_config(
        StreamConfig::with_max_buffer_size(args.max_buffer_size),
        BufferPool::shared(),
    );
    let mut frames: Vec<Frame> = Vec::new();
    let result = decoder.read_frames_from_stream(&mut source, &mut frames);

    // Frames decoded before a failure are still reported.
    print_frames(&frames, format);
    result.map_err(|err| frame_error("decode failed", err))?;

    info!(frames = frames.len(), "stream decoded");

    if !decoder.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "stream ended inside a frame ({} bytes pending)",
                decoder.buffered()
            ),
        ));
    }

    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>, hex: bool) -> CliResult<Box<dyn Read>> {
    let mut reader: Box<dyn Read> = match path {
        Some(path) if path != Path::new("-") => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
        ),
        _ => Box::new(io::stdin().lock()),
    };

    if !hex {
        return Ok(reader);
    }

    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading hex input", err))?;
    let bytes = parse_hex(&text)?;
    Ok(Box::new(Cursor::new(bytes)))
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
