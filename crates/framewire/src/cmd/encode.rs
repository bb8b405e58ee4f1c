use std::fs;

use framewire_frame::{BufferPool, Frame, FrameError, FrameOptions};
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::print_raw;

pub fn run(args: EncodeArgs) -> CliResult<i32> {
    let body = resolve_body(&args)?;
    let options = FrameOptions::default()
        .version(args.protocol_version)
        .sub_version(args.sub_version);

    let frame = Frame::with_options(args.frame_type, body, options)
        .map_err(|err| invalid_frame("invalid frame", err))?;
    let wire = frame
        .encode(&BufferPool::shared())
        .map_err(|err| invalid_frame("encode failed", err))?;

    debug!(
        frame_type = %frame.frame_type(),
        body_length = frame.body_length(),
        wire_length = wire.len(),
        "encoded frame"
    );

    if args.hex {
        println!("{}", hex::encode(&wire));
    } else {
        print_raw(&wire);
    }

    Ok(SUCCESS)
}

fn resolve_body(args: &EncodeArgs) -> CliResult<Vec<u8>> {
    if let Some(json) = &args.json {
        serde_json::from_str::<serde_json::Value>(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return Ok(json.as_bytes().to_vec());
    }
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

/// Frames built from command-line input are usage errors, not bad data.
fn invalid_frame(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(_) => frame_error(context, err),
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}
