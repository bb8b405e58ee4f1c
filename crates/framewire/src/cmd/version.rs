use framewire_frame::{HEADER_LENGTH, MAX_MESSAGE_LENGTH, SUPPORTED_VERSIONS};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("framewire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: framewire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("protocol_versions: {SUPPORTED_VERSIONS:?}");
    println!("header_length: {HEADER_LENGTH}");
    println!("max_message_length: {MAX_MESSAGE_LENGTH}");
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("FRAMEWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
