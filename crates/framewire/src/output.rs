use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framewire_frame::Frame;
use serde::Serialize;

const PREVIEW_LIMIT: usize = 64;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    index: usize,
    version: u8,
    sub_version: u8,
    frame_type: u8,
    type_name: &'a str,
    body_length: u32,
    body: String,
}

impl<'a> FrameOutput<'a> {
    fn new(index: usize, frame: &'a Frame) -> Self {
        Self {
            index,
            version: frame.version(),
            sub_version: frame.sub_version(),
            frame_type: frame.frame_type().into(),
            type_name: frame.frame_type().name(),
            body_length: frame.body_length(),
            body: body_preview(frame.body()),
        }
    }
}

/// Print decoded frames. JSON is one object per line.
pub fn print_frames(frames: &[Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, frame) in frames.iter().enumerate() {
                println!(
                    "{}",
                    serde_json::to_string(&FrameOutput::new(index, frame))
                        .unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "VERSION", "SUB", "TYPE", "LENGTH", "BODY"]);
            for (index, frame) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    frame.version().to_string(),
                    frame.sub_version().to_string(),
                    frame.frame_type().to_string(),
                    frame.body_length().to_string(),
                    body_preview(frame.body()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                println!("{frame}");
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(frame.body());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) if text.chars().count() > PREVIEW_LIMIT => {
            let cut: String = text.chars().take(PREVIEW_LIMIT).collect();
            format!("{cut}...")
        }
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", body.len()),
    }
}
