//! Stream reassembly example: frames written to a socket pair in awkward
//! chunks come back out whole.
//!
//! Run with:
//!   cargo run --example stream-reassembly
//!
//! Needs Unix domain sockets; elsewhere it only prints a notice.

#[cfg(not(unix))]
fn main() {
    eprintln!("stream-reassembly needs Unix domain sockets");
}

#[cfg(unix)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::io::Write;
    use std::sync::Arc;
    use std::thread;

    use framewire::frame::{BufferPool, Frame, FrameType, StreamDecoder};

    let pool = Arc::new(BufferPool::new());
    let (mut tx, mut rx) = std::os::unix::net::UnixStream::pair()?;

    let writer_pool = Arc::clone(&pool);
    let writer = thread::spawn(
        move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let frames = [
                Frame::new(FrameType::Json, b"{\"action\":\"ping\"}")?,
                Frame::new(FrameType::MsgPack, &[0x81, 0xa1, 0x61, 0x01])?,
                Frame::new(FrameType::Protobuf, &vec![0x08; 5000])?,
            ];
            let mut wire = Vec::new();
            for frame in &frames {
                wire.extend(frame.encode(&writer_pool)?);
            }

            // Deliberately awkward chunk boundaries.
            for chunk in wire.chunks(13) {
                tx.write_all(chunk)?;
            }
            Ok(())
        },
    );

    let mut decoder = StreamDecoder::with_config(Default::default(), Arc::clone(&pool));
    let mut frames = Vec::new();
    let count = decoder.read_frames_from_stream(&mut rx, &mut frames)?;
    writer
        .join()
        .map_err(|_| "writer thread panicked")?
        .map_err(|err| err.to_string())?;

    eprintln!("decoded {count} frames");
    for frame in &frames {
        eprintln!("  {frame}");
    }

    Ok(())
}
