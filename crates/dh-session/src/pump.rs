use std::io::{self, Read};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::debug;

use crate::output_sink::OutputSink;

const READ_BUFFER_SIZE: usize = 4096;

/// Spawn a thread that copies `reader` into `sink` until end of stream.
///
/// The sink is told about the stream before the thread starts and again when
/// it finishes, so callers can wait for trailing output after the process
/// exits. The thread returns the number of bytes it forwarded.
pub fn spawn<R>(name: &str, mut reader: R, sink: Arc<OutputSink>) -> io::Result<JoinHandle<u64>>
where
    R: Read + Send + 'static,
{
    sink.attach_stream();
    let stream = name.to_string();
    let thread_sink = Arc::clone(&sink);
    let spawned = std::thread::Builder::new()
        .name(format!("pump-{name}"))
        .spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            let mut total = 0u64;
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        thread_sink.write(&buf[..n]);
                        total += n as u64;
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(stream = %stream, "pump read error: {e}");
                        break;
                    }
                }
            }
            debug!(stream = %stream, bytes = total, "pump reached end of stream");
            thread_sink.close_stream();
            total
        });

    spawned.inspect_err(|_| sink.close_stream())
}
