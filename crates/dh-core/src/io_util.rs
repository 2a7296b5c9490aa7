use std::io::{self, Read};

/// Extra room added on top of the current buffer size when it fills up.
const GROWTH_STEP: usize = 1024;

/// Read up to `length` bytes from `reader`, stopping early at EOF.
///
/// The buffer starts empty and, each time it fills, grows by its current size
/// plus [`GROWTH_STEP`] (capped at `length`), so a bogus `length` read from an
/// untrusted header does not cause a huge allocation up front.
///
/// With `read_all` set, hitting EOF before `length` bytes is an
/// [`io::ErrorKind::UnexpectedEof`] error; otherwise the bytes read so far
/// are returned.
pub fn read_fully<R: Read + ?Sized>(
    reader: &mut R,
    length: usize,
    read_all: bool,
) -> io::Result<Vec<u8>> {
    let mut output: Vec<u8> = Vec::new();
    let mut pos = 0;
    while pos < length {
        if pos >= output.len() {
            let step = (length - pos).min(output.len() + GROWTH_STEP);
            output.resize(pos + step, 0);
        }
        let n = match reader.read(&mut output[pos..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            if read_all {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("premature EOF after {pos} of {length} bytes"),
                ));
            }
            output.truncate(pos);
            break;
        }
        pos += n;
    }
    Ok(output)
}

/// Read exactly `length` bytes, failing on a premature EOF.
pub fn read_n_bytes<R: Read + ?Sized>(reader: &mut R, length: usize) -> io::Result<Vec<u8>> {
    read_fully(reader, length, true)
}
