use std::io::{self, BufRead, Read, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::Error;

/// Wrap `w` so that everything written through it is zlib-deflated. Call `finish` on the
/// returned encoder to flush the trailer.
pub fn deflate<W: Write>(w: W, level: Compression) -> ZlibEncoder<W> {
    ZlibEncoder::new(w, level)
}

pub fn compress_all(data: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut e = deflate(Vec::with_capacity(data.len() / 2), level);
    e.write_all(data)?;
    e.finish()
}

pub fn decompress_all(data: &[u8]) -> crate::Result<Vec<u8>> {
    let mut out = Vec::new();
    Inflater::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// A streaming zlib reader.
///
/// Unlike `flate2::read::ZlibDecoder`, reaching the end of the input before the zlib trailer is
/// an error rather than a short read, so a truncated object never looks like a complete one.
/// Errors carry [`Error::CorruptObject`] and convert back into it with `?`.
pub struct Inflater<R> {
    inner: R,
    state: Decompress,
    done: bool,
}

impl<R: BufRead> Inflater<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            state: Decompress::new(true),
            done: false,
        }
    }

    /// Whether the end of the compressed stream has been reached and its checksum verified.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<R: BufRead> Read for Inflater<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.done {
            return Ok(0);
        }
        loop {
            let input = self.inner.fill_buf()?;
            let eof = input.is_empty();
            let (before_in, before_out) = (self.state.total_in(), self.state.total_out());

            let flush = if eof {
                FlushDecompress::Finish
            } else {
                FlushDecompress::None
            };
            let status = self
                .state
                .decompress(input, buf, flush)
                .map_err(|e| Error::corrupt(format!("invalid zlib stream: {e}")).into_io())?;

            let consumed = (self.state.total_in() - before_in) as usize;
            let produced = (self.state.total_out() - before_out) as usize;
            self.inner.consume(consumed);

            match status {
                Status::StreamEnd => {
                    self.done = true;
                    return Ok(produced);
                }
                _ if produced > 0 => return Ok(produced),
                _ if eof => {
                    return Err(Error::corrupt("zlib stream ended before its trailer").into_io())
                }
                _ => continue,
            }
        }
    }
}
