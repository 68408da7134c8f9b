//! Single-slot byte stream between a producer thread and a consumer thread.
//!
//! [`pipe`] returns a connected [`HandoffWriter`] and [`HandoffReader`]. Nothing is buffered in
//! between: every `read` announces how many bytes it can accept, and the next `write` blocks until
//! such an announcement is pending, copies at most that many bytes and returns the count. Exactly
//! one chunk is in flight at a time. Finishing or dropping the writer ends the stream, and a reader
//! blocked on it observes a zero-length read.
//!
//! ```
//! use std::io::{Read, Write};
//!
//! let (mut writer, mut reader) = colnest::handoff::pipe();
//! let producer = std::thread::spawn(move || {
//!     writer.write_all(br#"{"a": [1, 2]}"#).unwrap();
//!     writer.finish();
//! });
//!
//! let mut text = String::new();
//! reader.read_to_string(&mut text).unwrap();
//! producer.join().unwrap();
//! assert_eq!(text, r#"{"a": [1, 2]}"#);
//! ```
use std::io::{self, Read, Write};

use crossbeam::channel::{Receiver, Sender, bounded};
use log::trace;

/// Create a connected writer/reader pair.
pub fn pipe() -> (HandoffWriter, HandoffReader) {
    let (request_tx, request_rx) = bounded(0);
    let (chunk_tx, chunk_rx) = bounded(0);
    (
        HandoffWriter {
            requests: request_rx,
            chunks: chunk_tx,
        },
        HandoffReader {
            requests: request_tx,
            chunks: chunk_rx,
            eof: false,
        },
    )
}

/// Producer end of a [`pipe`].
pub struct HandoffWriter {
    requests: Receiver<usize>,
    chunks: Sender<Vec<u8>>,
}

impl HandoffWriter {
    /// End the stream. Equivalent to dropping the writer.
    pub fn finish(self) {
        trace!("Handoff writer finished; signalling end of stream.");
    }
}

impl Write for HandoffWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let capacity = self
            .requests
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "handoff reader was dropped"))?;
        let count = capacity.min(data.len());
        self.chunks
            .send(data[..count].to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "handoff reader was dropped"))?;
        Ok(count)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer end of a [`pipe`].
pub struct HandoffReader {
    requests: Sender<usize>,
    chunks: Receiver<Vec<u8>>,
    eof: bool,
}

impl HandoffReader {
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    fn end_of_stream(&mut self) -> usize {
        if !self.eof {
            trace!("Handoff reader reached end of stream.");
            self.eof = true;
        }
        0
    }
}

impl Read for HandoffReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.eof {
            return Ok(0);
        }
        if self.requests.send(buf.len()).is_err() {
            return Ok(self.end_of_stream());
        }
        match self.chunks.recv() {
            Ok(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            Err(_) => Ok(self.end_of_stream()),
        }
    }
}
