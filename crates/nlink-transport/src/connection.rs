use std::{
    io::{self, BufReader},
    sync::Mutex,
};

use nlink_protocol::{Message, Parser};
use tracing::debug;

use crate::{error::TransportError, transport::Transport};

/// Adapts a [`Transport`] into [`io::Read`] so it can sit behind a
/// [`BufReader`], which turns the parser's line-at-a-time control reads
/// into one syscall per bufferful instead of one per byte.
struct ReadHalf<T>(T);

impl<T: Transport> io::Read for ReadHalf<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// Owns a [`Transport`] and exposes the two operations a `Subscriber`
/// needs: a mutex-serialised `write_frame` usable from any thread, and a
/// `read_message` meant to be called from exactly one (the reader) thread.
///
/// The transport is split into independent read/write handles via
/// [`Transport::try_clone`] so those two calls never contend on the same
/// lock - writes from the consumer thread must not stall behind a reader
/// thread blocked on a slow socket.
pub struct Connection<T: Transport> {
    writer: Mutex<T>,
    reader: Mutex<BufReader<ReadHalf<T>>>,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T) -> Result<Self, TransportError> {
        let read_half = transport.try_clone()?;
        Ok(Self {
            writer: Mutex::new(transport),
            reader: Mutex::new(BufReader::new(ReadHalf(read_half))),
        })
    }

    /// Writes `bytes` as a single frame, retrying until every byte lands or
    /// the transport reports an error. Safe to call concurrently; the
    /// internal mutex makes each call atomic relative to the others.
    pub fn write_frame(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut written = 0;
        while written < bytes.len() {
            let n = guard.write(&bytes[written..])?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            written += n;
        }
        Ok(())
    }

    /// Decodes exactly one frame into `msg`. Only the Subscriber's reader
    /// thread should call this.
    pub fn read_message(&self, msg: &mut Message) -> Result<(), TransportError> {
        let mut guard = self.reader.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Parser::read_message(&mut *guard, msg).map_err(TransportError::from)
    }

    /// Shuts the transport down on both sides. Idempotent at the transport
    /// level; callers should still only call this once.
    pub fn close(&self) -> Result<(), TransportError> {
        debug!("closing transport connection");
        self.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner).close()?;
        Ok(())
    }
}
