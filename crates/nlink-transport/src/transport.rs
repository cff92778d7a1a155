use std::{
    io,
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

/// A reliable, bidirectional byte stream. The codec only ever sees this
/// capability set, so tests can substitute an in-memory pipe and a caller
/// can substitute a TLS-wrapped stream from their own TLS stack.
pub trait Transport: Send + 'static {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    fn close(&mut self) -> io::Result<()>;

    /// Produces an independent handle to the same underlying stream, used
    /// to give the reader thread its own read half while writes go through
    /// a mutex-guarded handle shared with the consumer thread.
    fn try_clone(&self) -> io::Result<Self>
    where
        Self: Sized;
}

/// The default `Transport`: a plain blocking `std::net::TcpStream`.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Dials `addr` and disables Nagle's algorithm, since NATS frames are
    /// small and latency-sensitive.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Like [`connect`](Self::connect), but fails with
    /// [`io::ErrorKind::TimedOut`] instead of hanging indefinitely on an
    /// unresponsive address.
    pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut self.stream, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut self.stream, buf)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer may already have gone away; shutting down a dead
            // socket is not a failure the caller needs to see.
            Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn try_clone(&self) -> io::Result<Self> {
        Ok(Self { stream: self.stream.try_clone()? })
    }
}
