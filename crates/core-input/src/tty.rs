//! Real-TTY [`ByteSource`]: reads one byte at a time from a file descriptor,
//! using `mio`'s readiness polling to implement the escape-assembly timeout
//! without spawning a thread — the control loop's single blocking-read
//! suspension point stays exactly that, a blocking read.

use crate::decoder::{ByteOutcome, ByteSource};
use std::io::Read;
use std::time::Duration;

#[cfg(unix)]
mod unix_poll {
    use mio::unix::SourceFd;
    use mio::{Events, Interest, Poll, Token};
    use std::os::unix::io::RawFd;
    use std::time::Duration;

    /// Block until `fd` is readable or `timeout` elapses. `None` blocks
    /// indefinitely (the contract for the first byte of a new event).
    pub fn wait_readable(fd: RawFd, timeout: Option<Duration>) -> std::io::Result<bool> {
        let mut poll = Poll::new()?;
        let mut events = Events::with_capacity(1);
        poll.registry()
            .register(&mut SourceFd(&fd), Token(0), Interest::READABLE)?;
        loop {
            match poll.poll(&mut events, timeout) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(!events.is_empty())
    }
}

/// Reads raw bytes from a file descriptor (normally stdin in raw mode),
/// applying the given timeout to every byte after the first of an escape
/// sequence.
pub struct TtyReader<R> {
    inner: R,
    #[cfg(unix)]
    fd: std::os::unix::io::RawFd,
}

impl<R: Read + std::os::unix::io::AsRawFd> TtyReader<R> {
    #[cfg(unix)]
    pub fn new(inner: R) -> Self {
        let fd = inner.as_raw_fd();
        Self { inner, fd }
    }
}

#[cfg(unix)]
impl<R: Read> ByteSource for TtyReader<R> {
    fn read_byte(&mut self, timeout: Option<Duration>) -> std::io::Result<ByteOutcome> {
        if !unix_poll::wait_readable(self.fd, timeout)? {
            return Ok(ByteOutcome::Timeout);
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(ByteOutcome::Eof),
            Ok(_) => Ok(ByteOutcome::Byte(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                self.read_byte(timeout)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    #[test]
    fn reads_byte_from_socket() {
        let (r, mut w) = UnixStream::pair().unwrap();
        w.write_all(b"x").unwrap();
        let mut reader = TtyReader::new(r);
        assert_eq!(
            reader.read_byte(Some(Duration::from_millis(200))).unwrap(),
            ByteOutcome::Byte(b'x')
        );
    }

    #[test]
    fn timeout_when_nothing_written() {
        let (r, _w) = UnixStream::pair().unwrap();
        let mut reader = TtyReader::new(r);
        assert_eq!(
            reader.read_byte(Some(Duration::from_millis(30))).unwrap(),
            ByteOutcome::Timeout
        );
    }

    #[test]
    fn eof_when_writer_dropped() {
        let (r, w) = UnixStream::pair().unwrap();
        drop(w);
        let mut reader = TtyReader::new(r);
        assert_eq!(
            reader.read_byte(Some(Duration::from_millis(200))).unwrap(),
            ByteOutcome::Eof
        );
    }
}
