use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, TaskError};

/// Fills a whole buffer from a byte stream, or fails.
pub trait ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Writes a whole buffer to a byte stream, or fails.
pub trait ByteSink {
    fn write(&mut self, buf: &[u8]) -> Result<()>;
}

impl<R: Read> ByteSource for R {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match Read::read(self, &mut buf[filled..]) {
                Ok(0) => return Err(TaskError::SourceClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TaskError::Read(err)),
            }
        }
        Ok(())
    }
}

impl<W: Write> ByteSink for W {
    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < buf.len() {
            match Write::write(self, &buf[offset..]) {
                Ok(0) => return Err(TaskError::Write(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TaskError::Write(err)),
            }
        }
        loop {
            match self.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TaskError::Write(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(ErrorKind::Interrupted.into());
            }
            Read::read(&mut self.inner, buf)
        }
    }

    #[test]
    fn fills_whole_buffer_across_partial_reads() {
        let mut source = ByteByByteReader {
            bytes: vec![1, 2, 3, 4, 5],
            pos: 0,
        };
        let mut buf = [0u8; 4];
        ByteSource::read(&mut source, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn short_stream_reports_closed() {
        let mut source = Cursor::new(vec![1u8, 2, 3]);
        let mut buf = [0u8; 4];
        let err = ByteSource::read(&mut source, &mut buf).unwrap_err();
        assert!(matches!(err, TaskError::SourceClosed));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut source = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(vec![9u8, 8]),
        };
        let mut buf = [0u8; 2];
        ByteSource::read(&mut source, &mut buf).unwrap();
        assert_eq!(buf, [9, 8]);
    }

    #[test]
    fn other_read_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(ErrorKind::WouldBlock.into())
            }
        }
        let err = ByteSource::read(&mut Broken, &mut [0u8; 1]).unwrap_err();
        assert!(matches!(err, TaskError::Read(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn sink_writes_everything() {
        let mut out = Vec::new();
        ByteSink::write(&mut out, &[0x21, 0x00, 0x0A]).unwrap();
        ByteSink::write(&mut out, &[0x21]).unwrap();
        assert_eq!(out, vec![0x21, 0x00, 0x0A, 0x21]);
    }

    #[test]
    fn zero_length_write_is_an_error() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let err = ByteSink::write(&mut Full, &[1]).unwrap_err();
        assert!(matches!(err, TaskError::Write(e) if e.kind() == ErrorKind::WriteZero));
    }
}
