//! Chunked stream-to-sink copy
//!
//! Frames are moved from the capture pipe to disk with fixed-size reads.
//! Read and write failures are reported separately so callers can attribute
//! them to the transport or to the filesystem.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Which side of a copy failed
#[derive(Debug)]
pub enum CopyError {
    /// Reading from the source failed
    Read(io::Error),
    /// Writing to the sink failed
    Write(io::Error),
}

/// Copies `reader` into `writer` in reads of at most `chunk_size` bytes
///
/// Stops at the first zero-byte read. Every non-empty chunk is written in
/// full before the next read. Returns the number of bytes copied; the writer
/// is not flushed.
pub async fn copy_chunked<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<u64, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        writer.write_all(&buf[..read]).await.map_err(CopyError::Write)?;
        total += read as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };

    use tokio::io::ReadBuf;

    use super::*;

    /// Reader that records the size of every buffer it is handed
    struct RecordingReader {
        data:  io::Cursor<Vec<u8>>,
        sizes: Vec<usize>,
    }

    impl AsyncRead for RecordingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            self.sizes.push(buf.remaining());
            Pin::new(&mut self.data).poll_read(cx, buf)
        }
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
            _: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
        }
    }

    #[tokio::test]
    async fn test_copies_all_bytes() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = io::Cursor::new(data.clone());
        let mut sink = Vec::new();

        let copied = copy_chunked(&mut reader, &mut sink, 8192).await.unwrap();

        assert_eq!(copied, 20_000);
        assert_eq!(sink, data);
    }

    #[tokio::test]
    async fn test_reads_never_exceed_chunk_size() {
        let mut reader = RecordingReader {
            data:  io::Cursor::new(vec![1u8; 10_000]),
            sizes: Vec::new(),
        };
        let mut sink = Vec::new();

        copy_chunked(&mut reader, &mut sink, 4096).await.unwrap();

        assert!(reader.sizes.iter().all(|&size| size == 4096));
        // 4096 + 4096 + 1808, then the zero-byte read
        assert_eq!(reader.sizes.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let mut reader = io::Cursor::new(Vec::<u8>::new());
        let mut sink = Vec::new();

        assert_eq!(copy_chunked(&mut reader, &mut sink, 8192).await.unwrap(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_is_attributed() {
        let mut sink = Vec::new();
        let err = copy_chunked(&mut FailingReader, &mut sink, 8192).await.unwrap_err();

        match err {
            CopyError::Read(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            CopyError::Write(_) => panic!("expected read error"),
        }
    }
}
