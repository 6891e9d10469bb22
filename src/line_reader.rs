use std::mem::take;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::timeout;

pub const LINE_DELIMITER: u8 = b'\n';

#[derive(Debug, PartialEq, Eq)]
pub enum ReadLine {
    /// A full line, delimiter included
    Line(Vec<u8>),
    /// Whatever arrived before the timeout, possibly nothing
    TimedOut(Vec<u8>),
    /// The source reached end of stream
    Closed,
}

pub struct LineReader<R: AsyncRead> {
    reader: BufReader<R>,
    timeout: Duration,
    // survives cancelled and timed out reads so no byte is dropped
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(reader),
            timeout,
            pending: Vec::new(),
        }
    }

    /// Reads until the delimiter or until the timeout runs out, whichever
    /// comes first. Safe to cancel: bytes already received are kept for the
    /// next call.
    pub async fn read_line(&mut self) -> std::io::Result<ReadLine> {
        match timeout(
            self.timeout,
            self.reader.read_until(LINE_DELIMITER, &mut self.pending),
        )
        .await
        {
            Err(_) => Ok(ReadLine::TimedOut(take(&mut self.pending))),
            Ok(Ok(0)) if self.pending.is_empty() => Ok(ReadLine::Closed),
            Ok(Ok(_)) => Ok(ReadLine::Line(take(&mut self.pending))),
            Ok(Err(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn reads_lines_in_order() {
        let source: &[u8] = b"anchor 1\r\nanchor 2\nanchor 3\n";
        let mut reader = LineReader::new(source, Duration::from_secs(1));

        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"anchor 1\r\n".to_vec())
        );
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"anchor 2\n".to_vec())
        );
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"anchor 3\n".to_vec())
        );
        assert_eq!(reader.read_line().await.unwrap(), ReadLine::Closed);
    }

    #[tokio::test]
    async fn unterminated_tail_is_a_line() {
        let source: &[u8] = b"last";
        let mut reader = LineReader::new(source, Duration::from_secs(1));

        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"last".to_vec())
        );
        assert_eq!(reader.read_line().await.unwrap(), ReadLine::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_source_times_out_empty() {
        let (_device, host) = duplex(64);
        let mut reader = LineReader::new(host, Duration::from_secs(1));

        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::TimedOut(Vec::new())
        );
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::TimedOut(Vec::new())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn partial_line_is_returned_on_timeout() {
        let (mut device, host) = duplex(64);
        let mut reader = LineReader::new(host, Duration::from_millis(500));

        device.write_all(b"dist=1").await.unwrap();
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::TimedOut(b"dist=1".to_vec())
        );

        device.write_all(b".5\nnext").await.unwrap();
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b".5\n".to_vec())
        );

        drop(device);
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"next".to_vec())
        );
        assert_eq!(reader.read_line().await.unwrap(), ReadLine::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_read_keeps_received_bytes() {
        let (mut device, host) = duplex(64);
        let mut reader = LineReader::new(host, Duration::from_secs(10));

        device.write_all(b"half").await.unwrap();
        tokio::select! {
            _ = reader.read_line() => panic!("read should still be pending"),
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        }

        device.write_all(b" line\n").await.unwrap();
        assert_eq!(
            reader.read_line().await.unwrap(),
            ReadLine::Line(b"half line\n".to_vec())
        );
    }
}
