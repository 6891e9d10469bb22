use std::future::Future;
use std::io::ErrorKind;

use anyhow::{Context, Result};
use log::{debug, info, trace};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::line_format::LineFormat;
use crate::line_reader::{LineReader, ReadLine};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalStats {
    pub lines: u64,
    pub bytes: u64,
    pub timeouts: u64,
}

fn is_transient(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
    )
}

async fn print_line<W: AsyncWrite + Unpin>(
    out: &mut W,
    format: LineFormat,
    line: &[u8],
    stats: &mut TerminalStats,
) -> Result<()> {
    stats.lines += 1;
    stats.bytes += line.len() as u64;
    out.write_all(&format.format(line))
        .await
        .context("Failed to write line")?;
    out.flush().await.context("Failed to flush output")?;
    Ok(())
}

/// Prints every line read from `reader` to `out` until `shutdown` resolves
/// or the source closes. Only non-transient I/O errors end the loop early.
pub async fn run<R, W, F>(
    reader: &mut LineReader<R>,
    out: &mut W,
    format: LineFormat,
    shutdown: F,
) -> Result<TerminalStats>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut stats = TerminalStats::default();

    loop {
        let read = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Interrupted, closing serial port");
                break;
            }
            read = reader.read_line() => read,
        };

        match read {
            Ok(ReadLine::Line(line)) => print_line(out, format, &line, &mut stats).await?,
            Ok(ReadLine::TimedOut(line)) => {
                stats.timeouts += 1;
                if line.is_empty() {
                    trace!("No data within timeout");
                } else {
                    print_line(out, format, &line, &mut stats).await?;
                }
            }
            Ok(ReadLine::Closed) => {
                info!("Serial stream closed");
                break;
            }
            Err(e) if is_transient(&e) => debug!("Transient read error: {}", e),
            Err(e) => return Err(e).context("Failed to read from serial port"),
        }
    }

    Ok(stats)
}
