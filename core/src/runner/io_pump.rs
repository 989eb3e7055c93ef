use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

/// Split stdout into lines and forward each one. A trailing line without a
/// newline is flushed at EOF.
pub fn pump_lines<R>(
    rd: R,
    line_tx: mpsc::UnboundedSender<String>,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut rd = rd;
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;
        let mut line_buf: Vec<u8> = Vec::with_capacity(8 * 1024);

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: "stdout",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            total += n as u64;

            line_buf.extend_from_slice(&buf[..n]);
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let mut one = line_buf.drain(..=pos).collect::<Vec<u8>>();
                trim_newline(&mut one);
                let _ = line_tx.send(String::from_utf8_lossy(&one).into_owned());
            }
        }

        // EOF flush: deliver the last partial line if it doesn't end with '\n'.
        trim_newline(&mut line_buf);
        if !line_buf.is_empty() {
            let _ = line_tx.send(String::from_utf8_lossy(&line_buf).into_owned());
        }

        Ok(total)
    })
}

/// Collect stderr bytes verbatim into `ring`.
pub fn pump_stderr<R>(rd: R, ring: Arc<RingBytes>) -> JoinHandle<Result<u64, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut rd = rd;
        let mut buf = vec![0u8; 8 * 1024];
        let mut total = 0u64;
        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: "stderr",
                source: e,
            })?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    })
}

fn trim_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}
