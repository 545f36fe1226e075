//! Newline-delimited JSON-RPC over stdin/stdout.

use std::io;
use std::pin::pin;

use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::MAX_MESSAGE_SIZE;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::protocol::{JsonRpcError, JsonRpcResponse};
use crate::tool::ToolHost;

/// Serve the process's stdin/stdout until stdin closes.
pub async fn serve_stdio<H: ToolHost>(dispatcher: &Dispatcher<H>) -> Result<()> {
    info!("MCP server running on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    serve_lines(dispatcher, stdin, tokio::io::stdout()).await
}

/// Serve one message per line from `reader`, writing responses to `writer`.
///
/// Requests run concurrently and responses are written as they complete,
/// so a slow tool call does not hold up later messages. Returns once the
/// reader is exhausted and every pending request has been answered.
pub async fn serve_lines<H, R, W>(
    dispatcher: &Dispatcher<H>,
    reader: R,
    mut writer: W,
) -> Result<()>
where
    H: ToolHost,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = pin!(frames(reader));
    let mut in_flight = FuturesUnordered::new();
    let mut reading = true;

    loop {
        tokio::select! {
            frame = frames.next(), if reading => match frame {
                Some(Frame::Message(text)) => {
                    if !text.trim().is_empty() {
                        in_flight.push(handle_message(dispatcher, text));
                    }
                }
                Some(Frame::Oversized(size)) => {
                    write_response(&mut writer, &oversized(size)).await?;
                }
                Some(Frame::Failed(e)) => return Err(Error::Io(e)),
                None => {
                    debug!("stdin closed");
                    reading = false;
                }
            },
            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                if let Some(response) = response {
                    write_response(&mut writer, &response).await?;
                }
            }
            else => break,
        }
    }

    Ok(())
}

enum Frame {
    Message(String),
    /// A line longer than `MAX_MESSAGE_SIZE`; carries the bytes discarded.
    Oversized(usize),
    Failed(io::Error),
}

fn frames<R: AsyncBufRead + Unpin>(reader: R) -> impl Stream<Item = Frame> {
    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        match read_frame(&mut reader).await {
            Ok(Some(frame)) => Some((frame, Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Frame::Failed(e), None)),
        }
    })
}

/// Read one line without buffering more than `MAX_MESSAGE_SIZE + 1` bytes.
async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<Frame>> {
    let mut line = Vec::new();
    let limit = MAX_MESSAGE_SIZE as u64 + 1;
    let read = {
        let mut bounded = AsyncReadExt::take(&mut *reader, limit);
        bounded.read_until(b'\n', &mut line).await?
    };
    if read == 0 {
        return Ok(None);
    }

    if line.last() != Some(&b'\n') && line.len() > MAX_MESSAGE_SIZE {
        let size = line.len() + discard_line(reader).await?;
        return Ok(Some(Frame::Oversized(size)));
    }

    Ok(Some(Frame::Message(String::from_utf8_lossy(&line).into_owned())))
}

/// Skip the rest of the current line, returning how many bytes were dropped.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<usize> {
    let mut discarded = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(discarded);
        }

        let (used, done) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        reader.consume(used);
        discarded += used;
        if done {
            return Ok(discarded);
        }
    }
}

async fn handle_message<H: ToolHost>(
    dispatcher: &Dispatcher<H>,
    text: String,
) -> Option<JsonRpcResponse> {
    dispatcher.handle_text(text.trim()).await
}

fn oversized(size: usize) -> JsonRpcResponse {
    let error = Error::MessageTooLarge {
        size,
        max: MAX_MESSAGE_SIZE,
    };
    warn!(%error, "rejecting message");
    JsonRpcResponse::failure(None, JsonRpcError::invalid_request(error.to_string()))
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}
