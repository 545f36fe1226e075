//! Transports that carry JSON-RPC messages to and from a [`Dispatcher`](crate::Dispatcher).

mod sse;
mod stdio;

pub use sse::{MESSAGE_PATH, SSE_PATH, SseTransport};
pub use stdio::{serve_lines, serve_stdio};
