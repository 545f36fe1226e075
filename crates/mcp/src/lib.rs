//! MCP (Model Context Protocol) server library.
//!
//! This crate provides the server side of MCP: protocol types, a
//! [`Dispatcher`] that routes requests to a [`ToolHost`], per-connection
//! sessions, and the SSE and stdio transports.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mcp::{CallToolResult, Dispatcher, ServerInfo, SseTransport, Tool, ToolError, ToolHost};
//!
//! struct Hello(Vec<Tool>);
//!
//! impl ToolHost for Hello {
//!     fn tools(&self) -> &[Tool] {
//!         &self.0
//!     }
//!
//!     async fn execute(
//!         &self,
//!         _name: &str,
//!         _arguments: serde_json::Value,
//!     ) -> Result<CallToolResult, ToolError> {
//!         Ok(CallToolResult::text("hello"))
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! let info = ServerInfo::new("hello", "0.1.0");
//! let dispatcher = Arc::new(Dispatcher::new(Hello(Vec::new()), info));
//! SseTransport::new("127.0.0.1:3000")
//!     .serve(dispatcher, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod error;
mod protocol;
mod session;
mod tool;
pub mod transport;

pub use dispatch::{Dispatcher, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId, ServerCapabilities, ServerInfo,
    Tool, ToolContent, ToolsCapability,
};
pub use session::{Session, SessionId, SessionRegistry};
pub use tool::{ToolError, ToolHost};
pub use transport::{SseTransport, serve_stdio};

/// Maximum accepted size of one inbound message (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
