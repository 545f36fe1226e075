//! Tool host trait.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::protocol::{CallToolResult, Tool};

/// Errors that can occur during tool execution.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),
    #[error("Invalid arguments: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Trait for tool execution hosts.
///
/// Implementations provide tool definitions and execute tool calls.
/// This is the boundary between protocol dispatch and side effects.
pub trait ToolHost: Send + Sync {
    /// Tools advertised by tools/list.
    fn tools(&self) -> &[Tool];

    /// Execute a tool call.
    fn execute(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<CallToolResult, ToolError>> + Send;
}
