//! Tool surface: request/response shapes, dispatch, and the stdio transport.

pub mod handlers;
pub mod protocol;
pub mod server;

pub use handlers::{definitions, ToolError, ToolServer};
pub use protocol::{Content, ToolDefinition, ToolRequest, ToolResponse};
pub use server::{serve, serve_stdio};
