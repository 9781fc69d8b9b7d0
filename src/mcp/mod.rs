//! MCP (Model Context Protocol) server for Glimt.
//!
//! Exposes the video tools to AI assistants.
//! Implements JSON-RPC 2.0 over stdio, one message per line.

mod protocol;
mod server;
mod tools;

pub use protocol::Tool;
pub use server::McpServer;
pub use tools::get_tools;
