//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use anyhow::Result;

/// Run the MCP server until stdin closes.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    if settings.api.resolve_api_key().is_none() {
        tracing::warn!(
            "{} is not set; initialize will fail until it is",
            settings.api.api_key_env
        );
    }
    let mut server = McpServer::new(settings);
    server.run().await
}
