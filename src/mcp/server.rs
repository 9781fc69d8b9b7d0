//! MCP server implementation.

use super::protocol::*;
use super::tools::get_tools;
use crate::config::Settings;
use crate::tools::ToolContext;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

const SERVER_NAME: &str = "glimt";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Glimt.
pub struct McpServer {
    settings: Settings,
    context: Option<ToolContext>,
}

impl McpServer {
    /// Create a new MCP server. The API client is built on `initialize`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            context: None,
        }
    }

    /// Create a server around an existing tool context.
    pub fn with_context(context: ToolContext) -> Self {
        Self {
            settings: context.settings().clone(),
            context: Some(context),
        }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!("Glimt MCP server starting");

        while let Some(line) = lines.next_line().await? {
            if let Some(reply) = self.handle_line(&line).await {
                write_line(&mut stdout, &reply).await?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one line of input, returning the serialized reply if any.
    pub async fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await?,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                JsonRpcResponse::error(None, PARSE_ERROR, "Parse error")
            }
        };

        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Handle a single JSON-RPC message. Notifications get no response.
    async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "request");

        if request.is_notification() {
            match request.method.as_str() {
                "notifications/initialized" | "initialized" => debug!("client initialized"),
                other => debug!("ignoring notification {}", other),
            }
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    /// Build the tool context if it does not exist yet.
    fn ensure_context(&mut self) -> crate::Result<&ToolContext> {
        if self.context.is_none() {
            let context = ToolContext::from_settings(self.settings.clone())?;
            info!("API client initialized for {}", self.settings.api.base_url);
            self.context = Some(context);
        }
        self.context
            .as_ref()
            .ok_or_else(|| crate::GlimtError::Config("tool context unavailable".to_string()))
    }

    /// Handle initialize request.
    fn handle_initialize(&mut self, id: Option<Value>) -> JsonRpcResponse {
        if let Err(e) = self.ensure_context() {
            error!("Failed to initialize: {}", e);
            return JsonRpcResponse::error(id, SERVER_ERROR, format!("Init failed: {}", e));
        }

        JsonRpcResponse::of(id, InitializeResult::new(SERVER_NAME, SERVER_VERSION))
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::of(id, ToolsListResult { tools: get_tools() })
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&mut self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        let context = match self.ensure_context() {
            Ok(context) => context,
            Err(e) => return JsonRpcResponse::of(id, ToolCallResult::failure(e)),
        };

        let result = match context.call(&params.name, params.arguments).await {
            Ok(output) => match output.to_pretty_json() {
                Ok(text) => ToolCallResult::envelope(text, output.is_error()),
                Err(e) => ToolCallResult::failure(e),
            },
            Err(e) => {
                if e.is_usage() {
                    debug!("Rejected tool call {}: {}", params.name, e);
                } else {
                    warn!("Tool call {} failed: {}", params.name, e);
                }
                ToolCallResult::failure(e)
            }
        };
        JsonRpcResponse::of(id, result)
    }
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryVideoApi;
    use std::sync::Arc;

    fn server() -> (Arc<MemoryVideoApi>, McpServer) {
        let api = Arc::new(MemoryVideoApi::new());
        let context = ToolContext::new(api.clone(), Settings::default());
        (api, McpServer::with_context(context))
    }

    async fn reply(server: &mut McpServer, line: &str) -> Value {
        let text = server.handle_line(line).await.unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let (_api, mut server) = server();
        let init = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        )
        .await;
        assert_eq!(init["result"]["serverInfo"]["name"], "glimt");
        assert_eq!(init["id"], 1);

        let list = reply(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 10);
        assert!(list["result"]["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let (_api, mut server) = server();
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(server.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (_api, mut server) = server();
        let parse = reply(&mut server, "{not json").await;
        assert_eq!(parse["error"]["code"], PARSE_ERROR);

        let unknown = reply(&mut server, r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let bad = reply(&mut server, r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#).await;
        assert_eq!(bad["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_call_marks_error_envelopes() {
        let (api, mut server) = server();
        let call = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"extract_video_entities","arguments":{"url":"https://cdn.example.com/a.mp4"}}}"#,
        )
        .await;
        assert_eq!(call["result"]["isError"], true);
        let text = call["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["segment_level_entities"]["total_pages"], 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_success() {
        let (api, mut server) = server();
        api.add_collection("c1", "entities");
        let call = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"list_collections"}}"#,
        )
        .await;
        assert!(call["result"].get("isError").is_none());
        let text = call["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("\"c1\""));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (_api, mut server) = server();
        let call = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
        )
        .await;
        assert_eq!(call["result"]["isError"], true);
    }
}
