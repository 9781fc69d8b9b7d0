//! MCP protocol types (JSON-RPC 2.0).

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const SERVER_ERROR: i32 = -32000;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request or notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and get no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() || self.method.starts_with("notifications/")
    }
}

/// JSON-RPC response. Exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Success carrying any serializable result; a value that fails to
    /// serialize becomes a server error.
    pub fn of(id: Option<Value>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, SERVER_ERROR, e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// MCP Initialize response. Glimt only offers tools, and the list is fixed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: &'static str,
    pub capabilities: Value,
    pub server_info: ServerInfo,
}

impl InitializeResult {
    pub fn new(name: &'static str, version: &'static str) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: serde_json::json!({ "tools": { "listChanged": false } }),
            server_info: ServerInfo { name, version },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Tool definition.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tools list response.
#[derive(Debug, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<Tool>,
}

/// Tool call request params.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool call response: one text block holding a pretty-printed envelope.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: [ToolContent; 1],
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolCallResult {
    pub fn envelope(text: String, is_error: bool) -> Self {
        Self {
            content: [ToolContent::Text { text }],
            is_error,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self::envelope(error.to_string(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(line: &str) -> JsonRpcRequest {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_notification_detection() {
        assert!(request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_notification());
        assert!(request(r#"{"method":"ping"}"#).is_notification());
        assert!(!request(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#).is_notification());
    }

    #[test]
    fn test_error_response_omits_result() {
        let value = serde_json::to_value(JsonRpcResponse::error(Some(json!(3)), METHOD_NOT_FOUND, "nope")).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": 3, "error": { "code": -32601, "message": "nope" } }));
    }

    #[test]
    fn test_tool_result_marks_errors_only() {
        let ok = serde_json::to_value(ToolCallResult::envelope("{}".into(), false)).unwrap();
        assert_eq!(ok, json!({ "content": [{ "type": "text", "text": "{}" }] }));

        let failed = serde_json::to_value(ToolCallResult::failure("boom")).unwrap();
        assert_eq!(failed["isError"], true);
        assert_eq!(failed["content"][0]["text"], "boom");
    }

    #[test]
    fn test_initialize_result_shape() {
        let value = serde_json::to_value(InitializeResult::new("glimt", "0.1.0")).unwrap();
        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(value["serverInfo"]["name"], "glimt");
    }
}
