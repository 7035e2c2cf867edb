//! Universal Client Adapter (C9): maintains an authenticated SSE session,
//! exposes `list_tools`/`execute_tool`/`list_resources`/`read_resource`, and
//! translates MCP tool descriptors into two LLM provider function-calling
//! shapes.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("tool `{tool_name}` failed: {cause}")]
    ToolExecutionFailed { tool_name: String, cause: String },
    #[error("protocol error: {0}")]
    ProtocolError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderShape {
    /// `{type:"function", function:{name, description, parameters}}`.
    ChatCompletions,
    /// `{name, description, input_schema}`.
    MessagesToolUse,
}

/// Translates one MCP tool descriptor `{name, description, inputSchema}`
/// into the requested provider's function-calling shape.
pub fn translate_schema(tool: &Value, shape: ProviderShape) -> Value {
    let name = tool.get("name").cloned().unwrap_or(Value::Null);
    let description = tool.get("description").cloned().unwrap_or(Value::Null);
    let schema = tool.get("inputSchema").cloned().unwrap_or(json!({}));

    match shape {
        ProviderShape::ChatCompletions => json!({
            "type": "function",
            "function": {"name": name, "description": description, "parameters": schema},
        }),
        ProviderShape::MessagesToolUse => json!({
            "name": name,
            "description": description,
            "input_schema": schema,
        }),
    }
}

/// Concatenates the `text` fields of MCP content blocks in order, separated
/// by newlines; non-text blocks are summarized as `[non-text: <kind>]`.
pub fn flatten_tool_result(content: &[Value]) -> String {
    content
        .iter()
        .map(|block| match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => block.get("text").and_then(|t| t.as_str()).unwrap_or("").to_string(),
            Some(other) => format!("[non-text: {other}]"),
            None => "[non-text: unknown]".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exponential backoff with jitter: base 500ms, cap 30s, jitter +/-20%.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 500u64;
    let cap_ms = 30_000u64;
    let exp = base_ms.saturating_mul(1u64 << attempt.min(16)).min(cap_ms);
    let jitter_fraction = (rand::random::<f64>() - 0.5) * 0.4; // +/-20%
    let jittered = (exp as f64) * (1.0 + jitter_fraction);
    Duration::from_millis(jittered.max(0.0) as u64)
}

struct ConnectionState {
    post_url: String,
    pending: Arc<StdMutex<HashMap<u64, oneshot::Sender<Value>>>>,
    _reader_task: tokio::task::JoinHandle<()>,
}

pub struct McpClientAdapter {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    next_id: AtomicU64,
    connection: tokio::sync::Mutex<Option<ConnectionState>>,
}

impl McpClientAdapter {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        McpClientAdapter {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            next_id: AtomicU64::new(1),
            connection: tokio::sync::Mutex::new(None),
        }
    }

    /// Opens the SSE stream, waits for the `endpoint` frame, and spawns a
    /// background task that demultiplexes `message` frames to whichever
    /// in-flight request is waiting on that `id`.
    pub async fn connect(&self) -> Result<(), AdapterError> {
        let sse_url = format!("{}/mcp/sse", self.base_url);
        let mut req = self.http.get(&sse_url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdapterError::AuthenticationFailed);
        }
        if !response.status().is_success() {
            return Err(AdapterError::ConnectionFailed(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let pending: Arc<StdMutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(StdMutex::new(HashMap::new()));
        let pending_for_task = pending.clone();
        let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();

        let reader_task = tokio::spawn(async move {
            use futures_core_shim::StreamExt;
            let mut stream = response.bytes_stream();
            let mut buf = String::new();
            let mut endpoint_tx = Some(endpoint_tx);

            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buf.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buf.find("\n\n") {
                    let frame = buf[..pos].to_string();
                    buf.drain(..pos + 2);
                    let (event, data) = parse_sse_frame(&frame);

                    match event.as_deref() {
                        Some("endpoint") => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(data);
                            }
                        }
                        Some("message") => {
                            if let Ok(value) = serde_json::from_str::<Value>(&data) {
                                if let Some(id) = value.get("id").and_then(|i| i.as_u64()) {
                                    if let Some(sender) =
                                        pending_for_task.lock().expect("pending lock poisoned").remove(&id)
                                    {
                                        let _ = sender.send(value);
                                    }
                                }
                            }
                        }
                        Some("close") => break,
                        _ => {}
                    }
                }
            }
        });

        let endpoint = endpoint_rx
            .await
            .map_err(|_| AdapterError::ProtocolError("stream closed before endpoint frame".to_string()))?;
        let post_url = format!("{}{}", self.base_url, endpoint);

        *self.connection.lock().await = Some(ConnectionState {
            post_url,
            pending,
            _reader_task: reader_task,
        });

        self.request("initialize", json!({"protocolVersion": crate::constants::PROTOCOL_VERSION}))
            .await?;

        Ok(())
    }

    /// Reconnects with exponential backoff (base 500ms, cap 30s, jitter
    /// +/-20%) until `max_attempts` is exhausted.
    pub async fn connect_with_retry(&self, max_attempts: u32) -> Result<(), AdapterError> {
        let mut last_err = AdapterError::ConnectionFailed("no attempts made".to_string());
        for attempt in 0..max_attempts {
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    last_err = e;
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
        }
        Err(last_err)
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AdapterError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let guard = self.connection.lock().await;
        let Some(conn) = guard.as_ref() else {
            return Err(AdapterError::ConnectionFailed("not connected".to_string()));
        };

        let (tx, rx) = oneshot::channel();
        conn.pending.lock().expect("pending lock poisoned").insert(id, tx);

        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        let mut req = self.http.post(&conn.post_url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
        drop(guard);

        let response = tokio::time::timeout(Duration::from_secs(30), rx)
            .await
            .map_err(|_| AdapterError::ProtocolError("timed out awaiting response".to_string()))?
            .map_err(|_| AdapterError::ProtocolError("response channel closed".to_string()))?;

        if let Some(error) = response.get("error") {
            return Err(AdapterError::ProtocolError(error.to_string()));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    pub async fn list_tools(&self) -> Result<Vec<Value>, AdapterError> {
        let result = self.request("tools/list", json!({})).await?;
        Ok(result
            .get("tools")
            .and_then(|t| t.as_array())
            .cloned()
            .unwrap_or_default())
    }

    pub async fn list_tools_for_provider(&self, shape: ProviderShape) -> Result<Vec<Value>, AdapterError> {
        Ok(self
            .list_tools()
            .await?
            .iter()
            .map(|t| translate_schema(t, shape))
            .collect())
    }

    pub async fn execute_tool(&self, name: &str, arguments: Value) -> Result<String, AdapterError> {
        let result = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await
            .map_err(|e| AdapterError::ToolExecutionFailed {
                tool_name: name.to_string(),
                cause: e.to_string(),
            })?;
        let content = result
            .get("content")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(flatten_tool_result(&content))
    }

    pub async fn list_resources(&self) -> Result<Vec<Value>, AdapterError> {
        let result = self.request("resources/list", json!({})).await?;
        Ok(result
            .get("resources")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default())
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, AdapterError> {
        self.request("resources/read", json!({"uri": uri})).await
    }
}

fn parse_sse_frame(frame: &str) -> (Option<String>, String) {
    let mut event = None;
    let mut data_lines = Vec::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim().to_string());
        }
    }
    (event, data_lines.join("\n"))
}

/// `reqwest`'s `bytes_stream()` returns an object implementing
/// `futures_core::Stream`; `tokio_stream::StreamExt` supplies the same
/// `.next()` combinator without adding a direct `futures` dependency.
mod futures_core_shim {
    pub use tokio_stream::StreamExt;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_schema_chat_completions_shape() {
        let tool = json!({"name": "combined_search", "description": "d", "inputSchema": {"type": "object"}});
        let translated = translate_schema(&tool, ProviderShape::ChatCompletions);
        assert_eq!(translated["type"], json!("function"));
        assert_eq!(translated["function"]["name"], json!("combined_search"));
        assert_eq!(translated["function"]["parameters"], json!({"type": "object"}));
    }

    #[test]
    fn translate_schema_messages_tool_use_shape() {
        let tool = json!({"name": "combined_search", "description": "d", "inputSchema": {"type": "object"}});
        let translated = translate_schema(&tool, ProviderShape::MessagesToolUse);
        assert_eq!(translated["name"], json!("combined_search"));
        assert_eq!(translated["input_schema"], json!({"type": "object"}));
        assert!(translated.get("function").is_none());
    }

    #[test]
    fn translate_schema_round_trips_to_a_fixed_point() {
        let tool = json!({"name": "t", "description": "d", "inputSchema": {"type": "object", "properties": {}}});
        let once = translate_schema(&tool, ProviderShape::ChatCompletions);
        let twice = translate_schema(
            &json!({
                "name": once["function"]["name"],
                "description": once["function"]["description"],
                "inputSchema": once["function"]["parameters"],
            }),
            ProviderShape::ChatCompletions,
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn flatten_concatenates_text_blocks_with_newlines() {
        let content = vec![json!({"type": "text", "text": "a"}), json!({"type": "text", "text": "b"})];
        assert_eq!(flatten_tool_result(&content), "a\nb");
    }

    #[test]
    fn flatten_summarizes_non_text_blocks() {
        let content = vec![json!({"type": "image", "data": "..."})];
        assert_eq!(flatten_tool_result(&content), "[non-text: image]");
    }

    #[test]
    fn backoff_delay_respects_base_and_cap() {
        let d0 = backoff_delay(0);
        assert!(d0.as_millis() >= 400 && d0.as_millis() <= 600);
        let d_large = backoff_delay(20);
        assert!(d_large.as_millis() <= 36_000);
    }

    #[test]
    fn parse_sse_frame_extracts_event_and_data() {
        let (event, data) = parse_sse_frame("event: message\ndata: {\"a\":1}");
        assert_eq!(event.as_deref(), Some("message"));
        assert_eq!(data, r#"{"a":1}"#);
    }
}
