//! Tool/resource registry (C8): JSON-RPC method dispatch over a
//! `serde_json::Value` envelope, the same string-match-on-`method` shape the
//! base repo uses in `server/mod.rs::dispatch`.

use crate::constants;
use crate::error::McpError;
use crate::snapshot::Snapshot;
use crate::tools;
use serde_json::{json, Value};

pub fn success(id: &Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

pub fn failure(id: &Value, err: &McpError) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "error": err.to_rpc_error()})
}

/// Dispatches one JSON-RPC request against `snapshot`. Returns `None` for
/// JSON-RPC notifications (no `id`) whose result is intentionally discarded
/// by the caller — every branch here always has an `id` in the request
/// shapes this crate accepts, so this always returns `Some`.
pub fn dispatch(msg: &Value, snapshot: &Snapshot, min_k: usize) -> Value {
    let id = msg.get("id").cloned().unwrap_or(Value::Null);
    let method = msg.get("method").and_then(|m| m.as_str()).unwrap_or("");

    let outcome = match method {
        "initialize" => Ok(on_initialize()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({"tools": tools::schema::tool_descriptors()})),
        "tools/call" => on_tools_call(msg, snapshot, min_k),
        "resources/list" => Ok(crate::resources::list()),
        "resources/read" => on_resources_read(msg, snapshot),
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    match outcome {
        Ok(result) => success(&id, result),
        Err(err) => failure(&id, &err),
    }
}

fn on_initialize() -> Value {
    json!({
        "protocolVersion": constants::PROTOCOL_VERSION,
        "capabilities": {"tools": true, "resources": true, "logging": true},
        "serverInfo": {"name": constants::SERVER_NAME, "version": constants::server_version()},
    })
}

fn on_tools_call(msg: &Value, snapshot: &Snapshot, min_k: usize) -> Result<Value, McpError> {
    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    let name = params
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| McpError::InvalidParams {
            field: "name".to_string(),
            reason: "missing tool name".to_string(),
        })?;
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let result = tools::call_tool(name, &arguments, snapshot, min_k).map_err(|err| {
        if matches!(err, McpError::ToolInternalError) {
            tracing::error!(
                tool = name,
                arguments = %crate::redact::redact(&arguments),
                "tool call failed internally"
            );
        }
        err
    })?;
    Ok(json!({
        "content": [{"type": "text", "text": serde_json::to_string(&result).unwrap_or_default()}],
    }))
}

fn on_resources_read(msg: &Value, snapshot: &Snapshot) -> Result<Value, McpError> {
    let uri = msg
        .get("params")
        .and_then(|p| p.get("uri"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| McpError::InvalidParams {
            field: "uri".to_string(),
            reason: "missing resource uri".to_string(),
        })?;
    crate::resources::read(uri, snapshot)
        .ok_or_else(|| McpError::DataUnavailable(format!("no such resource: {uri}")))
}
