//! Typed error taxonomy. Boundary code (CLI, top-level `main`) still deals in
//! `anyhow::Result`; everything below the boundary returns `McpError` so callers
//! can match on the kind of failure instead of parsing a message string.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("malformed JSON-RPC message: {0}")]
    ProtocolError(String),

    #[error("request exceeds size limit")]
    RequestTooLarge,

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("rate limited, retry after {retry_after_secs:.2}s")]
    RateLimited { retry_after_secs: f64 },

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params: field `{field}`: {reason}")]
    InvalidParams { field: String, reason: String },

    #[error("tool call timed out")]
    ToolTimeout,

    #[error("internal tool error")]
    ToolInternalError,

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("failed to load {path}: {cause}")]
    LoadError { path: String, cause: String },

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("auth secret does not meet minimum entropy/length requirements")]
    SecretTooWeak,

    #[error("port already in use")]
    PortInUse,
}

impl McpError {
    /// JSON-RPC 2.0 reserved error code for this failure.
    pub fn rpc_code(&self) -> i64 {
        match self {
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams { .. } => -32602,
            McpError::ProtocolError(_) => -32700,
            _ => -32603,
        }
    }

    pub fn to_rpc_error(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.rpc_code(),
            "message": self.to_string(),
        })
    }
}

/// Process exit codes, per the CLI surface contract.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const STARTUP_FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const IO_ERROR: i32 = 3;
}
