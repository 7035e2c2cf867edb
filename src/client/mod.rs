//! Universal Client Adapter (C9) and ReAct agent driver (C10): the other
//! side of the wire from `transport`. Reuses the base repo's existing
//! `reqwest` dependency for both the SSE client leg and outbound LLM calls.

pub mod adapter;
pub mod agent;

pub use adapter::{AdapterError, McpClientAdapter, ProviderShape};
pub use agent::{AgentDriver, AgentError, LlmClient, LlmTurn, Message, ToolCall};
