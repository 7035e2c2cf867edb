//! ReAct agent driver (C10): build messages, call the LLM with the tool
//! list, execute any requested tool calls through the adapter, and loop
//! until the LLM returns a plain answer or the tool-call budget runs out.

use crate::client::adapter::{AdapterError, McpClientAdapter};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
    ToolResult { tool_call_id: String, content: String },
}

/// One requested tool invocation inside an `LlmTurn::ToolCalls` turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmTurn {
    FinalAnswer(String),
    ToolCalls(Vec<ToolCall>),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("llm call failed: {0}")]
    LlmFailed(String),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("cancelled")]
    Cancelled,
}

/// Seam isolating the outbound LLM call behind a trait boundary, the same
/// way the reference pool keeps provider calls out of orchestration code.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn call(&self, messages: &[Message], tools: &[Value]) -> Result<LlmTurn, AgentError>;
}

pub struct AgentDriver {
    adapter: Arc<McpClientAdapter>,
    llm: Arc<dyn LlmClient>,
    max_tool_calls: u32,
    cancelled: Arc<AtomicBool>,
}

impl AgentDriver {
    pub fn new(adapter: Arc<McpClientAdapter>, llm: Arc<dyn LlmClient>, max_tool_calls: u32) -> Self {
        AgentDriver {
            adapter,
            llm,
            max_tool_calls,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A clone-able handle a caller can use to cancel the run from another
    /// task. Cancellation is honored only between tool calls, never
    /// mid-execution.
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub async fn run(&self, tools: Vec<Value>, mut messages: Vec<Message>) -> Result<String, AgentError> {
        let mut remaining = self.max_tool_calls;

        loop {
            if self.cancelled.load(Ordering::Relaxed) {
                return Err(AgentError::Cancelled);
            }

            let turn = self.llm.call(&messages, &tools).await?;

            let calls = match turn {
                LlmTurn::FinalAnswer(text) => return Ok(text),
                LlmTurn::ToolCalls(calls) => calls,
            };

            if remaining == 0 {
                messages.push(Message::System(
                    "tool budget exhausted; produce a final answer now".to_string(),
                ));
                let turn = self.llm.call(&messages, &[]).await?;
                return match turn {
                    LlmTurn::FinalAnswer(text) => Ok(text),
                    LlmTurn::ToolCalls(_) => Ok(
                        "Unable to produce a final answer within the tool call budget.".to_string(),
                    ),
                };
            }

            for call in calls {
                if remaining == 0 {
                    break;
                }
                remaining -= 1;

                let result = self.adapter.execute_tool(&call.name, call.arguments).await;
                let content = match result {
                    Ok(text) => text,
                    Err(e) => format!("tool call failed: {e}"),
                };
                messages.push(Message::ToolResult {
                    tool_call_id: call.id,
                    content,
                });

                if self.cancelled.load(Ordering::Relaxed) {
                    return Err(AgentError::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedLlm {
        turns: Mutex<Vec<LlmTurn>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn call(&self, _messages: &[Message], _tools: &[Value]) -> Result<LlmTurn, AgentError> {
            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                return Ok(LlmTurn::FinalAnswer("out of script".to_string()));
            }
            Ok(turns.remove(0))
        }
    }

    fn adapter() -> Arc<McpClientAdapter> {
        Arc::new(McpClientAdapter::new("http://localhost:0", None))
    }

    #[tokio::test]
    async fn terminates_immediately_on_final_answer() {
        let llm = Arc::new(ScriptedLlm {
            turns: Mutex::new(vec![LlmTurn::FinalAnswer("done".to_string())]),
        });
        let driver = AgentDriver::new(adapter(), llm, 5);
        let result = driver.run(vec![], vec![Message::User("hi".to_string())]).await.unwrap();
        assert_eq!(result, "done");
    }

    #[tokio::test]
    async fn budget_exhaustion_forces_a_final_answer_call() {
        let calls = vec![LlmTurn::ToolCalls(vec![ToolCall {
            id: "1".to_string(),
            name: "combined_search".to_string(),
            arguments: serde_json::json!({}),
        }])];
        // One tool-call turn consumes the single-call budget, then the
        // driver forces a final-answer-only follow-up call.
        let mut turns = calls;
        turns.push(LlmTurn::FinalAnswer("forced answer".to_string()));
        let llm = Arc::new(ScriptedLlm { turns: Mutex::new(turns) });
        let driver = AgentDriver::new(adapter(), llm, 1);
        let result = driver.run(vec![], vec![Message::User("hi".to_string())]).await.unwrap();
        assert_eq!(result, "forced answer");
    }

    #[tokio::test]
    async fn cancellation_is_honored_between_tool_calls() {
        let llm = Arc::new(ScriptedLlm {
            turns: Mutex::new(vec![LlmTurn::ToolCalls(vec![ToolCall {
                id: "1".to_string(),
                name: "combined_search".to_string(),
                arguments: serde_json::json!({}),
            }])]),
        });
        let driver = AgentDriver::new(adapter(), llm, 5);
        driver.cancellation_handle().store(true, Ordering::Relaxed);
        let result = driver.run(vec![], vec![Message::User("hi".to_string())]).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
