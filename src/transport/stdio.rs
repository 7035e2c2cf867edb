//! Stdio transport: JSON-RPC frames separated by newlines on stdin/stdout.
//! Auth, rate limiting, and security headers are disabled — the host process
//! is the trust boundary. Grounded on the base repo's
//! `server/mod.rs::process_messages` `tokio::select!` loop.

use crate::rpc;
use crate::snapshot::SnapshotStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub async fn run(store: Arc<SnapshotStore>, min_k: usize) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                handle_line(&line, &store, min_k, &mut stdout).await?;
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, shutting down stdio transport");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received ctrl-c, shutting down stdio transport");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_line(
    line: &str,
    store: &Arc<SnapshotStore>,
    min_k: usize,
    stdout: &mut (impl AsyncWriteExt + Unpin),
) -> anyhow::Result<()> {
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4();

    let parsed: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "malformed JSON-RPC line on stdio");
            return Ok(());
        }
    };

    let method = parsed
        .get("method")
        .and_then(|m| m.as_str())
        .unwrap_or("")
        .to_string();

    let snapshot = store.current().await;
    let response = rpc::dispatch(&parsed, &snapshot, min_k);

    let outcome = if response.get("error").is_some() { "error" } else { "ok" };
    crate::logging::RequestLog {
        request_id: &request_id.to_string(),
        session_id: "stdio",
        method: &method,
        duration_ms: started.elapsed().as_millis(),
        outcome,
    }
    .emit();

    let mut serialized = serde_json::to_string(&response)?;
    serialized.push('\n');
    stdout.write_all(serialized.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
