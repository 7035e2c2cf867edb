//! End-to-end scenarios against the dispatch path and, for the transport-level
//! cases, a real server bound to a loopback ephemeral port.

use reportalin_mcp::config::{Config, Environment, Transport};
use reportalin_mcp::rpc;
use reportalin_mcp::security::RotatableSecret;
use reportalin_mcp::snapshot::{Snapshot, SnapshotStore};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

/// Builds a data root with one cleaned table `demographics` holding 100
/// records with `AGE` uniformly spread across `[18, 90]`.
fn fixture_data_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let cleaned = dir.path().join("results/deidentified/RePORT/cleaned");
    std::fs::create_dir_all(&cleaned).unwrap();
    let mut file = std::fs::File::create(cleaned.join("demographics.jsonl")).unwrap();
    for i in 0..100 {
        let age = 18 + (i * (90 - 18) / 99);
        writeln!(file, r#"{{"AGE": {age}, "PATIENT_ID": "p{i}"}}"#).unwrap();
    }
    dir
}

async fn fixture_store(root: &tempfile::TempDir) -> Arc<SnapshotStore> {
    Arc::new(
        SnapshotStore::load(root.path().to_path_buf(), "RePORT".to_string())
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn scenario_1_initialize_reports_protocol_and_server_info() {
    let snapshot = Snapshot::default();
    let msg = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocol_version": "2025-03-26"}});
    let response = rpc::dispatch(&msg, &snapshot, 5);
    assert_eq!(response["result"]["protocolVersion"], json!("2025-03-26"));
    assert_eq!(response["result"]["capabilities"]["tools"], json!(true));
    assert_eq!(response["result"]["capabilities"]["resources"], json!(true));
    assert_eq!(response["result"]["serverInfo"]["name"], json!("reportalin-mcp"));
}

#[tokio::test]
async fn scenario_2_tools_list_returns_the_four_tools_in_order() {
    let snapshot = Snapshot::default();
    let msg = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let response = rpc::dispatch(&msg, &snapshot, 5);
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "prompt_enhancer",
            "combined_search",
            "search_data_dictionary",
            "search_cleaned_dataset",
        ]
    );
}

#[tokio::test]
async fn scenario_3_search_cleaned_dataset_computes_numeric_aggregate_for_age() {
    let root = fixture_data_root();
    let store = fixture_store(&root).await;
    let snapshot = store.current().await;

    let msg = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "search_cleaned_dataset", "arguments": {"variable": "AGE"}},
    });
    let response = rpc::dispatch(&msg, &snapshot, 5);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let result: serde_json::Value = serde_json::from_str(text).unwrap();

    assert_eq!(result["status"], json!("found"));
    let aggregates = result["aggregates"].as_array().expect("aggregates array");
    assert_eq!(aggregates.len(), 1);
    let aggregate = &aggregates[0];
    assert_eq!(aggregate["kind"], json!("numeric"));
    assert_eq!(aggregate["statistics"]["min"], json!(18.0));
    assert_eq!(aggregate["statistics"]["max"], json!(90.0));
    let distribution = aggregate["distribution"].as_array().unwrap();
    assert_eq!(distribution.len(), 10);
    let total: u64 = distribution.iter().map(|b| b["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 100);
}

#[tokio::test]
async fn scenario_5_empty_query_is_invalid_params() {
    let snapshot = Snapshot::default();
    let msg = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "search_data_dictionary", "arguments": {"query": ""}},
    });
    let response = rpc::dispatch(&msg, &snapshot, 5);
    assert_eq!(response["error"]["code"], json!(-32602));
    assert!(response["error"]["message"].as_str().unwrap().contains("query"));
}

async fn spawn_test_server(auth_enabled: bool, token: Option<&str>) -> (String, Arc<SnapshotStore>) {
    let root = fixture_data_root();
    let store = fixture_store(&root).await;
    std::mem::forget(root); // keep the temp dir alive for the server's lifetime

    let config = Config {
        transport: Transport::Sse,
        host: "127.0.0.1".to_string(),
        port: 0,
        reload: false,
        data_root: std::path::PathBuf::new(),
        dataset_name: "RePORT".to_string(),
        auth_enabled,
        auth_token: token.map(str::to_string),
        log_level: "error".to_string(),
        environment: Environment::Local,
        min_k_anonymity: 5,
    };

    let router = reportalin_mcp::transport::build_router(store.clone(), &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (format!("http://{addr}"), store)
}

#[tokio::test]
async fn scenario_4_anonymous_sse_connect_is_rejected() {
    let token = "a".repeat(40);
    let (base_url, _store) = spawn_test_server(true, Some(&token)).await;

    let client = reqwest::Client::new();
    let response = client.get(format!("{base_url}/mcp/sse")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body = response.text().await.unwrap();
    assert!(body.to_lowercase().contains("token"));
}

#[tokio::test]
async fn scenario_6_burst_of_25_requests_allows_20_and_rate_limits_5() {
    let (base_url, _store) = spawn_test_server(false, None).await;
    let client = reqwest::Client::new();

    let mut allowed = 0;
    let mut limited = 0;
    let mut retry_afters = Vec::new();

    for _ in 0..25 {
        let response = client
            .post(format!("{base_url}/mcp/messages?session_id=00000000-0000-0000-0000-000000000000"))
            .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .send()
            .await
            .unwrap();
        match response.status() {
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                if let Some(header) = response.headers().get("Retry-After") {
                    retry_afters.push(header.to_str().unwrap().parse::<f64>().unwrap());
                }
                limited += 1;
            }
            _ => allowed += 1,
        }
    }

    assert_eq!(allowed, 20);
    assert_eq!(limited, 5);
    for retry_after in retry_afters {
        assert!(retry_after > 0.0 && retry_after <= 5.0);
    }
}

#[test]
fn rotatable_secret_matches_within_grace_window_after_rotation() {
    let secret = RotatableSecret::new("a".repeat(40), 300);
    assert!(secret.verify(&"a".repeat(40)));
    secret.rotate("b".repeat(40));
    assert!(secret.verify(&"b".repeat(40)));
    assert!(secret.verify(&"a".repeat(40)));
}
