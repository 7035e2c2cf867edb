mod cli;

use reportalin_mcp::config::{Config, Transport};
use reportalin_mcp::error::exit_code;
use reportalin_mcp::snapshot::SnapshotStore;
use reportalin_mcp::{logging, transport as mcp_transport};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    if raw_args.iter().any(|a| a == "--help" || a == "-h") || raw_args.first().map(|s| s.as_str()) == Some("help") {
        cli::print_help();
        std::process::exit(exit_code::SUCCESS);
    }

    if raw_args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("reportalin-mcp {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(exit_code::SUCCESS);
    }

    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("reportalin-mcp: configuration error: {e}");
            std::process::exit(exit_code::CONFIG_ERROR);
        }
    };

    if let Some(result) = cli::parse_transport_flag(&raw_args) {
        match result {
            Ok(t) => config.transport = t,
            Err(e) => {
                eprintln!("reportalin-mcp: {e}");
                std::process::exit(exit_code::CONFIG_ERROR);
            }
        }
    }
    if let Some(host) = cli::get_flag(&raw_args, "--host") {
        config.host = host;
    }
    if let Some(port) = cli::get_flag(&raw_args, "--port") {
        match port.parse() {
            Ok(p) => config.port = p,
            Err(_) => {
                eprintln!("reportalin-mcp: --port requires a number, got '{port}'");
                std::process::exit(exit_code::CONFIG_ERROR);
            }
        }
    }
    config.reload = config.reload || cli::has_flag(&raw_args, "--reload");

    logging::init(&config.log_level);

    let store = match SnapshotStore::load(config.data_root.clone(), config.dataset_name.clone()).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to load initial snapshot");
            std::process::exit(exit_code::STARTUP_FAILURE);
        }
    };

    if config.reload {
        spawn_reload_watcher(store.clone());
    }

    let result = match config.transport {
        Transport::Stdio => reportalin_mcp::transport::stdio::run(store, config.min_k_anonymity).await,
        Transport::Sse => serve_sse(store, &config).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "server exited with an error");
        std::process::exit(exit_code::IO_ERROR);
    }
}

async fn serve_sse(store: Arc<SnapshotStore>, config: &Config) -> anyhow::Result<()> {
    let router = mcp_transport::build_router(store, config);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "reportalin-mcp listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            sig.recv().await;
        }
    };
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

/// Dev-only `--reload` support: polls the data root's modification time and
/// swaps in a fresh snapshot when it changes. No filesystem-event watcher is
/// wired up; a fixed poll interval is enough for local iteration.
fn spawn_reload_watcher(store: Arc<SnapshotStore>) {
    tokio::spawn(async move {
        let mut last_seen = None;
        let mut interval = tokio::time::interval(Duration::from_secs(2));
        loop {
            interval.tick().await;
            let Ok(metadata) = std::fs::metadata(store.data_root()) else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if last_seen == Some(modified) {
                continue;
            }
            last_seen = Some(modified);
            match store.reload().await {
                Ok(()) => tracing::info!("snapshot reloaded"),
                Err(e) => tracing::warn!(error = %e, "snapshot reload failed, keeping previous snapshot"),
            }
        }
    });
}
