//! Command-line surface: a handful of flags controlling transport selection
//! and process behavior, in the base repo's flat `get_flag`/`filter_flags`
//! style rather than a full argument-parsing crate.

use reportalin_mcp::config::Transport;

pub fn print_help() {
    println!("reportalin-mcp {}", env!("CARGO_PKG_VERSION"));
    println!("MCP server exposing privacy-preserving clinical-data analytical tools.\n");
    println!("USAGE:");
    println!("  reportalin-mcp [OPTIONS]               Run the MCP server (default: stdio)");
    println!("  reportalin-mcp help | --help | -h      Show this message");
    println!("  reportalin-mcp --version | -V          Show version\n");
    println!("OPTIONS:");
    println!("  --transport <stdio|sse|http>   Transport to serve (default: stdio)");
    println!("  --host <addr>                  Bind address for sse/http (default: 127.0.0.1)");
    println!("  --port <n>                     Bind port for sse/http (default: 8000)");
    println!("  --reload                       Watch the data root and hot-swap snapshots\n");
    println!("ENVIRONMENT:");
    println!("  REPORTALIN_MCP_TRANSPORT       Same as --transport");
    println!("  REPORTALIN_MCP_HOST            Same as --host");
    println!("  REPORTALIN_MCP_PORT            Same as --port");
    println!("  REPORTALIN_ENVIRONMENT         local | staging | production");
    println!("  REPORTALIN_MCP_AUTH_ENABLED    true | false (default: true outside local)");
    println!("  REPORTALIN_MCP_AUTH_TOKEN      Bearer token required outside local env");
    println!("  REPORTALIN_MIN_K_ANONYMITY     Suppression threshold (default: 5)");
    println!("  REPORTALIN_DATA_ROOT           Directory holding the dataset and dictionary");
    println!("  REPORTALIN_DATASET_NAME        Dataset label reported in metadata");
    println!("  REPORTALIN_LOG_LEVEL           trace | debug | info | warn | error");
}

/// `--transport` accepts `stdio`, `sse`, or `http` (an alias for `sse`).
pub fn parse_transport_flag(args: &[String]) -> Option<Result<Transport, String>> {
    get_flag(args, "--transport").map(|raw| match raw.to_ascii_lowercase().as_str() {
        "stdio" => Ok(Transport::Stdio),
        "sse" | "http" => Ok(Transport::Sse),
        other => Err(format!("unknown transport '{other}', expected stdio|sse|http")),
    })
}

pub fn get_flag(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transport_flag_accepts_http_as_sse_alias() {
        let args = vec!["--transport".to_string(), "http".to_string()];
        assert_eq!(parse_transport_flag(&args), Some(Ok(Transport::Sse)));
    }

    #[test]
    fn parse_transport_flag_rejects_unknown_value() {
        let args = vec!["--transport".to_string(), "carrier-pigeon".to_string()];
        assert!(parse_transport_flag(&args).unwrap().is_err());
    }

    #[test]
    fn parse_transport_flag_absent_is_none() {
        let args = vec!["--port".to_string(), "9000".to_string()];
        assert_eq!(parse_transport_flag(&args), None);
    }

    #[test]
    fn has_flag_detects_reload() {
        let args = vec!["--reload".to_string()];
        assert!(has_flag(&args, "--reload"));
        assert!(!has_flag(&args, "--transport"));
    }
}
