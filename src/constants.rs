//! Single source of truth for the defaults the rest of the crate reads from.

pub const SERVER_NAME: &str = "reportalin-mcp";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub const DEFAULT_TRANSPORT: &str = "stdio";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

pub const MIN_K_ANONYMITY: usize = 5;
pub const MAX_RESULTS_PER_QUERY: usize = 100;

pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 5;
pub const SSE_KEEPALIVE_INTERVAL_SECS: u64 = 15;
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 600;

pub const DEFAULT_RATE_LIMIT_CAPACITY: f64 = 20.0;
pub const DEFAULT_RATE_LIMIT_REFILL_PER_SEC: f64 = 1.0;

pub const TOKEN_ROTATION_GRACE_PERIOD_SECONDS: u64 = 300;
pub const MIN_TOKEN_LENGTH: usize = 32;

pub const MAX_QUERY_BYTES: usize = 2 * 1024;
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub const DATA_DICTIONARY_DIR: &str = "results/data_dictionary_mappings";
pub const DEIDENTIFIED_DIR: &str = "results/deidentified";

pub const MAX_COMBINED_SEARCH_VARIABLES: usize = 30;
pub const MAX_COMBINED_SEARCH_CODELISTS: usize = 10;
pub const MAX_COMBINED_SEARCH_STATS: usize = 8;
pub const MAX_DICTIONARY_VARIABLES: usize = 50;
pub const MAX_DICTIONARY_CODELISTS: usize = 10;
pub const MAX_CODELIST_EXAMPLES: usize = 15;
pub const MAX_SEARCH_TERMS: usize = 15;
pub const MAX_HISTOGRAM_BINS: usize = 10;
pub const MAX_CATEGORICAL_VALUES: usize = 20;

pub fn server_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
