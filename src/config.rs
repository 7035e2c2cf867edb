//! Settings assembled once at startup from `REPORTALIN_*` environment
//! variables, mirroring the base CLI's `load_config()`-then-env-override shape.

use crate::constants;
use crate::error::McpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Sse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Development,
    Staging,
    Production,
}

impl Environment {
    fn from_env_var(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            "development" => Environment::Development,
            _ => Environment::Local,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub reload: bool,
    pub data_root: std::path::PathBuf,
    pub dataset_name: String,
    pub auth_enabled: bool,
    pub auth_token: Option<String>,
    pub log_level: String,
    pub environment: Environment,
    pub min_k_anonymity: usize,
}

impl Config {
    /// Builds configuration from environment variables, falling back to the
    /// defaults in `constants`. CLI flags are applied on top by the caller.
    pub fn from_env() -> Result<Self, McpError> {
        let transport = match std::env::var("REPORTALIN_MCP_TRANSPORT").ok().as_deref() {
            Some("sse") | Some("http") => Transport::Sse,
            Some("stdio") | None => Transport::Stdio,
            Some(other) => {
                return Err(McpError::ConfigInvalid(format!(
                    "unknown transport `{other}`, expected stdio|sse|http"
                )))
            }
        };

        let host = std::env::var("REPORTALIN_MCP_HOST")
            .unwrap_or_else(|_| constants::DEFAULT_HOST.to_string());

        let port = match std::env::var("REPORTALIN_MCP_PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| McpError::ConfigInvalid(format!("invalid port `{raw}`")))?,
            Err(_) => constants::DEFAULT_PORT,
        };
        if !(1024..=65535).contains(&port) {
            return Err(McpError::ConfigInvalid(format!(
                "port {port} out of allowed range 1024..65535"
            )));
        }

        let environment = Environment::from_env_var(
            &std::env::var("REPORTALIN_ENVIRONMENT").unwrap_or_default(),
        );

        let auth_enabled = std::env::var("REPORTALIN_MCP_AUTH_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(!environment.is_local());

        let auth_token = std::env::var("REPORTALIN_MCP_AUTH_TOKEN").ok();
        if auth_enabled && !environment.is_local() {
            match &auth_token {
                Some(t) if t.len() >= constants::MIN_TOKEN_LENGTH => {}
                Some(_) => return Err(McpError::SecretTooWeak),
                None => {
                    return Err(McpError::ConfigInvalid(
                        "REPORTALIN_MCP_AUTH_TOKEN is required outside local environment"
                            .to_string(),
                    ))
                }
            }
        }

        let min_k_anonymity = match std::env::var("REPORTALIN_MIN_K_ANONYMITY") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| McpError::ConfigInvalid(format!("invalid MIN_K_ANONYMITY `{raw}`")))?,
            Err(_) => constants::MIN_K_ANONYMITY,
        };

        let data_root = std::env::var("REPORTALIN_DATA_ROOT")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default());

        let dataset_name =
            std::env::var("REPORTALIN_DATASET_NAME").unwrap_or_else(|_| "RePORT".to_string());

        let log_level =
            std::env::var("REPORTALIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            transport,
            host,
            port,
            reload: false,
            data_root,
            dataset_name,
            auth_enabled,
            auth_token,
            log_level,
            environment,
            min_k_anonymity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_to_local() {
        assert_eq!(Environment::from_env_var(""), Environment::Local);
        assert_eq!(Environment::from_env_var("bogus"), Environment::Local);
    }

    #[test]
    fn environment_parses_known_values() {
        assert_eq!(Environment::from_env_var("production"), Environment::Production);
        assert_eq!(Environment::from_env_var("Staging"), Environment::Staging);
        assert_eq!(Environment::from_env_var("DEVELOPMENT"), Environment::Development);
    }
}
