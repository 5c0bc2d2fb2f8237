use std::time::Duration;

use anyhow::Context;

use crate::auth::jwt::JwtConfig;

/// Upper bound for `DB_MAX_CONNECTIONS`.
const MAX_DB_CONNECTIONS: u32 = 50;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'text' or 'json', got '{other}'"),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Pool size (default: `20`, clamped to `1..=50`).
    pub db_max_connections: u32,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Budget for a single access-control operation in milliseconds
    /// (default: `5000`).
    pub operation_timeout_ms: u64,
    /// How long to wait for background tasks after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    pub log_format: LogFormat,
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `DB_MAX_CONNECTIONS`    | `20`                       |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `OPERATION_TIMEOUT_MS`  | `5000`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `LOG_FORMAT`            | `text`                     |
    ///
    /// `JWT_SECRET` is required; see [`JwtConfig::from_env`].
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000)?;

        let db_max_connections: u32 = env_or("DB_MAX_CONNECTIONS", 20)?;
        let db_max_connections = db_max_connections.clamp(1, MAX_DB_CONNECTIONS);

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30)?;
        let operation_timeout_ms: u64 = env_or("OPERATION_TIMEOUT_MS", 5000)?;
        anyhow::ensure!(operation_timeout_ms > 0, "OPERATION_TIMEOUT_MS must be positive");
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30)?;

        let log_format = LogFormat::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())?;
        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            host,
            port,
            db_max_connections,
            cors_origins,
            request_timeout_secs,
            operation_timeout_ms,
            shutdown_timeout_secs,
            jwt,
            log_format,
        })
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse("").unwrap(), LogFormat::Text);
        assert_eq!(LogFormat::parse("JSON").unwrap(), LogFormat::Json);
        assert!(LogFormat::parse("yaml").is_err());
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        let value: u64 = env_or("NSI_TEST_SURELY_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
