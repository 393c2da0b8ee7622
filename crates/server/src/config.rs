//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PEERBOOK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PEERBOOK_HOST` - Bind address (default: 127.0.0.1)
//! - `PEERBOOK_PORT` - Listen port (default: 21114)
//! - `PEERBOOK_REFERENCE_TZ` - Zone that decides which calendar day a report
//!   belongs to; an IANA name (`Asia/Shanghai`) or offset (`+08:00`, `UTC+8`).
//!   Default: `+08:00`
//! - `PEERBOOK_DB_MAX_CONNECTIONS` - Connection pool size (default: 10)
//! - `PEERBOOK_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use peerbook_core::ReferenceZone;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Zone in which report dates are computed
    pub reference_zone: ReferenceZone,
    /// Upper bound on pooled database connections
    pub db_max_connections: u32,
    /// Log line format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("PEERBOOK_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("PEERBOOK_DATABASE_URL".to_string()))?;

        let host = parse_or_default(&lookup, "PEERBOOK_HOST", "127.0.0.1", str::parse::<IpAddr>)?;
        let port = parse_or_default(&lookup, "PEERBOOK_PORT", "21114", str::parse::<u16>)?;
        let reference_zone = parse_or_default(
            &lookup,
            "PEERBOOK_REFERENCE_TZ",
            "+08:00",
            ReferenceZone::parse,
        )?;
        let db_max_connections =
            parse_or_default(&lookup, "PEERBOOK_DB_MAX_CONNECTIONS", "10", str::parse::<u32>)?;
        if db_max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PEERBOOK_DB_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let log_format = parse_or_default(&lookup, "PEERBOOK_LOG_FORMAT", "pretty", parse_log_format)?;

        let sentry_dsn = lookup("SENTRY_DSN").filter(|v| !v.is_empty());
        let sentry_environment = lookup("SENTRY_ENVIRONMENT");
        let sentry_sample_rate =
            parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", "1.0", str::parse::<f32>)?;
        let sentry_traces_sample_rate =
            parse_or_default(&lookup, "SENTRY_TRACES_SAMPLE_RATE", "0.0", str::parse::<f32>)?;

        Ok(Self {
            database_url,
            host,
            port,
            reference_zone,
            db_max_connections,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or_default<T, E: std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "pretty" | "text" => Ok(LogFormat::Pretty),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use chrono::{TimeZone, Utc};
    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook")]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:21114");
        assert_eq!(config.reference_zone, ReferenceZone::default());
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PEERBOOK_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fly/peerbook")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fly/peerbook");
    }

    #[test]
    fn test_reference_zone_is_configurable() {
        let config = load(&[
            ("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook"),
            ("PEERBOOK_REFERENCE_TZ", "UTC"),
        ])
        .unwrap();

        let late_evening = Utc.with_ymd_and_hms(2023, 12, 31, 16, 30, 0).unwrap();
        assert_eq!(
            config.reference_zone.label_for(late_evening).to_string(),
            "2023-12-31"
        );
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[
            ("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook"),
            ("PEERBOOK_REFERENCE_TZ", "Nowhere/Special"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PEERBOOK_REFERENCE_TZ"));

        let err = load(&[
            ("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook"),
            ("PEERBOOK_PORT", "not-a-port"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PEERBOOK_PORT"));

        let err = load(&[
            ("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook"),
            ("PEERBOOK_DB_MAX_CONNECTIONS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_json_log_format() {
        let config = load(&[
            ("PEERBOOK_DATABASE_URL", "postgres://localhost/peerbook"),
            ("PEERBOOK_LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[("PEERBOOK_DATABASE_URL", "postgres://user:hunter2@db/peerbook")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
