use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::verification::DEFAULT_VERIFY_URL;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {source}")]
    Invalid {
        var: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Runtime configuration, loaded from environment variables (a `.env` file is
/// read by the binary before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (`BIND_ADDR`, default `127.0.0.1:3000`).
    pub bind_addr: SocketAddr,
    /// Admin bearer secret (`ADMIN_TOKEN`). Unset disables admin access.
    pub admin_token: Option<String>,
    /// Bot verification secret (`TURNSTILE_SECRET_KEY`). Unset behavior is
    /// governed by `verify_fail_closed`.
    pub turnstile_secret: Option<String>,
    /// Verification endpoint (`TURNSTILE_VERIFY_URL`).
    pub verify_url: String,
    /// Reject signups when verification cannot run (`VERIFY_FAIL_CLOSED`,
    /// default false; set true in production).
    pub verify_fail_closed: bool,
    /// Signup attempts allowed per window (`RATE_LIMIT_MAX_REQUESTS`, default 5).
    pub rate_limit_max_requests: u32,
    /// Rate limit window (`RATE_LIMIT_WINDOW_SECS`, default 900).
    pub rate_limit_window: Duration,
    /// Default log level for the crate (`LOG_LEVEL`, default `info`).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parse_var("BIND_ADDR", "127.0.0.1:3000")?,
            admin_token: optional_var("ADMIN_TOKEN"),
            turnstile_secret: optional_var("TURNSTILE_SECRET_KEY"),
            verify_url: env::var("TURNSTILE_VERIFY_URL")
                .unwrap_or_else(|_| DEFAULT_VERIFY_URL.to_string()),
            verify_fail_closed: parse_var("VERIFY_FAIL_CLOSED", "false")?,
            rate_limit_max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", "5")?,
            rate_limit_window: Duration::from_secs(parse_var("RATE_LIMIT_WINDOW_SECS", "900")?),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("valid default bind addr"),
            admin_token: None,
            turnstile_secret: None,
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            verify_fail_closed: false,
            rate_limit_max_requests: 5,
            rate_limit_window: Duration::from_secs(15 * 60),
            log_level: "info".to_string(),
        }
    }
}

fn optional_var(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(var: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            var,
            source: Box::new(e),
        })
}
