//! Client configuration
//!
//! Read once at startup and passed explicitly into the transport.

use crate::error::ClientError;
use crate::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PREDICT_ENDPOINT: &str = "/predict";
pub const DEFAULT_CHAT_ENDPOINT: &str = "/chat";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub predict_endpoint: String,
    pub chat_endpoint: String,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            predict_endpoint: DEFAULT_PREDICT_ENDPOINT.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl ClientConfig {
    /// Build from process environment (call `dotenv::dotenv()` first if a
    /// `.env` file should be honoured)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend_url = get("LOAN_BACKEND_URL").unwrap_or(defaults.backend_url);
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "LOAN_BACKEND_URL must be an http(s) URL, got '{}'",
                backend_url
            )));
        }

        let pool_max_idle_per_host = match get("LOAN_POOL_MAX_IDLE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("LOAN_POOL_MAX_IDLE is not a count: '{}'", raw))
            })?,
            None => defaults.pool_max_idle_per_host,
        };

        let pool_idle_timeout = match get("LOAN_POOL_IDLE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                ClientError::Config(format!(
                    "LOAN_POOL_IDLE_TIMEOUT_SECS is not a number of seconds: '{}'",
                    raw
                ))
            })?),
            None => defaults.pool_idle_timeout,
        };

        Ok(Self {
            backend_url,
            predict_endpoint: get("LOAN_PREDICT_ENDPOINT").unwrap_or(defaults.predict_endpoint),
            chat_endpoint: get("LOAN_CHAT_ENDPOINT").unwrap_or(defaults.chat_endpoint),
            pool_max_idle_per_host,
            pool_idle_timeout,
        })
    }
}
