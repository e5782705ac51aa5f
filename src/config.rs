//! Operator configuration parsed from environment variables.

use store::HttpTimeouts;
use store::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

pub const DEFAULT_API_URL: &str = "http://localhost:5001";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: `{value}`")]
    Parse { var: &'static str, value: String },
    #[error("render scale must be positive, got {0}")]
    RenderScale(f64),
}

impl canvas::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "E_CONFIG_PARSE",
            Self::RenderScale(_) => "E_CONFIG_RENDER_SCALE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL without the `/api` prefix or a trailing slash.
    pub api_url: String,
    pub timeouts: HttpTimeouts,
    pub render_scale: f64,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `ANCHORSTAMP_API_URL`: default `http://localhost:5001`
    /// - `ANCHORSTAMP_REQUEST_TIMEOUT_SECS`: default 60
    /// - `ANCHORSTAMP_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ANCHORSTAMP_RENDER_SCALE`: default 2.0
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var("ANCHORSTAMP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeouts = HttpTimeouts {
            request_secs: env_parse("ANCHORSTAMP_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse("ANCHORSTAMP_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let render_scale = env_parse("ANCHORSTAMP_RENDER_SCALE", canvas::consts::RENDER_SCALE)?;
        Self { api_url, timeouts, render_scale }.checked()
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, api_url: Option<String>, render_scale: Option<f64>) -> Result<Self, ConfigError> {
        if let Some(url) = api_url {
            self.api_url = url;
        }
        if let Some(scale) = render_scale {
            self.render_scale = scale;
        }
        self.checked()
    }

    fn checked(mut self) -> Result<Self, ConfigError> {
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(ConfigError::RenderScale(self.render_scale));
        }
        Ok(self)
    }
}

fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Parse { var, value }),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
