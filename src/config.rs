// Service configuration: where the Excel service lives and how long a
// single request may take. Values come from the environment with defaults
// that match a service running locally with its stock settings.

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Endpoint of a locally running generation service.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9898/generar_excel";

/// The service gives up on a generation after this many seconds.
pub const SERVER_GENERATION_TIMEOUT_SECS: u64 = 180;

/// Extra time allowed on top of the server-side timeout so the server's own
/// timeout response can still arrive.
pub const CLIENT_MARGIN_SECS: u64 = 10;

pub const ENDPOINT_VAR: &str = "EXCEL_SERVICE_URL";
pub const TIMEOUT_VAR: &str = "EXCEL_SERVICE_TIMEOUT_SECS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(SERVER_GENERATION_TIMEOUT_SECS + CLIENT_MARGIN_SECS),
        }
    }
}

impl ServiceConfig {
    /// Build a config from `EXCEL_SERVICE_URL` and
    /// `EXCEL_SERVICE_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`, so tests
    /// don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            let endpoint = endpoint.trim();
            if endpoint.is_empty() {
                bail!("{} is set but empty", ENDPOINT_VAR);
            }
            config.endpoint = endpoint.to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout = parse_timeout(&raw)
                .with_context(|| format!("Invalid {} value {:?}", TIMEOUT_VAR, raw))?;
        }

        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a whole number of seconds. Zero is rejected: reqwest would treat
/// it as an immediate timeout.
fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().context("expected a whole number of seconds")?;
    if secs == 0 {
        bail!("timeout must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
