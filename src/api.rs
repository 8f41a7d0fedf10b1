// API client module: a small blocking HTTP client that asks the Excel
// generation service to build the workbook for a project folder.
// The request is synchronous; the caller blocks until the service answers
// or the configured wait runs out.

use crate::config::ServiceConfig;
use crate::outcome::{DispatchError, ErrorDetails, GeneratedFile, Outcome};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as _;
use std::io;
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// Blocking client bound to one service endpoint.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ServiceConfig,
}

/// Request payload. The service expects the Spanish field name.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    #[serde(rename = "ruta_proyecto")]
    pub project_path: String,
}

/// Reply from the service on a 2xx answer. Fields are kept as
/// `serde_json::Value` because the service only promises their names,
/// not their types.
#[derive(Deserialize, Debug)]
struct ServiceReply {
    status: Option<Value>,
    message: Option<Value>,
    file_path: Option<Value>,
}

impl ApiClient {
    /// Build a client from `ServiceConfig::from_env`.
    pub fn from_env() -> Result<Self> {
        let config = ServiceConfig::from_env()?;
        Self::new(config)
    }

    /// Build a client whose every request is bounded by `config.timeout`.
    /// A service on the loopback interface is always reached directly,
    /// even when `HTTP_PROXY` is set.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if is_loopback(&config.endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(ApiClient { client, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// POST `{"ruta_proyecto": project_path}` to the service and classify
    /// whatever comes back. Every failure ends up as a `DispatchError`.
    pub fn dispatch(&self, project_path: &str) -> Outcome {
        if project_path.is_empty() {
            warn!("refusing to dispatch an empty project path");
            return Err(DispatchError::InvalidInput);
        }

        let request = GenerateRequest {
            project_path: project_path.to_string(),
        };
        info!(endpoint = %self.config.endpoint, path = project_path, "requesting workbook generation");
        debug!(?request, "payload");

        // `.json()` also sets `Content-Type: application/json`.
        let res = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .map_err(classify_transport)?;

        let status = res.status();
        let body = res.text().map_err(classify_transport)?;

        if !status.is_success() {
            let err = DispatchError::Http {
                code: status.as_u16(),
                details: ErrorDetails::from_body(&body),
            };
            warn!(code = status.as_u16(), "service answered with an error status");
            return Err(err);
        }

        let outcome = interpret_reply(&body);
        match &outcome {
            Ok(generated) => info!(file = %generated.file_path, "workbook generated"),
            Err(err) => warn!(%err, "generation did not succeed"),
        }
        outcome
    }
}

/// One-shot dispatch. A client that cannot even be built is reported as
/// `DispatchError::Unexpected` instead of an error return.
pub fn dispatch(config: ServiceConfig, project_path: &str) -> Outcome {
    // Also checked in `ApiClient::dispatch`; repeated here so an empty path
    // never builds a client, even one that would fail to build.
    if project_path.is_empty() {
        return Err(DispatchError::InvalidInput);
    }
    match ApiClient::new(config) {
        Ok(api) => api.dispatch(project_path),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "could not create HTTP client");
            Err(DispatchError::Unexpected(format!("{:#}", e)))
        }
    }
}

/// Classify a 2xx body. A "success" status without a `file_path` is
/// reported as `Unexpected` rather than as a success with no path.
fn interpret_reply(body: &str) -> Outcome {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return Err(DispatchError::Decode {
                raw: body.to_string(),
            })
        }
    };

    if !value.is_object() {
        return Err(DispatchError::Unexpected(format!(
            "expected a JSON object from the service, got {}",
            value
        )));
    }

    let reply: ServiceReply = serde_json::from_value(value)
        .map_err(|e| DispatchError::Unexpected(format!("malformed service reply: {}", e)))?;

    let message = reply.message.as_ref().map(value_text).unwrap_or_default();
    let succeeded = matches!(&reply.status, Some(Value::String(s)) if s == "success");

    if !succeeded {
        return Err(DispatchError::ServerReported { message });
    }

    match reply.file_path.as_ref() {
        Some(path) if !path.is_null() => Ok(GeneratedFile {
            file_path: value_text(path),
            message,
        }),
        _ => Err(DispatchError::Unexpected(
            "service reported success without a file_path".into(),
        )),
    }
}

fn is_loopback(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(endpoint) else {
        return false;
    };
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

/// Strings are taken verbatim, anything else in its JSON form.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map a reqwest error onto the dispatch taxonomy. Connection failures win
/// over timeouts so a refused connect is never reported as a slow server.
fn classify_transport(err: reqwest::Error) -> DispatchError {
    let description = err.to_string();
    if err.is_connect() || connection_dropped(&err) {
        DispatchError::Connection(description)
    } else if err.is_timeout() {
        DispatchError::Timeout(description)
    } else {
        DispatchError::Transport(description)
    }
}

/// The service accepted the connection and then went away: hyper saw the
/// socket close before a full response, or the peer reset it.
fn connection_dropped(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() {
                return true;
            }
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
