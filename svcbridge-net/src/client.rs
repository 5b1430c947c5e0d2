//! HTTP client strategy for svcbridge.
//!
//! Posts the argument list to the service endpoint and parses the reply.

use std::io;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::Url;

use svcbridge_types::{
    CallError, CallResult, CallValue, ExecutionError, InvocationStrategy, ServiceCallRequest,
    StrategyKind,
};

use crate::config::NetworkConfig;

/// A strategy that invokes service functions on a remote HTTP server.
pub struct NetworkStrategy {
    client: Client,
    base_url: Url,
}

impl NetworkStrategy {
    /// Build a client for the configured endpoint.
    ///
    /// No connection is made here: the server is only contacted per call.
    pub fn new(config: &NetworkConfig) -> io::Result<Self> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(io::Error::other)?;

        debug!("Network strategy targeting {}", base_url);

        Ok(Self { client, base_url })
    }

    /// The base URL calls are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `/api/{service}/{function}` against the base URL.
    ///
    /// Names are pushed as path segments, so they are percent-encoded.
    pub fn endpoint(&self, request: &ServiceCallRequest) -> Result<Url, ExecutionError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ExecutionError::Transport(format!("{} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", request.service_name(), request.function_name()]);
        Ok(url)
    }

    fn call(&self, request: &ServiceCallRequest) -> Result<CallValue, ExecutionError> {
        let url = self.endpoint(request)?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(request.arguments())
            .send()
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(
                "{}::{} returned HTTP {}",
                request.service_name(),
                request.function_name(),
                status
            );
            return Err(ExecutionError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes()
            .map_err(|e| ExecutionError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| ExecutionError::MalformedResponse(e.to_string()))
    }
}

impl InvocationStrategy for NetworkStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Network
    }

    fn invoke(&self, request: &ServiceCallRequest) -> CallResult {
        self.call(request)
            .map_err(|cause| CallError::execution(StrategyKind::Network, cause))
    }
}
