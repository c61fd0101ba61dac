use std::time::Duration;

use crate::collaborators::SettingsProvider;
use crate::error::ClientError;
use crate::watchdog::DEFAULT_PROCESSING_TIMEOUT;

/// Static client configuration.
///
/// Implements [`SettingsProvider`] for hosts whose settings do not change at
/// runtime; apps with a live settings screen implement the trait themselves.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Websocket endpoint (`ws://` or `wss://`).
    pub endpoint_url: String,
    /// Stall budget for an in-flight turn.
    pub processing_timeout: Duration,
    /// Model applied when a command does not name one.
    pub default_model: Option<String>,
    /// Permission mode applied when a command does not name one.
    pub default_permission_mode: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
            default_model: None,
            default_permission_mode: None,
        }
    }

    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_default_permission_mode(mut self, mode: impl Into<String>) -> Self {
        self.default_permission_mode = Some(mode.into());
        self
    }
}

impl SettingsProvider for ClientConfig {
    fn endpoint_url(&self) -> String {
        self.endpoint_url.clone()
    }

    fn processing_timeout(&self) -> Duration {
        self.processing_timeout
    }

    fn default_model(&self) -> Option<String> {
        self.default_model.clone()
    }

    fn default_permission_mode(&self) -> Option<String> {
        self.default_permission_mode.clone()
    }
}

/// Validates an endpoint before the transport dials it.
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<url::Url, ClientError> {
    let parsed = url::Url::parse(endpoint).map_err(|error| ClientError::InvalidEndpoint {
        url: endpoint.to_string(),
        reason: error.to_string(),
    })?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(ClientError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: format!("unsupported scheme `{other}`"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::validate_endpoint;

    #[test]
    fn websocket_schemes_are_accepted() {
        assert!(validate_endpoint("ws://localhost:3001/ws").is_ok());
        assert!(validate_endpoint("wss://agent.example.com/ws").is_ok());
    }

    #[test]
    fn http_and_garbage_endpoints_are_rejected() {
        assert!(validate_endpoint("https://agent.example.com/ws").is_err());
        assert!(validate_endpoint("not a url").is_err());
    }
}
