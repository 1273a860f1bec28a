//! Client configuration

use crate::channel::RECONNECT_DELAY;
use crate::error::{ClientError, ClientResult};
use std::time::Duration;

/// Pause between marking a line ready and auto-delivering it; a UX
/// affordance, long enough for other clients to observe the intermediate
/// state
pub const READY_DELIVERY_DELAY: Duration = Duration::from_millis(1000);

/// Configuration for the sync client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Command API base URL
    pub api_url: String,
    /// Push endpoint base URL
    pub events_url: String,
    /// Auth token; sent as a query parameter on the push connection and as
    /// a bearer token on commands
    pub token: Option<String>,
    pub reconnect_delay: Duration,
    pub ready_delivery_delay: Duration,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_url: Option<String>,
    events_url: Option<String>,
    token: Option<String>,
    reconnect_delay: Option<Duration>,
    ready_delivery_delay: Option<Duration>,
}

impl ClientConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Push endpoint base; defaults to the API base when not set
    pub fn events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = Some(url.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = Some(delay);
        self
    }

    pub fn ready_delivery_delay(mut self, delay: Duration) -> Self {
        self.ready_delivery_delay = Some(delay);
        self
    }

    pub fn build(self) -> ClientResult<ClientConfig> {
        let api_url = self
            .api_url
            .ok_or_else(|| ClientError::Config("api_url is required".into()))?;
        let events_url = self.events_url.unwrap_or_else(|| api_url.clone());
        Ok(ClientConfig {
            api_url,
            events_url,
            token: self.token,
            reconnect_delay: self.reconnect_delay.unwrap_or(RECONNECT_DELAY),
            ready_delivery_delay: self.ready_delivery_delay.unwrap_or(READY_DELIVERY_DELAY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_api_url() {
        assert!(ClientConfig::builder().build().is_err());
    }

    #[test]
    fn events_url_defaults_to_api_url() {
        let config = ClientConfig::builder()
            .api_url("http://localhost:8080")
            .token("abc")
            .build()
            .unwrap();
        assert_eq!(config.events_url, "http://localhost:8080");
        assert_eq!(config.reconnect_delay, RECONNECT_DELAY);
    }
}
