//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default REST base URL; resource routes are resolved against it.
pub const DEFAULT_REST_URL: &str = "https://web3api.io/api/v2/";
/// Default JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://rpc.web3api.io/";
/// Default WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://ws.web3api.io/";

/// Endpoint and credential configuration shared by every chain handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key sent as `x-api-key`.
    #[serde(default)]
    pub api_key: String,
    /// REST base URL (must end with `/` so relative routes resolve under it).
    #[serde(default = "default_rest_url")]
    pub rest_base_url: String,
    /// JSON-RPC endpoint URL.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// WebSocket endpoint URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Per-request timeout for REST and RPC calls (seconds).
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Value of the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_rest_url() -> String {
    DEFAULT_REST_URL.into()
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.into()
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("web3data-rs v{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            rest_base_url: default_rest_url(),
            rpc_url: default_rpc_url(),
            ws_url: default_ws_url(),
            request_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Default configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads `AMBERDATA_API_KEY` plus the optional overrides
    /// `WEB3DATA_REST_URL`, `WEB3DATA_RPC_URL` and `WEB3DATA_WS_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(lookup("AMBERDATA_API_KEY").unwrap_or_default());
        if let Some(url) = lookup("WEB3DATA_REST_URL") {
            config.rest_base_url = url;
        }
        if let Some(url) = lookup("WEB3DATA_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(url) = lookup("WEB3DATA_WS_URL") {
            config.ws_url = url;
        }
        if config.api_key.is_empty() {
            tracing::debug!("AMBERDATA_API_KEY is not set; requests will be unauthenticated");
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
