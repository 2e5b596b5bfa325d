/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::{API_HOST, DEFAULT_SCHEME, REPLACE_PATH, REST_PATH, UPLOAD_PATH};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for a transport instance.
///
/// Read once when the transport is created and never changed afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RestConfig {
    pub scheme: String,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub path: String,
    pub upload_path: String,
    pub replace_path: String,
    pub timeouts: TimeoutConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.into(),
            host: API_HOST.into(),
            port: None,
            path: REST_PATH.into(),
            upload_path: UPLOAD_PATH.into(),
            replace_path: REPLACE_PATH.into(),
            timeouts: TimeoutConfig::default(),
            proxy: None,
        }
    }
}

impl RestConfig {
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// `scheme://host[:port]`
    pub fn origin(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }
}

/// Connect and read timeouts. `None` leaves the HTTP client default in place,
/// which for reads means waiting forever.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
}

impl TimeoutConfig {
    pub fn new(connect_timeout_ms: Option<u64>, read_timeout_ms: Option<u64>) -> Self {
        Self {
            connect_timeout_ms,
            read_timeout_ms,
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

/// HTTP proxy used for every connection the transport opens
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    pub fn with_auth(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.into(),
            port,
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// True when requests have to carry a `Proxy-Authorization` header
    pub fn is_auth(&self) -> bool {
        self.username.is_some()
    }

    /// Base64 encoded `user:password`, if proxy authentication is configured
    pub fn credentials(&self) -> Option<String> {
        let user = self.username.as_deref()?;
        let password = self.password.as_deref().unwrap_or_default();
        Some(STANDARD.encode(format!("{}:{}", user, password)))
    }

    /// Value for the `Proxy-Authorization` header
    pub fn authorization_header(&self) -> Option<String> {
        self.credentials().map(|c| format!("Basic {}", c))
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username.as_ref().map(|_| "xxx"))
            .field("password", &self.password.as_ref().map(|_| "xxx"))
            .finish()
    }
}
