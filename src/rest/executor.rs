/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::errors::FlickrError;
use crate::rest::{RestConfig, SignedRequest, Verb};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::future::Future;

/// Status and body of an executed request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub success: bool,
    /// Reason phrase for the status
    pub message: String,
    /// Only read for successful responses
    pub body: String,
}

/// Sends a prepared request over the wire.
///
/// One call, one attempt: implementations never retry.
pub trait HttpExecutor: Send + Sync {
    fn execute(
        &self,
        request: &SignedRequest,
    ) -> impl Future<Output = Result<RawResponse, FlickrError>> + Send;
}

/// Executes requests with a [`reqwest::Client`] built from the transport configuration
#[derive(Clone)]
pub struct ReqwestExecutor {
    https_client: reqwest::Client,
}

impl ReqwestExecutor {
    /// Applies the configured timeouts and proxy to every connection
    pub fn new(config: &RestConfig) -> Result<Self, FlickrError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeouts.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.read_timeout() {
            builder = builder.read_timeout(timeout);
        }
        if let Some(proxy) = &config.proxy {
            let mut reqwest_proxy = reqwest::Proxy::all(proxy.url())?;
            // https goes through a CONNECT tunnel; only credentials set on the
            // proxy itself reach the proxy there
            if let Some(username) = proxy.username.as_deref() {
                let password = proxy.password.as_deref().unwrap_or_default();
                reqwest_proxy = reqwest_proxy.basic_auth(username, password);
            }
            builder = builder.proxy(reqwest_proxy);
        }
        Ok(Self {
            https_client: builder.build()?,
        })
    }
}

impl std::fmt::Debug for ReqwestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExecutor").finish()
    }
}

impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &SignedRequest) -> Result<RawResponse, FlickrError> {
        let desc = &request.descriptor;
        let url = desc.complete_url()?;
        debug!("{}: {}", desc.verb, url);

        let mut req = match desc.verb {
            Verb::Get => self.https_client.get(url),
            Verb::Post => self.https_client.post(url),
        };
        for (name, value) in &desc.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        req = match desc.verb {
            Verb::Post if desc.is_multipart() => {
                let mut form = Form::new();
                for file in &desc.files {
                    let part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
                    form = form.part(file.field.clone(), part);
                }
                for (name, value) in &desc.parts {
                    form = form.text(name.clone(), value.clone());
                }
                req.multipart(form)
            }
            Verb::Post => {
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&desc.body)
                    .finish();
                req.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(body)
            }
            Verb::Get => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        let message = status.canonical_reason().unwrap_or_default().to_string();
        if !status.is_success() {
            return Ok(RawResponse {
                status: status.as_u16(),
                success: false,
                message,
                body: String::new(),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            success: true,
            message,
            body: resp.text().await?,
        })
    }
}
