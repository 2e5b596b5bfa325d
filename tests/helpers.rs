/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use flickr::rest::{AccessToken, ApiParams, RequestContext, RestConfig};
use wiremock::MockServer;

pub(crate) const API_KEY: &str = "test-api-key";
pub(crate) const SHARED_SECRET: &str = "test-shared-secret";
pub(crate) const TOKEN_SECRET: &str = "test-token-secret";

#[allow(dead_code)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Points a transport at the mock server
#[allow(dead_code)]
pub(crate) fn config_for(server: &MockServer) -> RestConfig {
    let uri = url::Url::parse(&server.uri()).unwrap();
    RestConfig::default()
        .with_scheme("http")
        .with_host(uri.host_str().unwrap())
        .with_port(uri.port().unwrap())
}

#[allow(dead_code)]
pub(crate) fn user_context(token: &str) -> RequestContext {
    RequestContext::authenticated(AccessToken::new(token, TOKEN_SECRET))
}

/// Splits a multipart/form-data body into (name, filename, value) triples
#[allow(dead_code)]
pub(crate) fn multipart_parts(
    request: &wiremock::Request,
) -> Vec<(String, Option<String>, String)> {
    let content_type = request
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    let boundary = content_type.split("boundary=").nth(1).unwrap().trim();
    let body = String::from_utf8_lossy(&request.body).to_string();

    body.split(&format!("--{}", boundary))
        .filter_map(|chunk| {
            let chunk = chunk.strip_prefix("\r\n")?;
            let (headers, value) = chunk.split_once("\r\n\r\n")?;
            let name = quoted_after(headers, "name=\"")?;
            let filename = quoted_after(headers, "filename=\"");
            let value = value.strip_suffix("\r\n").unwrap_or(value);
            Some((name, filename, value.to_string()))
        })
        .collect()
}

fn quoted_after(s: &str, marker: &str) -> Option<String> {
    // `name="` also matches inside `filename="`, so look for a preceding space or ';'
    let idx = s
        .match_indices(marker)
        .find(|(i, _)| *i == 0 || matches!(s.as_bytes()[*i - 1], b' ' | b';'))?
        .0;
    let rest = &s[idx + marker.len()..];
    rest.split('"').next().map(String::from)
}

/// Query string of a received request as a map
#[allow(dead_code)]
pub(crate) fn query_of(request: &wiremock::Request) -> ApiParams {
    request.url.query_pairs().into_owned().collect()
}

/// Live credentials, for the ignored smoke tests
#[allow(dead_code)]
pub(crate) fn get_live_api_creds() -> anyhow::Result<(String, String)> {
    let api_key = std::env::var("FLICKR_API_KEY")?;
    let shared_secret = std::env::var("FLICKR_SHARED_SECRET")?;
    Ok((api_key, shared_secret))
}
