/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use num_enum::TryFromPrimitive;

// Root Flickr API
pub const API_HOST: &str = "api.flickr.com";
pub const DEFAULT_SCHEME: &str = "https";
pub const REST_PATH: &str = "/services/rest/";
pub const UPLOAD_PATH: &str = "/services/upload/";
pub const REPLACE_PATH: &str = "/services/replace/";

/// Query parameter carrying the bare api key on unauthenticated calls
pub const API_KEY: &str = "api_key";

/// Error code reported for any HTTP level failure
pub const SERVICE_UNAVAILABLE_CODE: &str = "105";

/// API wide error codes per the Flickr API site.
///
/// Method specific codes (1 to 94) are not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
pub enum ApiErrorCodes {
    SslRequired = 95,
    InvalidSignature = 96,
    MissingSignature = 97,
    InvalidAuthToken = 98,
    InsufficientPermissions = 99,
    InvalidApiKey = 100,
    ServiceUnavailable = 105,
    WriteOperationFailed = 106,
    FormatNotFound = 111,
    MethodNotFound = 112,
    InvalidSoapEnvelope = 114,
    InvalidXmlRpcCall = 115,
    BadUrlFound = 116,
}

/// The application's API key and shared secret.
///
/// These are configured once per transport and used for every call it makes.
#[derive(Default, Clone)]
pub struct Creds {
    api_key: String,
    shared_secret: String,
}

impl Creds {
    pub fn new(api_key: &str, shared_secret: &str) -> Self {
        Self {
            api_key: api_key.into(),
            shared_secret: shared_secret.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn shared_secret(&self) -> &str {
        &self.shared_secret
    }
}

impl std::fmt::Debug for Creds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creds")
            .field("api_key", &"xxx")
            .field("shared_secret", &"xxx")
            .finish()
    }
}

/// An already obtained OAuth access token representing the authenticated user
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    token_secret: String,
}

impl AccessToken {
    pub fn new(token: &str, token_secret: &str) -> Self {
        Self {
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"xxx")
            .field("token_secret", &"xxx")
            .finish()
    }
}

/// Per call context handed to every transport call.
///
/// Carries the access token of the user the call is made on behalf of. Two
/// calls made with different contexts on the same transport never see each
/// other's token.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    auth: Option<AccessToken>,
}

impl RequestContext {
    /// A context for calls that need no user authorization
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(auth: AccessToken) -> Self {
        Self { auth: Some(auth) }
    }

    pub fn auth(&self) -> Option<&AccessToken> {
        self.auth.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }
}
