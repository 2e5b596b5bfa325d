/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::rest::{ApiErrorCodes, SERVICE_UNAVAILABLE_CODE};
use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

/// Error conditions that can be returned
#[derive(Error, Debug)]
pub enum FlickrError {
    #[error("Request network error")]
    Transport(#[from] reqwest::Error),

    #[error("Received '{message}' error from Flickr with status {status}")]
    ServiceUnavailable { status: u16, message: String },

    /// `body` is the full answer, including `debug_sbs` when Flickr sends it
    #[error("OAuth problem: {problem}")]
    OAuthProblem { problem: String, body: String },

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("API Response was error: {code}, msg: {message}")]
    ApiResponse { code: String, message: String },

    #[error("Could not construct response: {0}")]
    Construction(String),

    #[error("OAuth signing error: {0}")]
    Signing(String),

    #[error("URL Parse error")]
    UrlParsing(#[from] url::ParseError),
}

/// The kind of failure, independent of the underlying cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ErrorKind {
    Transport,
    ServiceUnavailable,
    OAuthProblem,
    Parse,
    Api,
    Construction,
    Signing,
}

impl FlickrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::UrlParsing(_) => ErrorKind::Transport,
            Self::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            Self::OAuthProblem { .. } => ErrorKind::OAuthProblem,
            Self::XmlParse(_) => ErrorKind::Parse,
            Self::ApiResponse { .. } => ErrorKind::Api,
            Self::Construction(_) => ErrorKind::Construction,
            Self::Signing(_) => ErrorKind::Signing,
        }
    }

    /// The Flickr error code carried by this error, if any.
    ///
    /// HTTP level failures always report code `105` (service unavailable).
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::ServiceUnavailable { .. } => Some(SERVICE_UNAVAILABLE_CODE),
            Self::ApiResponse { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Maps the error code onto one of the documented API wide codes
    pub fn api_error_code(&self) -> Option<ApiErrorCodes> {
        self.code()
            .and_then(|c| c.parse::<u32>().ok())
            .and_then(|c| ApiErrorCodes::try_from(c).ok())
    }

    /// True when the error was reported by Flickr itself rather than by the transport
    pub fn is_api_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Api | ErrorKind::ServiceUnavailable)
    }
}
