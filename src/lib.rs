/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # Flickr
//!
//! REST transport for the Flickr API.
//!
//! For further details on the API refer to the [Flickr API Docs](https://www.flickr.com/services/api/)
//!
//! ## Features
//!
//! - OAuth1.0a signed GET, POST and multipart upload requests
//! - Unsigned GET for the token checking methods
//! - XML responses turned into a navigable document, or into your own type
//! - One error type covering network, HTTP, OAuth and API failures
//! - Proxy (with basic authentication) and timeout configuration
//!
//! *The Flickr API uses OAuth1. This library handles the request signing.
//! Getting the Access Token/Secret is left up to the consumer of this library*
//!
//! *The per method wrappers (photos, photosets, people...) are not part of
//! this crate; they assemble parameters and call [`rest::Rest`]*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! flickr = "0.1.0"
//! ```
//!
//! ## Usage
//!
//! **You will need to acquire an API key/secret from Flickr prior to using the API**
//!
//! ```no_run
//! use flickr::rest::{AccessToken, Payload, RequestContext, Rest, RestResponse, UploadMetaData};
//!
//!async fn upload_photo(
//!    api_key: &str,
//!    shared_secret: &str,
//!    access_token: &str,
//!    access_token_secret: &str,
//!    photo: Vec<u8>,
//!) -> anyhow::Result<String> {
//!    // The API key/secret is obtained from your Flickr account
//!    // The Access Token/Secret is obtained via Oauth1 process external to this
//!    let rest = Rest::new(api_key, shared_secret)?;
//!    let ctx = RequestContext::authenticated(AccessToken::new(access_token, access_token_secret));
//!
//!    // Who are we?
//!    let login: RestResponse = rest
//!        .get(rest.path(), [("method", "flickr.test.login")], &ctx)
//!        .await?;
//!    println!("Logged in as {:?}", login.payload().and_then(|u| u.attr("id")));
//!
//!    // Upload a photo
//!    let meta = UploadMetaData {
//!        title: Some("Sunset".into()),
//!        tags: vec!["beach".into()],
//!        filename: Some("sunset.jpg".into()),
//!        ..Default::default()
//!    };
//!    let uploaded: RestResponse = rest
//!        .post_multipart(rest.upload_path(), &meta, &Payload::from(photo), &ctx)
//!        .await?;
//!    Ok(uploaded
//!        .payload()
//!        .map(|p| p.text().to_string())
//!        .unwrap_or_default())
//!}
//! ```
//!
pub mod rest;
