/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! OAuth1.0a request signing.
//!
//! OAuth parameters always travel with the request parameters (query string
//! for GET, body for POST and multipart), never in an `Authorization` header.

use crate::rest::errors::FlickrError;
use crate::rest::{API_KEY, AccessToken, ApiParams, Creds, RequestContext, RequestDescriptor, Verb};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use log::debug;
use sha1::Sha1;
use std::collections::BTreeSet;

type HmacSha1 = Hmac<Sha1>;

pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH_NONCE: &str = "oauth_nonce";
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH_TOKEN: &str = "oauth_token";
pub const OAUTH_VERSION: &str = "oauth_version";

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";

/// Produces the OAuth parameter set for a request.
///
/// `params` is the exact set of parameters that will be transmitted; the
/// returned set includes `oauth_signature`.
pub trait SignatureService: Send + Sync {
    fn oauth_parameters(
        &self,
        verb: Verb,
        url: &str,
        params: &ApiParams,
        creds: &Creds,
        token: Option<&AccessToken>,
    ) -> Result<ApiParams, FlickrError>;
}

/// HMAC-SHA1 signer.
///
/// Generates a fresh nonce and timestamp per request unless fixed ones were
/// supplied.
#[derive(Debug, Clone, Default)]
pub struct HmacSha1Signer {
    nonce: Option<String>,
    timestamp: Option<i64>,
}

impl HmacSha1Signer {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_nonce value
    pub fn nonce(self, nonce: &str) -> Self {
        Self {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp(self, timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    fn make_nonce(&self) -> String {
        self.nonce.clone().unwrap_or_else(|| {
            format!(
                "{:016x}{:016x}",
                rand::random::<u64>(),
                rand::random::<u64>()
            )
        })
    }

    fn make_timestamp(&self) -> i64 {
        self.timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp())
    }
}

impl SignatureService for HmacSha1Signer {
    fn oauth_parameters(
        &self,
        verb: Verb,
        url: &str,
        params: &ApiParams,
        creds: &Creds,
        token: Option<&AccessToken>,
    ) -> Result<ApiParams, FlickrError> {
        if creds.api_key().is_empty() || creds.shared_secret().is_empty() {
            return Err(FlickrError::Signing(
                "api key and shared secret are required".into(),
            ));
        }

        let mut oauth = ApiParams::new();
        oauth.insert(OAUTH_CONSUMER_KEY.into(), creds.api_key().into());
        oauth.insert(OAUTH_NONCE.into(), self.make_nonce());
        oauth.insert(OAUTH_SIGNATURE_METHOD.into(), SIGNATURE_METHOD.into());
        oauth.insert(OAUTH_TIMESTAMP.into(), self.make_timestamp().to_string());
        if let Some(token) = token {
            oauth.insert(OAUTH_TOKEN.into(), token.token().into());
        }
        oauth.insert(OAUTH_VERSION.into(), VERSION.into());

        let mut all = params.clone();
        all.extend(oauth.iter().map(|(k, v)| (k.clone(), v.clone())));
        all.remove(OAUTH_SIGNATURE);

        let base = signature_base_string(verb, url, &all)?;
        let key = format!(
            "{}&{}",
            encode(creds.shared_secret()),
            encode(token.map(|t| t.token_secret()).unwrap_or_default())
        );
        oauth.insert(OAUTH_SIGNATURE.into(), hmac_sha1(&key, &base)?);
        Ok(oauth)
    }
}

/// Percent encodes everything outside the RFC 3986 unreserved set
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `VERB&enc(base url)&enc(sorted parameters)`
pub fn signature_base_string(
    verb: Verb,
    url: &str,
    params: &ApiParams,
) -> Result<String, FlickrError> {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.sort();
    let normalized = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        verb,
        encode(&base_url(url)?),
        encode(&normalized)
    ))
}

// Scheme and host lower case, default port dropped, no query or fragment
fn base_url(url: &str) -> Result<String, FlickrError> {
    let url = url::Url::parse(url)?;
    let host = url
        .host_str()
        .ok_or_else(|| FlickrError::Signing(format!("no host in {}", url)))?
        .to_lowercase();
    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    })
}

fn hmac_sha1(key: &str, data: &str) -> Result<String, FlickrError> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| FlickrError::Signing(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// A request ready to be executed.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub descriptor: RequestDescriptor,
    /// OAuth parameters added by signing, empty for unsigned requests
    pub oauth: ApiParams,
    /// Parameters the signature was computed over
    pub signed_params: ApiParams,
}

impl SignedRequest {
    /// Wraps a descriptor that is sent without any OAuth parameters
    pub fn unsigned(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            oauth: ApiParams::new(),
            signed_params: ApiParams::new(),
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.oauth.is_empty()
    }

    /// Names covered by the signature base string
    pub fn signed_parameter_names(&self) -> BTreeSet<&str> {
        self.signed_params.keys().map(String::as_str).collect()
    }

    /// Names of the plain parameters that go over the wire, minus the signature.
    ///
    /// For multipart requests these are the non-file body parts.
    pub fn transmitted_parameter_names(&self) -> BTreeSet<&str> {
        let d = &self.descriptor;
        let mut names: BTreeSet<&str> = if d.is_multipart() {
            d.parts.iter().map(|(k, _)| k.as_str()).collect()
        } else {
            match d.verb {
                Verb::Get => d.query.keys().map(String::as_str).collect(),
                Verb::Post => d.body.keys().map(String::as_str).collect(),
            }
        };
        names.remove(OAUTH_SIGNATURE);
        names
    }

    /// Fails if the signed and the transmitted parameter sets differ; Flickr
    /// would reject such a request with an invalid signature.
    pub fn check_coverage(&self) -> Result<(), FlickrError> {
        if !self.is_signed() {
            return Ok(());
        }
        let signed = self.signed_parameter_names();
        let sent = self.transmitted_parameter_names();
        if signed != sent {
            let diff: Vec<&str> = signed.symmetric_difference(&sent).copied().collect();
            return Err(FlickrError::Signing(format!(
                "signed and transmitted parameters differ: {}",
                diff.join(",")
            )));
        }
        Ok(())
    }
}

/// Signs `descriptor` for the user in `context`.
///
/// Unauthenticated GET requests are not signed; they carry the bare api key
/// instead, unless the caller already supplied one.
pub fn sign<S>(
    mut descriptor: RequestDescriptor,
    creds: &Creds,
    context: &RequestContext,
    service: &S,
) -> Result<SignedRequest, FlickrError>
where
    S: SignatureService + ?Sized,
{
    let token = context.auth();
    if token.is_none() && descriptor.verb == Verb::Get && !descriptor.is_multipart() {
        descriptor
            .query
            .entry(API_KEY.into())
            .or_insert_with(|| creds.api_key().into());
        return Ok(SignedRequest::unsigned(descriptor));
    }

    let transmitted = descriptor.transmitted_params().clone();
    let oauth = service.oauth_parameters(
        descriptor.verb,
        &descriptor.url,
        &transmitted,
        creds,
        token,
    )?;

    let mut signed_params = transmitted;
    signed_params.extend(
        oauth
            .iter()
            .filter(|(k, _)| k.as_str() != OAUTH_SIGNATURE)
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    signed_params.remove(OAUTH_SIGNATURE);

    match descriptor.verb {
        Verb::Get => descriptor.query.extend(oauth.clone()),
        Verb::Post => descriptor.body.extend(oauth.clone()),
    }

    // Flickr checks the signature against the multipart parts it receives, so
    // every oauth parameter must also go out as a part.
    if let Some(upload) = descriptor.upload_params_mut() {
        upload.extend(oauth.clone());
        let parts: Vec<(String, String)> = upload
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        descriptor.parts = parts;
    }

    debug!(
        "Signed {} {} ({} parameters)",
        descriptor.verb,
        descriptor.url,
        signed_params.len()
    );

    Ok(SignedRequest {
        descriptor,
        oauth,
        signed_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::{Payload, UploadMetaData};

    fn rfc_signer() -> HmacSha1Signer {
        HmacSha1Signer::new()
            .nonce("kllo9940pd9333jh")
            .timestamp(1191242096)
    }

    #[test]
    fn matches_rfc5849_reference_signature() {
        let creds = Creds::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let token = AccessToken::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let params: ApiParams = crate::rest::to_params([
            ("file", "vacation.jpg"),
            ("size", "original"),
        ]);
        let oauth = rfc_signer()
            .oauth_parameters(
                Verb::Get,
                "http://photos.example.net/photos",
                &params,
                &creds,
                Some(&token),
            )
            .unwrap();
        assert_eq!(oauth.get(OAUTH_SIGNATURE).unwrap(), "tR3+Ty81lMeYAr/Fid0kMTYa/WM=");
        assert_eq!(oauth.get(OAUTH_TOKEN).unwrap(), "nnch734d00sl2jdk");
        assert_eq!(oauth.get(OAUTH_VERSION).unwrap(), "1.0");
        assert_eq!(oauth.get(OAUTH_SIGNATURE_METHOD).unwrap(), "HMAC-SHA1");
    }

    #[test]
    fn base_string_normalizes_url_and_encodes() {
        let params = crate::rest::to_params([("b", "x y"), ("a", "1&2")]);
        let base =
            signature_base_string(Verb::Post, "HTTPS://API.Flickr.com:443/services/rest/", &params)
                .unwrap();
        assert_eq!(
            base,
            "POST&https%3A%2F%2Fapi.flickr.com%2Fservices%2Frest%2F&a%3D1%25262%26b%3Dx%2520y"
        );

        let base =
            signature_base_string(Verb::Get, "http://localhost:8080/services/rest/", &params)
                .unwrap();
        assert!(base.starts_with("GET&http%3A%2F%2Flocalhost%3A8080%2Fservices%2Frest%2F&"));
    }

    #[test]
    fn missing_secret_is_a_signing_error() {
        let err = HmacSha1Signer::new()
            .oauth_parameters(
                Verb::Post,
                "https://api.flickr.com/services/rest/",
                &ApiParams::new(),
                &Creds::new("key", ""),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, FlickrError::Signing(_)));
    }

    #[test]
    fn fresh_nonce_per_request() {
        let signer = HmacSha1Signer::new();
        assert_ne!(signer.make_nonce(), signer.make_nonce());
        assert!(signer.make_timestamp() > 1_600_000_000);
    }

    #[test]
    fn signed_get_has_every_param_once() {
        let creds = Creds::new("key", "secret");
        let ctx = RequestContext::authenticated(AccessToken::new("tok", "toksecret"));
        let req = RequestDescriptor::get(
            "https://api.flickr.com/services/rest/",
            [("method", "flickr.photos.search"), ("oauth_token", "stale")],
        );
        let signed = sign(req, &creds, &ctx, &HmacSha1Signer::new()).unwrap();
        let q = &signed.descriptor.query;
        assert_eq!(q.get("method").unwrap(), "flickr.photos.search");
        assert_eq!(q.get(OAUTH_TOKEN).unwrap(), "tok");
        for key in [
            OAUTH_CONSUMER_KEY,
            OAUTH_NONCE,
            OAUTH_SIGNATURE,
            OAUTH_SIGNATURE_METHOD,
            OAUTH_TIMESTAMP,
            OAUTH_VERSION,
        ] {
            assert!(q.contains_key(key), "missing {}", key);
        }
        assert!(!q.contains_key(API_KEY));
        assert!(signed.descriptor.body.is_empty());
        signed.check_coverage().unwrap();

        let url = signed.descriptor.complete_url().unwrap();
        let mut seen = BTreeSet::new();
        for (k, _) in url.query_pairs() {
            assert!(seen.insert(k.into_owned()), "duplicate key in query");
        }
    }

    #[test]
    fn unauthenticated_get_adds_api_key_once() {
        let creds = Creds::new("configured-key", "secret");
        let ctx = RequestContext::anonymous();

        let req = RequestDescriptor::get("https://api.flickr.com/services/rest/", [("method", "m")]);
        let signed = sign(req, &creds, &ctx, &HmacSha1Signer::new()).unwrap();
        assert!(!signed.is_signed());
        assert_eq!(signed.descriptor.query.get(API_KEY).unwrap(), "configured-key");
        assert!(signed.descriptor.query.keys().all(|k| !k.starts_with("oauth_")));

        let req = RequestDescriptor::get(
            "https://api.flickr.com/services/rest/",
            [("method", "m"), (API_KEY, "caller-key")],
        );
        let signed = sign(req, &creds, &ctx, &HmacSha1Signer::new()).unwrap();
        assert_eq!(signed.descriptor.query.get(API_KEY).unwrap(), "caller-key");
        let url = signed.descriptor.complete_url().unwrap();
        assert_eq!(url.query_pairs().filter(|(k, _)| k == API_KEY).count(), 1);
    }

    #[test]
    fn unauthenticated_post_is_signed_without_token() {
        let creds = Creds::new("key", "secret");
        let req = RequestDescriptor::post("https://api.flickr.com/services/rest/", [("method", "m")]);
        let signed = sign(req, &creds, &RequestContext::anonymous(), &HmacSha1Signer::new()).unwrap();
        assert!(signed.is_signed());
        assert!(!signed.descriptor.body.contains_key(OAUTH_TOKEN));
        assert!(signed.descriptor.body.contains_key(OAUTH_SIGNATURE));
        assert!(signed.descriptor.query.is_empty());
        signed.check_coverage().unwrap();
    }

    #[test]
    fn multipart_signed_params_equal_transmitted_parts() {
        let creds = Creds::new("key", "secret");
        let ctx = RequestContext::authenticated(AccessToken::new("tok", "toksecret"));
        let meta = UploadMetaData {
            title: Some("A title".into()),
            description: Some("desc".into()),
            tags: vec!["one".into(), "two words".into()],
            filename: Some("pic.jpg".into()),
            ..Default::default()
        };
        let req = RequestDescriptor::multipart(
            "https://up.flickr.com/services/upload/",
            &meta,
            &Payload::from(vec![0xffu8, 0xd8, 0xff]),
        );
        let signer = HmacSha1Signer::new().nonce("n0nce").timestamp(1_700_000_000);
        let signed = sign(req, &creds, &ctx, &signer).unwrap();

        assert_eq!(signed.signed_parameter_names(), signed.transmitted_parameter_names());
        signed.check_coverage().unwrap();
        let part_names: BTreeSet<&str> =
            signed.descriptor.parts.iter().map(|(k, _)| k.as_str()).collect();
        assert!(part_names.contains(OAUTH_SIGNATURE));
        assert!(!part_names.contains("photo"));
        assert_eq!(signed.descriptor.files.len(), 1);

        // Recomputing the signature from what is sent gives the same value,
        // which is what Flickr does on its side.
        let mut sent: ApiParams = signed.descriptor.parts.iter().cloned().collect();
        let sent_signature = sent.remove(OAUTH_SIGNATURE).unwrap();
        let base = signature_base_string(Verb::Post, &signed.descriptor.url, &sent).unwrap();
        assert_eq!(hmac_sha1("secret&toksecret", &base).unwrap(), sent_signature);
    }

    #[test]
    fn coverage_check_detects_missing_part() {
        let creds = Creds::new("key", "secret");
        let ctx = RequestContext::authenticated(AccessToken::new("tok", "toksecret"));
        let meta = UploadMetaData {
            title: Some("t".into()),
            ..Default::default()
        };
        let req = RequestDescriptor::multipart(
            "https://up.flickr.com/services/upload/",
            &meta,
            &Payload::from(vec![1u8]),
        );
        let mut signed = sign(req, &creds, &ctx, &HmacSha1Signer::new()).unwrap();
        signed.descriptor.parts.retain(|(k, _)| k != OAUTH_NONCE);
        assert!(matches!(signed.check_coverage(), Err(FlickrError::Signing(_))));
    }
}
