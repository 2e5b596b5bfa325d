/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::{ContentType, HiddenLevel, SafetyLevel};
use bytes::Bytes;
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Name of the multipart field carrying the uploaded file
pub const PHOTO_FIELD: &str = "photo";

/// A key appears at most once; ordering carries no meaning.
pub type ApiParams = BTreeMap<String, String>;

/// Turns any key/value list into [`ApiParams`], stringifying the values
pub fn to_params<I, K, V>(params: I) -> ApiParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: ToString,
{
    params
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Post,
}

/// Raw file sent as its own multipart part
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// Everything needed to issue one call, before and after signing.
///
/// Once signed the descriptor must not be changed; doing so invalidates the
/// signature.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub verb: Verb,
    pub url: String,
    pub query: ApiParams,
    pub body: ApiParams,
    pub headers: BTreeMap<String, String>,
    /// Non-file multipart parts, in the order they are sent
    pub parts: Vec<(String, String)>,
    pub files: Vec<FilePart>,
    upload_params: Option<ApiParams>,
}

impl RequestDescriptor {
    fn new(verb: Verb, url: &str) -> Self {
        Self {
            verb,
            url: url.into(),
            query: ApiParams::new(),
            body: ApiParams::new(),
            headers: BTreeMap::new(),
            parts: Vec::new(),
            files: Vec::new(),
            upload_params: None,
        }
    }

    /// Every parameter becomes a query string parameter
    pub fn get<I, K, V>(url: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut req = Self::new(Verb::Get, url);
        req.query = to_params(params);
        req
    }

    /// Every parameter becomes a form encoded body parameter
    pub fn post<I, K, V>(url: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut req = Self::new(Verb::Post, url);
        req.body = to_params(params);
        req
    }

    /// Multipart upload of `payload` as the `photo` part.
    ///
    /// The upload parameters are kept aside: after signing the OAuth
    /// parameters are added to them and all of them are sent as body parts.
    pub fn multipart(url: &str, meta: &UploadMetaData, payload: &Payload) -> Self {
        let upload_params = meta.upload_parameters();
        let mut req = Self::new(Verb::Post, url);
        req.body = upload_params.clone();
        req.upload_params = Some(upload_params);
        req.files.push(FilePart {
            field: PHOTO_FIELD.into(),
            file_name: meta.filename.clone().unwrap_or_default(),
            bytes: payload.bytes.clone(),
        });
        req
    }

    pub fn is_multipart(&self) -> bool {
        self.upload_params.is_some()
    }

    /// Upload parameters of a multipart request, OAuth parameters included once signed
    pub fn upload_params(&self) -> Option<&ApiParams> {
        self.upload_params.as_ref()
    }

    pub(crate) fn upload_params_mut(&mut self) -> Option<&mut ApiParams> {
        self.upload_params.as_mut()
    }

    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.into(), value.into());
    }

    /// The parameters that travel with the request and so must be signed
    pub fn transmitted_params(&self) -> &ApiParams {
        match (self.verb, &self.upload_params) {
            (_, Some(upload)) => upload,
            (Verb::Get, None) => &self.query,
            (Verb::Post, None) => &self.body,
        }
    }

    /// `url` with the query parameters appended
    pub fn complete_url(&self) -> Result<url::Url, url::ParseError> {
        if self.query.is_empty() {
            url::Url::parse(&self.url)
        } else {
            url::Url::parse_with_params(&self.url, &self.query)
        }
    }
}

/// Photo bytes to upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub bytes: Bytes,
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Self { bytes: v.into() }
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

/// Properties sent along with an upload.
///
/// See [Flickr Upload API](https://www.flickr.com/services/api/upload.api.html)
#[derive(Debug, Clone, Default)]
pub struct UploadMetaData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: Option<bool>,
    pub is_friend_visible: Option<bool>,
    pub is_family_visible: Option<bool>,
    pub safety_level: Option<SafetyLevel>,
    pub content_type: Option<ContentType>,
    pub hidden: Option<HiddenLevel>,
    pub is_async: bool,
    pub filename: Option<String>,
}

impl UploadMetaData {
    /// The upload fields as Flickr names them. Unset fields are left out.
    pub fn upload_parameters(&self) -> ApiParams {
        let flag = |b: bool| (if b { "1" } else { "0" }).to_string();

        let mut params = ApiParams::new();
        if let Some(title) = &self.title {
            params.insert("title".into(), title.clone());
        }
        if let Some(description) = &self.description {
            params.insert("description".into(), description.clone());
        }
        if !self.tags.is_empty() {
            params.insert("tags".into(), join_tags(&self.tags));
        }
        if let Some(v) = self.is_public {
            params.insert("is_public".into(), flag(v));
        }
        if let Some(v) = self.is_friend_visible {
            params.insert("is_friend".into(), flag(v));
        }
        if let Some(v) = self.is_family_visible {
            params.insert("is_family".into(), flag(v));
        }
        if let Some(level) = self.safety_level {
            params.insert("safety_level".into(), u8::from(level).to_string());
        }
        if let Some(ct) = self.content_type {
            params.insert("content_type".into(), u8::from(ct).to_string());
        }
        if let Some(hidden) = self.hidden {
            params.insert("hidden".into(), u8::from(hidden).to_string());
        }
        if self.is_async {
            params.insert("async".into(), "1".into());
        }
        params
    }
}

// Space separated, multi word tags are quoted
fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| {
            if t.contains(' ') {
                format!("\"{}\"", t)
            } else {
                t.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
