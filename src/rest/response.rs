/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::RawResponse;
use crate::rest::errors::FlickrError;
use log::{trace, warn};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::str::FromStr;
use strum_macros::{Display, EnumString, IntoStaticStr};

const OAUTH_PROBLEM: &str = "oauth_problem";

/// A parsed response body
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

/// One element of the response, with its attributes, text and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn first_child(&self) -> Option<&XmlElement> {
        self.children.first()
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Attribute value, falling back to the text of a same-named child element
    pub fn attr_or_child_text(&self, name: &str) -> Option<&str> {
        self.attr(name)
            .or_else(|| self.child(name).map(|c| c.text()))
    }
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, FlickrError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if root.is_some() {
                        return Err(FlickrError::XmlParse(
                            "content after the root element".into(),
                        ));
                    }
                    stack.push(element_from(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = element_from(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| FlickrError::XmlParse("unexpected end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| FlickrError::XmlParse(e.to_string()))?;
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::CData(e)) => {
                    let bytes = e.into_inner();
                    push_text(&mut stack, &String::from_utf8_lossy(&bytes))?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(FlickrError::XmlParse(format!(
                        "at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                // Declarations, comments, processing instructions
                _ => (),
            }
        }

        if let Some(open) = stack.last() {
            return Err(FlickrError::XmlParse(format!(
                "element <{}> is not closed",
                open.name
            )));
        }
        root.map(|root| Self { root })
            .ok_or_else(|| FlickrError::XmlParse("document has no root element".into()))
    }
}

fn element_from(start: &BytesStart) -> Result<XmlElement, FlickrError> {
    let mut element = XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FlickrError::XmlParse(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| FlickrError::XmlParse(e.to_string()))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).to_string(),
            value.to_string(),
        ));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), FlickrError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(FlickrError::XmlParse(
                "more than one root element".into(),
            ));
        }
    }
    Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), FlickrError> {
    match stack.last_mut() {
        Some(parent) => parent.text.push_str(text),
        None if text.trim().is_empty() => (),
        None => {
            return Err(FlickrError::XmlParse(
                "text outside of the root element".into(),
            ));
        }
    }
    Ok(())
}

/// Builds a typed response from a parsed document.
///
/// Implementations decide what the `stat` attribute means for them; the
/// transport only hands over the document.
pub trait FlickrResponse: Sized {
    fn from_document(document: XmlDocument) -> Result<Self, FlickrError>;
}

/// The raw document, without any status check
impl FlickrResponse for XmlDocument {
    fn from_document(document: XmlDocument) -> Result<Self, FlickrError> {
        Ok(document)
    }
}

/// Value of the root `stat` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stat {
    Ok,
    Fail,
}

/// Standard `<rsp stat="...">` response.
///
/// A `fail` status becomes [`FlickrError::ApiResponse`] carrying the `err`
/// element's code and message.
#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    stat: Stat,
    root: XmlElement,
}

impl RestResponse {
    pub fn stat(&self) -> Stat {
        self.stat
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// The first element inside `<rsp>`, which holds the method's result
    pub fn payload(&self) -> Option<&XmlElement> {
        self.root.first_child()
    }

    pub fn payloads(&self) -> &[XmlElement] {
        &self.root.children
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

impl FlickrResponse for RestResponse {
    fn from_document(document: XmlDocument) -> Result<Self, FlickrError> {
        let root = document.root;
        let stat = root.attr("stat").map(String::from).ok_or_else(|| {
            FlickrError::Construction(format!("<{}> has no stat attribute", root.name))
        })?;

        match Stat::from_str(&stat) {
            Ok(Stat::Ok) => Ok(Self {
                stat: Stat::Ok,
                root,
            }),
            Ok(Stat::Fail) => Err(api_error(&root)),
            Err(_) => Err(FlickrError::Construction(format!(
                "unknown stat '{}'",
                stat
            ))),
        }
    }
}

fn api_error(root: &XmlElement) -> FlickrError {
    let err = root.child("err");
    let code = err
        .and_then(|e| e.attr_or_child_text("code"))
        .unwrap_or_default();
    let message = err
        .and_then(|e| e.attr_or_child_text("msg"))
        .unwrap_or_default();
    FlickrError::ApiResponse {
        code: code.to_string(),
        message: message.to_string(),
    }
}

/// Turns a raw HTTP response into `T`.
///
/// Failing HTTP statuses are reported before the body is looked at. A body
/// starting with `oauth_problem=` is an OAuth error string, not XML.
pub fn parse_response<T: FlickrResponse>(raw: &RawResponse) -> Result<T, FlickrError> {
    if !raw.success {
        warn!("Flickr returned HTTP {} {}", raw.status, raw.message);
        return Err(FlickrError::ServiceUnavailable {
            status: raw.status,
            message: raw.message.clone(),
        });
    }

    let body = raw.body.trim();
    trace!("{}", body);

    if body.starts_with("oauth_problem=") {
        warn!("OAuth problem: {}", body);
        let problem = url::form_urlencoded::parse(body.as_bytes())
            .find(|(k, _)| k == OAUTH_PROBLEM)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        return Err(FlickrError::OAuthProblem {
            problem,
            body: body.to_string(),
        });
    }

    let document = XmlDocument::parse(body)?;
    T::from_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_raw(body: &str) -> RawResponse {
        RawResponse {
            status: 200,
            success: true,
            message: "OK".into(),
            body: body.into(),
        }
    }

    #[test]
    fn ok_response_is_success() {
        let resp: RestResponse = parse_response(&ok_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
            <rsp stat="ok">
                <user id="12037949754@N01" nsid="12037949754@N01">
                    <username>Bees &amp; Co</username>
                </user>
            </rsp>"#,
        ))
        .unwrap();
        assert_eq!(resp.stat(), Stat::Ok);
        let user = resp.payload().unwrap();
        assert_eq!(user.name, "user");
        assert_eq!(user.attr("nsid"), Some("12037949754@N01"));
        assert_eq!(user.child("username").unwrap().text(), "Bees & Co");
    }

    #[test]
    fn ok_with_text_content() {
        let resp: RestResponse = parse_response(&ok_raw(r#"<rsp stat="ok">...</rsp>"#)).unwrap();
        assert_eq!(resp.root().text(), "...");
        assert!(resp.payload().is_none());
    }

    #[test]
    fn fail_response_is_api_error() {
        let err = parse_response::<RestResponse>(&ok_raw(
            r#"<rsp stat="fail"><err code="1" msg="x"/></rsp>"#,
        ))
        .unwrap_err();
        match err {
            FlickrError::ApiResponse { code, message } => {
                assert_eq!(code, "1");
                assert_eq!(message, "x");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn fail_code_from_child_elements() {
        let err = parse_response::<RestResponse>(&ok_raw(
            r#"<rsp stat="fail"><err><code>98</code><msg>Invalid auth token</msg></err></rsp>"#,
        ))
        .unwrap_err();
        assert_eq!(err.code(), Some("98"));
        assert!(err.to_string().contains("Invalid auth token"));
    }

    #[test]
    fn oauth_problem_is_not_a_parse_error() {
        let err =
            parse_response::<RestResponse>(&ok_raw("  oauth_problem=token_expired\n")).unwrap_err();
        assert!(matches!(
            &err,
            FlickrError::OAuthProblem { problem, .. } if problem == "token_expired"
        ));

        let err = parse_response::<RestResponse>(&ok_raw(
            "oauth_problem=signature_invalid&debug_sbs=GET&x",
        ))
        .unwrap_err();
        match err {
            FlickrError::OAuthProblem { problem, body } => {
                assert_eq!(problem, "signature_invalid");
                assert_eq!(body, "oauth_problem=signature_invalid&debug_sbs=GET&x");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn http_failure_ignores_body() {
        let raw = RawResponse {
            status: 503,
            success: false,
            message: "Service Unavailable".into(),
            body: r#"<rsp stat="ok"/>"#.into(),
        };
        let err = parse_response::<RestResponse>(&raw).unwrap_err();
        assert!(matches!(
            &err,
            FlickrError::ServiceUnavailable { status: 503, message } if message == "Service Unavailable"
        ));
        assert_eq!(err.code(), Some("105"));
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        for body in [
            "<rsp stat=\"ok\"><photo></rsp>",
            "<rsp stat=\"ok\">",
            "",
            "not xml at all",
            "<rsp stat=\"ok\"/><rsp stat=\"ok\"/>",
        ] {
            let err = parse_response::<RestResponse>(&ok_raw(body)).unwrap_err();
            assert!(matches!(err, FlickrError::XmlParse(_)), "{:?} gave {:?}", body, err);
        }
    }

    #[test]
    fn missing_stat_is_construction_error() {
        let err = parse_response::<RestResponse>(&ok_raw("<rsp/>")).unwrap_err();
        assert!(matches!(err, FlickrError::Construction(_)));
        let err = parse_response::<RestResponse>(&ok_raw(r#"<rsp stat="maybe"/>"#)).unwrap_err();
        assert!(matches!(err, FlickrError::Construction(_)));
    }

    #[test]
    fn raw_document_skips_status_check() {
        let doc: XmlDocument =
            parse_response(&ok_raw(r#"<rsp stat="fail"><err code="2" msg="y"/></rsp>"#)).unwrap();
        assert_eq!(doc.root.child("err").unwrap().attr("code"), Some("2"));
    }

    #[test]
    fn children_named_iterates_in_order() {
        let doc = XmlDocument::parse(
            r#"<photos page="1"><photo id="1"/><photo id="2"/><total>2</total></photos>"#,
        )
        .unwrap();
        let ids: Vec<&str> = doc
            .root
            .children_named("photo")
            .filter_map(|p| p.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(doc.root.attr_or_child_text("total"), Some("2"));
    }
}
