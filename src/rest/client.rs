/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::errors::FlickrError;
use crate::rest::{
    Creds, FlickrResponse, HmacSha1Signer, HttpExecutor, Payload, ReqwestExecutor,
    RequestContext, RequestDescriptor, RestConfig, SignatureService, SignedRequest,
    UploadMetaData, parse_response, sign,
};
use reqwest::header::PROXY_AUTHORIZATION;
use std::sync::Arc;

/// REST transport for the Flickr API.
///
/// Signs each call with OAuth1.0a using the access token found in the
/// [`RequestContext`] passed to it, sends it, and turns the XML answer into
/// the requested [`FlickrResponse`] type.
///
/// Configuration is fixed at construction; a transport can be cloned and
/// shared between concurrent calls.
///
/// ```no_run
/// use flickr::rest::{AccessToken, RequestContext, Rest, RestResponse};
///
/// # async fn run() -> Result<(), flickr::rest::FlickrError> {
/// let rest = Rest::new("api-key", "shared-secret")?;
/// let ctx = RequestContext::authenticated(AccessToken::new("token", "token-secret"));
/// let resp: RestResponse = rest
///     .get(rest.path(), [("method", "flickr.test.login")], &ctx)
///     .await?;
/// println!("{:?}", resp.payload());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Rest<E = ReqwestExecutor> {
    creds: Creds,
    config: RestConfig,
    signer: Arc<dyn SignatureService>,
    executor: E,
}

impl Rest<ReqwestExecutor> {
    /// Transport for the public Flickr endpoint
    pub fn new(api_key: &str, shared_secret: &str) -> Result<Self, FlickrError> {
        Self::with_config(api_key, shared_secret, RestConfig::default())
    }

    pub fn with_host(api_key: &str, shared_secret: &str, host: &str) -> Result<Self, FlickrError> {
        Self::with_config(api_key, shared_secret, RestConfig::default().with_host(host))
    }

    pub fn with_host_and_port(
        api_key: &str,
        shared_secret: &str,
        host: &str,
        port: u16,
    ) -> Result<Self, FlickrError> {
        Self::with_config(
            api_key,
            shared_secret,
            RestConfig::default().with_host(host).with_port(port),
        )
    }

    pub fn with_config(
        api_key: &str,
        shared_secret: &str,
        config: RestConfig,
    ) -> Result<Self, FlickrError> {
        let executor = ReqwestExecutor::new(&config)?;
        Ok(Self::with_executor(api_key, shared_secret, config, executor))
    }
}

impl<E: HttpExecutor> Rest<E> {
    /// Transport sending its requests through `executor`
    pub fn with_executor(
        api_key: &str,
        shared_secret: &str,
        config: RestConfig,
        executor: E,
    ) -> Self {
        Self {
            creds: Creds::new(api_key, shared_secret),
            config,
            signer: Arc::new(HmacSha1Signer::new()),
            executor,
        }
    }

    /// Replaces the OAuth signature service
    pub fn with_signer(self, signer: impl SignatureService + 'static) -> Self {
        Self {
            signer: Arc::new(signer),
            ..self
        }
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub fn api_key(&self) -> &str {
        self.creds.api_key()
    }

    /// Path of the standard REST endpoint
    pub fn path(&self) -> &str {
        &self.config.path
    }

    pub fn upload_path(&self) -> &str {
        &self.config.upload_path
    }

    pub fn replace_path(&self) -> &str {
        &self.config.replace_path
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.origin(), path)
    }

    pub fn is_proxy_auth(&self) -> bool {
        self.config.proxy.as_ref().is_some_and(|p| p.is_auth())
    }

    /// Base64 `user:password` of the configured proxy
    pub fn proxy_credentials(&self) -> Option<String> {
        self.config.proxy.as_ref().and_then(|p| p.credentials())
    }

    /// Signed GET; every parameter goes in the query string
    pub async fn get<T, I, K, V>(
        &self,
        path: &str,
        params: I,
        context: &RequestContext,
    ) -> Result<T, FlickrError>
    where
        T: FlickrResponse,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let descriptor = RequestDescriptor::get(&self.build_url(path), params);
        let request = self.sign(descriptor, context)?;
        self.handle_response(request).await
    }

    /// Signed form POST
    pub async fn post<T, I, K, V>(
        &self,
        path: &str,
        params: I,
        context: &RequestContext,
    ) -> Result<T, FlickrError>
    where
        T: FlickrResponse,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let descriptor = RequestDescriptor::post(&self.build_url(path), params);
        let request = self.sign(descriptor, context)?;
        self.handle_response(request).await
    }

    /// Signed multipart POST uploading `payload` as the `photo` part
    pub async fn post_multipart<T: FlickrResponse>(
        &self,
        path: &str,
        meta: &UploadMetaData,
        payload: &Payload,
        context: &RequestContext,
    ) -> Result<T, FlickrError> {
        let descriptor = RequestDescriptor::multipart(&self.build_url(path), meta, payload);
        let request = self.sign(descriptor, context)?;
        self.handle_response(request).await
    }

    /// Plain GET carrying only `params`: no OAuth parameters, no api key.
    ///
    /// Only meant for the token checking and exchange methods.
    pub async fn get_non_oauth<T, I, K, V>(&self, path: &str, params: I) -> Result<T, FlickrError>
    where
        T: FlickrResponse,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let descriptor = self.with_proxy_auth(RequestDescriptor::get(&self.build_url(path), params));
        self.handle_response(SignedRequest::unsigned(descriptor))
            .await
    }

    fn with_proxy_auth(&self, mut descriptor: RequestDescriptor) -> RequestDescriptor {
        if let Some(header) = self
            .config
            .proxy
            .as_ref()
            .and_then(|p| p.authorization_header())
        {
            descriptor.add_header(PROXY_AUTHORIZATION.as_str(), &header);
        }
        descriptor
    }

    fn sign(
        &self,
        descriptor: RequestDescriptor,
        context: &RequestContext,
    ) -> Result<SignedRequest, FlickrError> {
        let descriptor = self.with_proxy_auth(descriptor);
        sign(descriptor, &self.creds, context, self.signer.as_ref())
    }

    async fn handle_response<T: FlickrResponse>(
        &self,
        request: SignedRequest,
    ) -> Result<T, FlickrError> {
        request.check_coverage()?;
        let raw = self.executor.execute(&request).await?;
        parse_response(&raw)
    }
}

impl<E> std::fmt::Debug for Rest<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rest")
            .field("creds", &self.creds)
            .field("config", &self.config)
            .finish()
    }
}
