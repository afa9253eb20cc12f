//! Authenticated request context and its verb entry points.
//!
//! A [`RequestContext`] is built once with credentials, a base URL and a
//! token-source URL. Every verb call funnels into one dispatch routine that
//! resolves the URL, builds a client with the context's TLS policy,
//! attaches exactly one authentication header and returns the fully
//! buffered response body.

mod auth;
mod client;
mod dispatch;

pub use auth::Auth;
pub use dispatch::Target;

use std::collections::BTreeMap;

use reqwest::{Certificate, Method};
use tracing::debug;

use crate::error::Result;
use crate::token::Token;
use crate::{DEFAULT_CACHE, DEFAULT_SSL_CHECK};

/// Form payload sent as `application/x-www-form-urlencoded`, encoded in key order.
pub type Form = BTreeMap<String, String>;

/// Session configuration for outgoing API calls.
///
/// The context has no internal synchronization: mutate it before issuing
/// calls, or guard it externally when shared between threads.
#[derive(Clone)]
pub struct RequestContext {
    email: String,
    password: String,
    token: Option<Token>,
    token_source_url: String,
    version: String,
    cache: String,
    url: String,
    ssl_check: bool,
    ca_certs: Option<Vec<Certificate>>,
}

impl RequestContext {
    /// Creates a context; version, cache, TLS check and CA set take the
    /// process-wide defaults.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        token: Option<Token>,
        token_source_url: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            token,
            token_source_url: token_source_url.into(),
            version: crate::version().to_string(),
            cache: DEFAULT_CACHE.to_string(),
            url: url.into(),
            ssl_check: DEFAULT_SSL_CHECK,
            ca_certs: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn token_source_url(&self) -> &str {
        &self.token_source_url
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn cache(&self) -> &str {
        &self.cache
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ssl_check(&self) -> bool {
        self.ssl_check
    }

    pub fn ca_certs(&self) -> Option<&[Certificate]> {
        self.ca_certs.as_deref()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_token(&mut self, token: Option<Token>) {
        self.token = token;
    }

    pub fn set_cache(&mut self, cache: impl Into<String>) {
        self.cache = cache.into();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_token_source_url(&mut self, url: impl Into<String>) {
        self.token_source_url = url.into();
    }

    pub fn enable_ssl_check(&mut self) {
        self.ssl_check = true;
    }

    pub fn disable_ssl_check(&mut self) {
        self.ssl_check = false;
    }

    /// Replaces the trusted roots. `None` falls back to the platform roots.
    pub fn set_ca_certs(&mut self, ca_certs: Option<Vec<Certificate>>) {
        self.ca_certs = ca_certs;
    }

    pub fn get(&self, resource: &str) -> Result<Vec<u8>> {
        self.dispatch(resource, Method::GET, &Form::new(), Target::Api)
    }

    pub fn post(&self, resource: &str, data: &Form) -> Result<Vec<u8>> {
        self.dispatch(resource, Method::POST, data, Target::Api)
    }

    pub fn put(&self, resource: &str, data: &Form) -> Result<Vec<u8>> {
        self.dispatch(resource, Method::PUT, data, Target::Api)
    }

    pub fn delete(&self, resource: &str) -> Result<Vec<u8>> {
        self.dispatch(resource, Method::DELETE, &Form::new(), Target::Api)
    }

    /// POSTs an empty body to the token-source URL and returns its raw answer.
    pub fn post_token(&self) -> Result<Vec<u8>> {
        self.dispatch("", Method::POST, &Form::new(), Target::TokenSource)
    }

    /// Fetches a new token from the token source and stores it.
    ///
    /// The request is authenticated like any other call, so a token that is
    /// already set is sent in place of the email and password.
    pub fn refresh_token(&mut self) -> Result<&Token> {
        let body = self.post_token()?;
        let token = Token::from_json(&body)?;
        debug!(fields = ?token, "Token refreshed");
        let token: &Token = self.token.insert(token);
        Ok(token)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("token", &self.token)
            .field("token_source_url", &self.token_source_url)
            .field("version", &self.version)
            .field("cache", &self.cache)
            .field("url", &self.url)
            .field("ssl_check", &self.ssl_check)
            .field("ca_certs", &self.ca_certs.as_ref().map(Vec::len))
            .finish()
    }
}
