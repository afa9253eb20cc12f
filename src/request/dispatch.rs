use std::time::Instant;

use reqwest::Method;
use reqwest::blocking::Request;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use super::auth::Auth;
use super::client::TlsClient;
use super::{Form, RequestContext};
use crate::error::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const ACCEPTED_ENCODINGS: &str = "compress, gzip";

/// Which configured base URL a call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The main API base URL.
    Api,
    /// The token-source URL, used only to obtain a token.
    TokenSource,
}

impl RequestContext {
    /// Builds the request a call would send, without sending it.
    ///
    /// A TLS-configured client is constructed to assemble the request, so this
    /// costs as much setup as a real call minus the network round trip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] or [`Error::NotABaseUrl`] for a bad base
    /// URL and [`Error::Request`] if the client or request cannot be built.
    pub fn prepare(
        &self,
        resource: &str,
        method: Method,
        data: &Form,
        target: Target,
    ) -> Result<Request> {
        let url = self.resolve_url(resource, target)?;
        let client = TlsClient::new(self.ssl_check(), self.ca_certs())?;
        self.assemble(&client, url, method, data)
    }

    #[tracing::instrument(skip(self, method, data), fields(method = %method))]
    pub(super) fn dispatch(
        &self,
        resource: &str,
        method: Method,
        data: &Form,
        target: Target,
    ) -> Result<Vec<u8>> {
        let url = self.resolve_url(resource, target)?;
        let client = TlsClient::new(self.ssl_check(), self.ca_certs())?;
        let request = self.assemble(&client, url, method, data)?;

        debug!(
            url = %request.url(),
            auth = Auth::resolve(self).scheme(),
            body_len = request.body().and_then(|b| b.as_bytes()).map_or(0, <[u8]>::len),
            ssl_check = self.ssl_check(),
            "Sending request"
        );

        let start = Instant::now();
        let response = client.execute(request).map_err(Error::Transport)?;
        let status = response.status();
        debug!(
            %status,
            elapsed = ?start.elapsed(),
            "Response received"
        );

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(%status, body_len = body.len(), "API returned non-success status");
            return Err(Error::Status { status, body });
        }

        let bytes = response.bytes().map_err(Error::Body)?;
        Ok(bytes.to_vec())
    }

    fn resolve_url(&self, resource: &str, target: Target) -> Result<Url> {
        let base = match target {
            Target::Api => self.url(),
            Target::TokenSource => self.token_source_url(),
        };

        let mut url = Url::parse(base).map_err(|source| Error::InvalidUrl {
            url: base.to_string(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::NotABaseUrl(base.to_string()));
        }

        if !resource.is_empty() {
            url.set_path(resource);
        }
        Ok(url)
    }

    fn assemble(&self, client: &TlsClient, url: Url, method: Method, data: &Form) -> Result<Request> {
        let body = encode_form(data);
        let host = host_header(&url);
        let is_form = method == Method::POST || method == Method::PUT;

        let mut builder = client
            .inner()
            .request(method, url)
            .header(HOST, host)
            .header(USER_AGENT, crate::USER_AGENT)
            .header(CONTENT_LENGTH, body.len().to_string())
            .header(ACCEPT_ENCODING, ACCEPTED_ENCODINGS);
        if is_form {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        }

        Auth::resolve(self)
            .apply(builder)
            .body(body)
            .build()
            .map_err(Error::Request)
    }
}

fn encode_form(data: &Form) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(data.iter())
        .finish()
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use reqwest::header::AUTHORIZATION;
    use tracing_test::traced_test;

    fn ctx(token: Option<Token>) -> RequestContext {
        RequestContext::new(
            "user@example.com",
            "password",
            "https://api.com:8443/base?x=1",
            token,
            "https://auth.api.com/token/",
        )
    }

    fn form(pairs: &[(&str, &str)]) -> Form {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn body_of(req: &Request) -> &[u8] {
        req.body().and_then(|b| b.as_bytes()).unwrap_or_default()
    }

    fn header<'a>(req: &'a Request, name: reqwest::header::HeaderName) -> Option<&'a str> {
        req.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_get_sends_empty_body_and_zero_length() {
        let req = ctx(None)
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap();

        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.url().as_str(), "https://api.com:8443/things?x=1");
        assert_eq!(body_of(&req), b"");
        assert_eq!(header(&req, CONTENT_LENGTH), Some("0"));
        assert_eq!(header(&req, CONTENT_TYPE), None);
    }

    #[test]
    fn test_post_encodes_form_body() {
        let req = ctx(None)
            .prepare("/things", Method::POST, &form(&[("a", "1")]), Target::Api)
            .unwrap();

        assert_eq!(body_of(&req), b"a=1");
        assert_eq!(header(&req, CONTENT_TYPE), Some(FORM_CONTENT_TYPE));
        assert_eq!(header(&req, CONTENT_LENGTH), Some("3"));
    }

    #[test]
    fn test_form_is_sorted_and_escaped() {
        let data = form(&[("name", "my app"), ("b", "x&y"), ("a", "1")]);
        assert_eq!(encode_form(&data), "a=1&b=x%26y&name=my+app");
    }

    #[test]
    fn test_put_sets_content_type_but_delete_does_not() {
        let put = ctx(None)
            .prepare("/things/1", Method::PUT, &form(&[("a", "2")]), Target::Api)
            .unwrap();
        assert_eq!(header(&put, CONTENT_TYPE), Some(FORM_CONTENT_TYPE));

        let delete = ctx(None)
            .prepare("/things/1", Method::DELETE, &Form::new(), Target::Api)
            .unwrap();
        assert_eq!(header(&delete, CONTENT_TYPE), None);
        assert_eq!(header(&delete, CONTENT_LENGTH), Some("0"));
    }

    #[test]
    fn test_fixed_headers() {
        let req = ctx(None)
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap();

        assert_eq!(header(&req, HOST), Some("api.com:8443"));
        assert_eq!(header(&req, USER_AGENT), Some(crate::USER_AGENT));
        assert_eq!(header(&req, ACCEPT_ENCODING), Some("compress, gzip"));
    }

    #[test]
    fn test_empty_resource_keeps_base_path() {
        let req = ctx(None)
            .prepare("", Method::GET, &Form::new(), Target::Api)
            .unwrap();
        assert_eq!(req.url().path(), "/base");
    }

    #[test]
    fn test_token_source_target() {
        let req = ctx(None)
            .prepare("", Method::POST, &Form::new(), Target::TokenSource)
            .unwrap();

        assert_eq!(req.url().as_str(), "https://auth.api.com/token/");
        assert_eq!(header(&req, HOST), Some("auth.api.com"));
    }

    #[test]
    fn test_token_header_wins_over_basic() {
        let req = ctx(Some(Token::new("1234567890")))
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap();

        assert_eq!(
            header(&req, AUTHORIZATION),
            Some("cc_auth_token=\"1234567890\"")
        );
    }

    #[test]
    fn test_basic_auth_without_token() {
        let req = ctx(None)
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap();

        assert_eq!(
            header(&req, AUTHORIZATION),
            Some("Basic dXNlckBleGFtcGxlLmNvbTpwYXNzd29yZA==")
        );
    }

    #[test]
    fn test_no_auth_without_credentials() {
        let mut ctx = ctx(None);
        ctx.set_password("");

        let req = ctx
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap();
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut ctx = ctx(None);
        ctx.set_url("::not a url::");

        let err = ctx.get("/things").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }), "got {err:?}");
    }

    #[test]
    fn test_relative_base_url_is_rejected() {
        let mut ctx = ctx(None);
        ctx.set_url("/only/a/path");

        let err = ctx
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_cannot_be_a_base_url_is_rejected() {
        let mut ctx = ctx(None);
        ctx.set_url("mailto:user@example.com");

        let err = ctx
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap_err();
        assert!(matches!(err, Error::NotABaseUrl(_)));
    }

    #[test]
    fn test_invalid_token_key_is_a_request_error() {
        let ctx = ctx(Some(Token::new("bad\nkey")));

        let err = ctx
            .prepare("/things", Method::GET, &Form::new(), Target::Api)
            .unwrap_err();
        assert!(matches!(err, Error::Request(_)));
    }

    #[traced_test]
    #[test]
    fn test_logs_before_and_after_call() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/things")
            .with_status(500)
            .with_body("boom")
            .create();

        let mut ctx = ctx(Some(Token::new("1234567890")));
        ctx.set_url(server.url());
        let err = ctx.get("/things").unwrap_err();

        assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
        assert!(logs_contain("Sending request"));
        assert!(logs_contain("auth=\"token\""));
        assert!(logs_contain("Response received"));
        assert!(logs_contain("API returned non-success status"));
        assert!(!logs_contain("1234567890"));
    }
}
