use reqwest::Certificate;
use reqwest::blocking::{Client, Request, Response};

use crate::error::{Error, Result};

/// A blocking client built for one call with that call's TLS policy.
pub(crate) struct TlsClient(Client);

impl TlsClient {
    /// Skips certificate verification entirely when `ssl_check` is false.
    /// Otherwise a configured CA set replaces the platform roots.
    pub(crate) fn new(ssl_check: bool, ca_certs: Option<&[Certificate]>) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!ssl_check);

        if let (true, Some(certs)) = (ssl_check, ca_certs) {
            builder = builder.tls_built_in_root_certs(false);
            for cert in certs {
                builder = builder.add_root_certificate(cert.clone());
            }
        }

        builder.build().map(Self).map_err(Error::Request)
    }

    pub(crate) fn inner(&self) -> &Client {
        &self.0
    }

    pub(crate) fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.0.execute(req)
    }
}
