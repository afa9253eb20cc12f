//! Environment-driven configuration for building a [`RequestContext`].
//!
//! Recognised variables (all optional):
//! ```text
//! CCLIB_EMAIL             account email
//! CCLIB_PASSWORD          account password
//! CCLIB_TOKEN             pre-issued token key
//! CCLIB_URL               API base URL
//! CCLIB_TOKEN_SOURCE_URL  token endpoint
//! CCLIB_SSL_CHECK         true/false, 1/0, yes/no
//! CCLIB_CA_BUNDLE         path to a PEM file of trusted roots
//! ```

use std::path::{Path, PathBuf};

use reqwest::Certificate;
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::RequestContext;
use crate::token::Token;
use crate::{DEFAULT_API_URL, DEFAULT_SSL_CHECK, DEFAULT_TOKEN_SOURCE_URL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub email: String,
    pub password: String,
    pub token: Option<String>,
    pub url: String,
    pub token_source_url: String,
    pub ssl_check: bool,
    pub ca_bundle: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            token: None,
            url: DEFAULT_API_URL.to_string(),
            token_source_url: DEFAULT_TOKEN_SOURCE_URL.to_string(),
            ssl_check: DEFAULT_SSL_CHECK,
            ca_bundle: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(email) = lookup("CCLIB_EMAIL") {
            settings.email = email;
        }
        if let Some(password) = lookup("CCLIB_PASSWORD") {
            settings.password = password;
        }
        settings.token = lookup("CCLIB_TOKEN").filter(|t| !t.is_empty());
        if let Some(url) = lookup("CCLIB_URL") {
            settings.url = url;
        }
        if let Some(url) = lookup("CCLIB_TOKEN_SOURCE_URL") {
            settings.token_source_url = url;
        }
        if let Some(raw) = lookup("CCLIB_SSL_CHECK") {
            settings.ssl_check = parse_bool(&raw)
                .ok_or_else(|| Error::Config(format!("CCLIB_SSL_CHECK: not a boolean: '{raw}'")))?;
        }
        settings.ca_bundle = lookup("CCLIB_CA_BUNDLE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(settings)
    }

    /// Builds a context, loading the CA bundle if one is configured.
    pub fn into_context(self) -> Result<RequestContext> {
        let token = self.token.map(Token::new);
        let mut ctx = RequestContext::new(
            self.email,
            self.password,
            self.url,
            token,
            self.token_source_url,
        );

        if !self.ssl_check {
            ctx.disable_ssl_check();
        }
        if let Some(path) = self.ca_bundle {
            ctx.set_ca_certs(Some(load_ca_bundle(&path)?));
        }

        Ok(ctx)
    }
}

/// Loads every certificate from a PEM bundle at `path`.
pub fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Config(format!("failed to read CA bundle '{}': {e}", path.display())))?;
    let certs = Certificate::from_pem_bundle(&pem)
        .map_err(|e| Error::Config(format!("invalid CA bundle '{}': {e}", path.display())))?;

    if certs.is_empty() {
        return Err(Error::Config(format!(
            "CA bundle '{}' contains no certificates",
            path.display()
        )));
    }

    debug!(path = %path.display(), count = certs.len(), "Loaded CA bundle");
    Ok(certs)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
