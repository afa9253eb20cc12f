//! Client-side request builder for the cloudControl-style HTTP API.
//!
//! Build a [`RequestContext`] once, then call its verb methods. Each call is
//! a blocking round trip that returns the raw response body.

pub mod config;
pub mod error;
pub mod request;
pub mod token;

pub use error::{Error, Result};
pub use request::{Auth, Form, RequestContext, Target};
pub use token::Token;

/// Base URL of the public API.
pub const DEFAULT_API_URL: &str = "https://api.cloudcontrolled.com";

/// Endpoint that hands out tokens in exchange for email and password.
pub const DEFAULT_TOKEN_SOURCE_URL: &str = "https://api.cloudcontrolled.com/token/";

/// Cache tag stored on new contexts.
pub const DEFAULT_CACHE: &str = "";

/// Whether new contexts verify server certificates.
pub const DEFAULT_SSL_CHECK: bool = true;

/// `User-Agent` sent with every call.
pub const USER_AGENT: &str = concat!("cclib/", env!("CARGO_PKG_VERSION"));

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
