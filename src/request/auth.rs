use reqwest::blocking::RequestBuilder;
use reqwest::header::AUTHORIZATION;

use super::RequestContext;
use crate::token::Token;

/// The single authentication mechanism attached to a call.
///
/// A token always wins over credentials; credentials are only used when
/// both the email and the password are non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth<'a> {
    Token(&'a Token),
    Basic { email: &'a str, password: &'a str },
    None,
}

impl<'a> Auth<'a> {
    /// Picks the mechanism for `ctx` as it is right now.
    pub fn resolve(ctx: &'a RequestContext) -> Self {
        if let Some(token) = ctx.token() {
            Auth::Token(token)
        } else if !ctx.email().is_empty() && !ctx.password().is_empty() {
            Auth::Basic {
                email: ctx.email(),
                password: ctx.password(),
            }
        } else {
            Auth::None
        }
    }

    /// Short name for logs; never includes the credential itself.
    pub fn scheme(&self) -> &'static str {
        match self {
            Auth::Token(_) => "token",
            Auth::Basic { .. } => "basic",
            Auth::None => "none",
        }
    }

    /// Value of the `Authorization` header for token authentication.
    pub fn token_header(token: &Token) -> String {
        format!("cc_auth_token=\"{}\"", token.key())
    }

    pub(crate) fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Token(token) => builder.header(AUTHORIZATION, Self::token_header(token)),
            Auth::Basic { email, password } => builder.basic_auth(email, Some(password)),
            Auth::None => builder,
        }
    }
}
