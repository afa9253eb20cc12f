//! Auth token returned by the token source.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Result;

/// Field holding the bearer credential inside a token.
pub const TOKEN_KEY_FIELD: &str = "token";

/// Opaque credential bag.
///
/// The token source answers with a flat JSON object; only the `"token"`
/// entry is used when authenticating, the rest is carried along untouched.
/// Non-string values (expiry timestamps, numeric ids) are kept in their
/// JSON text form.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, serde_json::Value>")]
pub struct Token(HashMap<String, String>);

impl From<HashMap<String, serde_json::Value>> for Token {
    fn from(raw: HashMap<String, serde_json::Value>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect();
        Self(entries)
    }
}

impl Token {
    /// Creates a token whose key is `key`.
    pub fn new(key: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(TOKEN_KEY_FIELD.to_string(), key.into());
        Self(entries)
    }

    /// Decodes a token-source response body.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// The canonical key sent in the `Authorization` header. Empty if absent.
    pub fn key(&self) -> &str {
        self.get(TOKEN_KEY_FIELD).unwrap_or("")
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        fields.sort_unstable();
        f.debug_struct("Token")
            .field("fields", &fields)
            .finish_non_exhaustive()
    }
}
