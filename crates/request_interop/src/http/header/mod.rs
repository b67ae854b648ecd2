mod map;

use std::{borrow::Borrow, fmt};

pub use map::*;
use request_interop_api::ascii::{InvalidTokenError, validate_lowercase_token};
use serde::Serialize;

/// A header field name, guaranteed to be a non-empty lowercase token
/// SPEC: RFC 9110 5.1 Field Names
/// ABNF: field-name = token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HeaderName(String);

impl HeaderName {
    /// Accepts a name that is already lowercase
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidTokenError> {
        let name = name.into();
        validate_lowercase_token(&name)?;
        Ok(Self(name))
    }

    /// Accepts any token, lowercasing it
    pub fn normalize(name: &str) -> Result<Self, InvalidTokenError> {
        Self::new(name.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for HeaderName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
