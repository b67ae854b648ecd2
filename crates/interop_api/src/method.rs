use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::Serialize;
use unicase::UniCase;

/// An HTTP Method
/// SPEC: RFC 9110 9. Methods
///
/// Only the nine registered methods are representable; extension methods are rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
    TRACE,
    CONNECT,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized HTTP method {0:?}")]
pub struct InvalidMethod(pub String);

impl Method {
    pub const ALL: [Self; 9] = [
        Self::GET,
        Self::POST,
        Self::PUT,
        Self::DELETE,
        Self::HEAD,
        Self::OPTIONS,
        Self::PATCH,
        Self::TRACE,
        Self::CONNECT,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GET => "GET",
            Self::POST => "POST",
            Self::PUT => "PUT",
            Self::DELETE => "DELETE",
            Self::HEAD => "HEAD",
            Self::OPTIONS => "OPTIONS",
            Self::PATCH => "PATCH",
            Self::TRACE => "TRACE",
            Self::CONNECT => "CONNECT",
        }
    }

    /// Safe Methods are methods which can be cached by
    /// SPEC: [RFC 9110 9.2.1 Safe Methods](https://httpwg.org/specs/rfc9110.html#safe.methods)
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::GET | Self::HEAD | Self::OPTIONS | Self::TRACE)
    }

    /// Idempotent Methods are requests where the side effects are the same if multiple identical
    /// requests are sent
    /// SPEC: [RFC 9110 9.2.2 Idempotent Methods](https://httpwg.org/specs/rfc9110.html#idempotent.methods)
    pub fn is_idempotent(&self) -> bool {
        match self {
            Self::PUT | Self::DELETE => true,
            other => other.is_safe(),
        }
    }
}

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = UniCase::ascii(s);
        Self::ALL
            .into_iter()
            .find(|method| UniCase::ascii(method.as_str()) == needle)
            .ok_or_else(|| InvalidMethod(s.to_string()))
    }
}

impl From<Method> for &'static str {
    fn from(value: Method) -> Self {
        value.as_str()
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
