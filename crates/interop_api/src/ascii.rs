use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTokenError {
    Empty,
    /// A byte outside the `tchar` set, with its offset
    InvalidByte(usize),
    /// An uppercase ASCII letter, with its offset
    Uppercase(usize),
}

impl fmt::Display for InvalidTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty token"),
            Self::InvalidByte(at) => write!(f, "invalid token byte at offset {at}"),
            Self::Uppercase(at) => write!(f, "uppercase letter at offset {at}"),
        }
    }
}

impl std::error::Error for InvalidTokenError {}

/// Token characters
/// SPEC: RFC 9110 5.6.2 Tokens
/// ABNF: tchar = "!" / "#" / "$" / "%" / "&" / "'" / "*" / "+" / "-" / "." / "^" / "_" / "`" / "|" / "~" / DIGIT / ALPHA
pub fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

pub fn validate_token(s: &str) -> Result<(), InvalidTokenError> {
    if s.is_empty() {
        return Err(InvalidTokenError::Empty);
    }
    match s.bytes().position(|b| !is_tchar(b)) {
        Some(at) => Err(InvalidTokenError::InvalidByte(at)),
        None => Ok(()),
    }
}

/// Validates a token which must already be in lowercase, such as a normalized field name
pub fn validate_lowercase_token(s: &str) -> Result<(), InvalidTokenError> {
    validate_token(s)?;
    match s.bytes().position(|b| b.is_ascii_uppercase()) {
        Some(at) => Err(InvalidTokenError::Uppercase(at)),
        None => Ok(()),
    }
}
