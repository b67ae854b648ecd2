use std::{
    fmt,
    net::{AddrParseError, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedHostError {
    #[error("empty host")]
    Empty,
    #[error("invalid IPv6 address")]
    InvalidAddress(#[from] AddrParseError),
    #[error("invalid IPvFuture literal")]
    InvalidFuture,
    #[error("host cannot contain {0:?}")]
    InvalidCharacter(char),
}

/// SPEC: RFC 3986 3.2.2. Host
/// ABNF: IP-literal = "[" ( IPv6address / IPvFuture  ) "]"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpLiteral {
    Ipv6(Ipv6Addr),
    IpvFuture(IpvFuture),
}

impl IpLiteral {
    fn from_str(s: &str) -> Result<Option<Self>, MalformedHostError> {
        let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) else {
            return Ok(None);
        };
        Ok(Some(match inner.strip_prefix(['v', 'V']) {
            Some(future) => Self::IpvFuture(future.parse()?),
            None => Self::Ipv6(inner.parse()?),
        }))
    }
}

/// ABNF: IPvFuture = "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpvFuture {
    pub version: String,
    pub address: String,
}

impl FromStr for IpvFuture {
    type Err = MalformedHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (version, address) = s.split_once('.').ok_or(MalformedHostError::InvalidFuture)?;
        if version.is_empty() || !version.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MalformedHostError::InvalidFuture);
        }
        let valid_address = !address.is_empty()
            && address.bytes().all(|b| {
                b.is_ascii_alphanumeric()
                    || matches!(
                        b,
                        b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')'
                            | b'*' | b'+' | b',' | b';' | b'=' | b':'
                    )
            });
        if !valid_address {
            return Err(MalformedHostError::InvalidFuture);
        }
        Ok(Self {
            version: version.to_string(),
            address: address.to_string(),
        })
    }
}

/// The host component of a URL, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlHost {
    IpLiteral(IpLiteral),
    Ipv4(Ipv4Addr),
    RegName(String),
}

impl FromStr for UrlHost {
    type Err = MalformedHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(MalformedHostError::Empty);
        }
        if let Some(addr) = IpLiteral::from_str(s)? {
            return Ok(Self::IpLiteral(addr));
        }
        // A dotted quad that fails to parse as IPv4 is still a valid reg-name
        if let Ok(ipv4) = Ipv4Addr::from_str(s) {
            return Ok(Self::Ipv4(ipv4));
        }
        if let Some(ch) = s
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || "/?#@[]:\\".contains(*c))
        {
            return Err(MalformedHostError::InvalidCharacter(ch));
        }
        Ok(Self::RegName(s.to_string()))
    }
}

impl fmt::Display for UrlHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IpLiteral(IpLiteral::Ipv6(addr)) => write!(f, "[{addr}]"),
            Self::IpLiteral(IpLiteral::IpvFuture(future)) => {
                write!(f, "[v{}.{}]", future.version, future.address)
            }
            Self::Ipv4(addr) => fmt::Display::fmt(addr, f),
            Self::RegName(name) => f.write_str(name),
        }
    }
}
