use std::{
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use smallvec::SmallVec;

use crate::{ascii::InvalidTokenError, method::InvalidMethod, upload::UploadStatus};

/// The factory input an error was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Upload,
    Body,
    Cookies,
    Files,
    Headers,
    Input,
    Method,
    Query,
    Server,
    Uploads,
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Url => "url",
            Self::Upload => "upload",
            Self::Body => "body",
            Self::Cookies => "cookies",
            Self::Files => "files",
            Self::Headers => "headers",
            Self::Input => "input",
            Self::Method => "method",
            Self::Query => "query",
            Self::Server => "server",
            Self::Uploads => "uploads",
        })
    }
}

/// A key path into a nested input tree, rendered the way form field names nest: `a[b][c]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: SmallVec<[String; 4]>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut segments = self.segments.iter();
        if let Some(first) = segments.next() {
            f.write_str(first)?;
        }
        for segment in segments {
            write!(f, "[{segment}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstructionErrorKind {
    // Url
    InvalidScheme(String),
    PortOutOfRange(i64),
    InvalidPort(String),
    EmptyComponent(&'static str),
    MissingComponent {
        component: &'static str,
        requires: &'static str,
    },
    InvalidHost(String),
    InvalidPath,
    InvalidCharacter {
        component: &'static str,
        found: char,
    },

    // Request scalars
    InvalidMethod(InvalidMethod),
    InvalidHeaderName(InvalidTokenError),

    // Upload
    InvalidUploadStatus(i64),
    InvalidSize(i64),
    EmptyTmpName,

    // Tree shape
    EmptyKey,
    EmptyValue,
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    MissingKey(&'static str),
    UnexpectedKey(String),
    ShapeMismatch(&'static str),
    TooDeep {
        limit: usize,
    },
    TooManyFields {
        limit: usize,
    },
}

impl Display for ConstructionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScheme(scheme) => {
                write!(f, "invalid scheme {scheme:?}, expected http or https")
            }
            Self::PortOutOfRange(port) => write!(f, "port {port} is outside 1..=65535"),
            Self::InvalidPort(port) => write!(f, "port {port:?} is not a decimal number"),
            Self::EmptyComponent(component) => {
                write!(f, "{component} must be absent rather than an empty string")
            }
            Self::MissingComponent {
                component,
                requires,
            } => write!(f, "{component} requires {requires} to be present"),
            Self::InvalidHost(host) => write!(f, "invalid host {host:?}"),
            Self::InvalidPath => f.write_str("path cannot be rendered unambiguously"),
            Self::InvalidCharacter { component, found } => {
                write!(f, "{component} cannot contain {found:?}")
            }
            Self::InvalidMethod(err) => Display::fmt(err, f),
            Self::InvalidHeaderName(err) => write!(f, "invalid header name: {err}"),
            Self::InvalidUploadStatus(code) => {
                write!(f, "upload error code {code} is outside 0..=8")
            }
            Self::InvalidSize(size) => write!(f, "size {size} must be positive"),
            Self::EmptyTmpName => f.write_str("tmp_name must not be empty"),
            Self::EmptyKey => f.write_str("empty key"),
            Self::EmptyValue => f.write_str("empty value"),
            Self::UnexpectedType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::MissingKey(key) => write!(f, "missing required key {key:?}"),
            Self::UnexpectedKey(key) => write!(f, "unexpected key {key:?}"),
            Self::ShapeMismatch(key) => {
                write!(f, "{key:?} does not have the same shape as \"tmp_name\"")
            }
            Self::TooDeep { limit } => write!(f, "nesting exceeds the limit of {limit}"),
            Self::TooManyFields { limit } => write!(f, "more than {limit} fields"),
        }
    }
}

/// Raised by the factory when raw input cannot become a value object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionError {
    pub kind: ConstructionErrorKind,
    pub field: Field,
    /// Where inside a nested tree the problem was noticed, if anywhere
    pub path: Option<FieldPath>,
}

impl ConstructionError {
    pub fn new(kind: ConstructionErrorKind, field: Field) -> Self {
        Self {
            kind,
            field,
            path: None,
        }
    }

    pub fn at(mut self, path: &FieldPath) -> Self {
        if !path.is_empty() {
            self.path = Some(path.clone());
        }
        self
    }
}

impl Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.kind)?;
        if let Some(path) = &self.path {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConstructionError {}

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("stream is closed")]
    Closed,
    #[error("stream source is unavailable: {0}")]
    Unavailable(#[source] io::Error),
    #[error("seek would move the cursor to a negative offset")]
    NegativeOffset,
    #[error("seek would move the cursor past the largest representable offset")]
    OffsetOverflow,
    #[error("read length must be positive")]
    InvalidLength,
    #[error("no data available at offset {0}")]
    Eof(u64),
    #[error("upload content has been moved to {}", .0.display())]
    Moved(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("nothing to move: {0}")]
    Status(UploadStatus),
    #[error("temporary upload file {} is missing", .0.display())]
    MissingSource(PathBuf),
    #[error("invalid upload destination {}", .0.display())]
    InvalidDestination(PathBuf),
    #[error("upload has already been moved")]
    AlreadyMoved,
    #[error("could not write upload to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
