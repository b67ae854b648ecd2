use std::{
    fs,
    path::{Path, PathBuf},
};

use bytes::Bytes;

use crate::error::StreamError;

/// A handle to a byte source, as handed over by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Content already held in memory
    Memory(Bytes),
    /// Content stored in a file, read on demand
    File(PathBuf),
}

impl Resource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::File(path) => Some(path),
        }
    }

    /// Reads the whole source regardless of any stream cursor over it
    pub fn read_all(&self) -> Result<Bytes, StreamError> {
        match self {
            Self::Memory(bytes) => Ok(bytes.clone()),
            Self::File(path) => fs::read(path)
                .map(Bytes::from)
                .map_err(StreamError::Unavailable),
        }
    }
}

impl From<Bytes> for Resource {
    fn from(value: Bytes) -> Self {
        Self::Memory(value)
    }
}

impl From<&'static str> for Resource {
    fn from(value: &'static str) -> Self {
        Self::Memory(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for Resource {
    fn from(value: String) -> Self {
        Self::Memory(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Resource {
    fn from(value: Vec<u8>) -> Self {
        Self::Memory(Bytes::from(value))
    }
}
