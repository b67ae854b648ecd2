use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
};

use bytes::Bytes;
use request_interop_api::{Resource, Stream, StreamError, Whence};

enum Source {
    Memory(Bytes),
    File(File),
}

impl Source {
    fn len(&self) -> Result<u64, StreamError> {
        match self {
            Self::Memory(bytes) => Ok(bytes.len() as u64),
            Self::File(file) => Ok(file.metadata()?.len()),
        }
    }
}

/// A [`Stream`] over a [`Resource`], owning its own cursor
pub struct ResourceStream {
    source: Option<Source>,
    position: u64,
}

impl ResourceStream {
    /// Opens the resource with the cursor at offset 0
    pub fn open(resource: &Resource) -> Result<Self, StreamError> {
        let source = match resource {
            Resource::Memory(bytes) => Source::Memory(bytes.clone()),
            Resource::File(path) => {
                Source::File(File::open(path).map_err(StreamError::Unavailable)?)
            }
        };
        Ok(Self {
            source: Some(source),
            position: 0,
        })
    }

    /// Releases the underlying source; every later operation fails with [`StreamError::Closed`]
    pub fn close(&mut self) {
        self.source = None;
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// The total length of the source
    pub fn len(&self) -> Result<u64, StreamError> {
        self.source()?.len()
    }

    pub fn is_empty(&self) -> Result<bool, StreamError> {
        Ok(self.len()? == 0)
    }

    fn source(&self) -> Result<&Source, StreamError> {
        self.source.as_ref().ok_or(StreamError::Closed)
    }

    fn source_mut(&mut self) -> Result<&mut Source, StreamError> {
        self.source.as_mut().ok_or(StreamError::Closed)
    }

    /// Reads up to `limit` bytes at the cursor without checking for end of data
    fn read_at_cursor(&mut self, limit: Option<usize>) -> Result<Bytes, StreamError> {
        let position = self.position;
        let bytes = match self.source_mut()? {
            Source::Memory(bytes) => {
                let start = usize::try_from(position).unwrap_or(usize::MAX).min(bytes.len());
                let end = match limit {
                    Some(limit) => start.saturating_add(limit).min(bytes.len()),
                    None => bytes.len(),
                };
                bytes.slice(start..end)
            }
            Source::File(file) => {
                file.seek(SeekFrom::Start(position))?;
                let mut buf = Vec::new();
                match limit {
                    Some(limit) => file.take(limit as u64).read_to_end(&mut buf)?,
                    None => file.read_to_end(&mut buf)?,
                };
                Bytes::from(buf)
            }
        };
        self.position += bytes.len() as u64;
        Ok(bytes)
    }
}

impl Stream for ResourceStream {
    fn tell(&self) -> Result<u64, StreamError> {
        self.source()?;
        Ok(self.position)
    }

    fn read(&mut self, length: usize) -> Result<Bytes, StreamError> {
        if length == 0 {
            return Err(StreamError::InvalidLength);
        }
        let bytes = self.read_at_cursor(Some(length))?;
        if bytes.is_empty() {
            return Err(StreamError::Eof(self.position));
        }
        Ok(bytes)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.tell()?,
            Whence::End => self.len()?,
        };
        let position = base.checked_add_signed(offset).ok_or(if offset < 0 {
            StreamError::NegativeOffset
        } else {
            StreamError::OffsetOverflow
        })?;
        // Closed streams fail even when seeking from the start
        self.source()?;
        log::trace!("stream seek {offset} from {whence:?}: {} -> {position}", self.position);
        self.position = position;
        Ok(position)
    }

    fn eof(&self) -> bool {
        match self.len() {
            Ok(len) => self.position >= len,
            Err(_) => true,
        }
    }

    fn read_to_end(&mut self) -> Result<Bytes, StreamError> {
        let bytes = self.read_at_cursor(None)?;
        if bytes.is_empty() {
            return Err(StreamError::Eof(self.position));
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStream")
            .field("closed", &self.is_closed())
            .field("position", &self.position)
            .finish()
    }
}
