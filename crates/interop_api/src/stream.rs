use bytes::Bytes;

use crate::error::StreamError;

/// The origin a [`Stream::seek`] offset is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whence {
    #[default]
    Start,
    Current,
    End,
}

/// A seekable byte source with a single cursor.
///
/// A stream belongs to one reader at a time; every method takes `&mut self` so the borrow
/// checker confines the cursor to its owner.
pub trait Stream {
    /// The current cursor position
    fn tell(&self) -> Result<u64, StreamError>;

    /// Reads up to `length` bytes from the cursor and advances it.
    ///
    /// Fails with [`StreamError::InvalidLength`] when `length` is zero and with
    /// [`StreamError::Eof`] when no data is left, rather than returning an empty read.
    fn read(&mut self, length: usize) -> Result<Bytes, StreamError>;

    /// Moves the cursor and returns its new position
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError>;

    fn eof(&self) -> bool;

    /// Reads everything from the cursor to the end of the source, advancing the cursor.
    ///
    /// Like [`Stream::read`], fails with [`StreamError::Eof`] when no data is left.
    fn read_to_end(&mut self) -> Result<Bytes, StreamError>;

    /// The remaining content as text, advancing the cursor. Seek to the start first for the
    /// full content. Fails with [`StreamError::Eof`] at the end of data.
    fn read_remaining(&mut self) -> Result<String, StreamError> {
        let bytes = self.read_to_end()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
