use std::{fmt, num::NonZeroU64, path::Path};

use serde::Serialize;

use crate::{
    error::{StreamError, UploadError},
    stream::Stream,
};

/// The outcome code reported by the transport for one uploaded file
///
/// The code space is the closed range `0..=8`. Code 5 is unassigned but still in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadStatus(u8);

impl UploadStatus {
    pub const OK: Self = Self(0);
    pub const INI_SIZE: Self = Self(1);
    pub const FORM_SIZE: Self = Self(2);
    pub const PARTIAL: Self = Self(3);
    pub const NO_FILE: Self = Self(4);
    pub const NO_TMP_DIR: Self = Self(6);
    pub const CANT_WRITE: Self = Self(7);
    pub const EXTENSION: Self = Self(8);

    pub const MAX: u8 = 8;

    pub fn from_code(code: i64) -> Option<Self> {
        u8::try_from(code)
            .ok()
            .filter(|code| *code <= Self::MAX)
            .map(Self)
    }

    pub const fn code(&self) -> u8 {
        self.0
    }

    pub const fn is_ok(&self) -> bool {
        self.0 == 0
    }

    pub const fn description(&self) -> &'static str {
        match self.0 {
            0 => "the file was uploaded successfully",
            1 => "the file exceeds the server's maximum upload size",
            2 => "the file exceeds the form's maximum upload size",
            3 => "the file was only partially uploaded",
            4 => "no file was uploaded",
            6 => "no temporary directory was available",
            7 => "the file could not be written to disk",
            8 => "an extension stopped the upload",
            _ => "unknown upload outcome",
        }
    }
}

impl Default for UploadStatus {
    fn default() -> Self {
        Self::OK
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.0)
    }
}

/// One uploaded file: the descriptor the transport produced, plus one-shot finalization
pub trait Upload {
    type Stream: Stream;

    /// Where the transport stored the file; never empty
    fn tmp_name(&self) -> &str;

    fn error(&self) -> UploadStatus;

    /// The client's original file name
    fn name(&self) -> Option<&str>;

    /// The client's full path, for directory uploads
    fn full_path(&self) -> Option<&str>;

    /// The media type declared by the client, not verified
    fn media_type(&self) -> Option<&str>;

    fn size(&self) -> Option<NonZeroU64>;

    /// Moves the temporary file to `to`.
    ///
    /// Either the destination ends up holding the complete content and the temporary file is
    /// gone, or an error is returned and the temporary file is untouched. Only the first call
    /// on an upload can succeed.
    fn move_to(&self, to: &Path) -> Result<(), UploadError>;

    /// Opens a stream over the upload's content, positioned at offset 0
    fn stream(&self) -> Result<Self::Stream, StreamError>;
}
