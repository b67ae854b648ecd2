use std::{
    fs::{self, File},
    io,
    num::NonZeroU64,
    path::{Path, PathBuf},
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use request_interop_api::{
    Body, Resource, StreamError, Upload, UploadError, UploadStatus,
};

use crate::http::{params::ParamMap, stream::ResourceStream};

/// The raw descriptor of one uploaded file, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadParts {
    pub tmp_name: String,
    pub error: i64,
    pub name: Option<String>,
    pub full_path: Option<String>,
    pub media_type: Option<String>,
    pub size: Option<i64>,
    pub body: Option<Resource>,
}

impl UploadParts {
    pub fn new(tmp_name: impl Into<String>, error: i64) -> Self {
        Self {
            tmp_name: tmp_name.into(),
            error,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = Some(full_path.into());
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn body(mut self, body: impl Into<Resource>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// An uploaded file waiting in temporary storage.
///
/// The metadata never changes. The file itself can be moved out exactly once; the first call
/// to [`Upload::move_to`] claims the upload whether or not the move then succeeds.
#[derive(Debug)]
pub struct FileUpload {
    tmp_name: String,
    error: UploadStatus,
    name: Option<String>,
    full_path: Option<String>,
    media_type: Option<String>,
    size: Option<NonZeroU64>,
    body: Option<Resource>,
    claimed: AtomicBool,
    moved_to: OnceLock<PathBuf>,
}

impl FileUpload {
    pub(crate) fn new(
        tmp_name: String,
        error: UploadStatus,
        name: Option<String>,
        full_path: Option<String>,
        media_type: Option<String>,
        size: Option<NonZeroU64>,
        body: Option<Resource>,
    ) -> Self {
        Self {
            tmp_name,
            error,
            name,
            full_path,
            media_type,
            size,
            body,
            claimed: AtomicBool::new(false),
            moved_to: OnceLock::new(),
        }
    }

    pub fn tmp_path(&self) -> &Path {
        Path::new(&self.tmp_name)
    }

    /// Where the file went, once a move succeeded
    pub fn moved_to(&self) -> Option<&Path> {
        self.moved_to.get().map(PathBuf::as_path)
    }

    pub fn is_moved(&self) -> bool {
        self.moved_to.get().is_some()
    }
}

impl Upload for FileUpload {
    type Stream = ResourceStream;

    fn tmp_name(&self) -> &str {
        &self.tmp_name
    }

    fn error(&self) -> UploadStatus {
        self.error
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn full_path(&self) -> Option<&str> {
        self.full_path.as_deref()
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn size(&self) -> Option<NonZeroU64> {
        self.size
    }

    fn move_to(&self, to: &Path) -> Result<(), UploadError> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return Err(UploadError::AlreadyMoved);
        }
        if !self.error.is_ok() {
            return Err(UploadError::Status(self.error));
        }
        if to.as_os_str().is_empty() {
            return Err(UploadError::InvalidDestination(to.to_path_buf()));
        }
        let from = self.tmp_path();
        if !from.is_file() {
            return Err(UploadError::MissingSource(from.to_path_buf()));
        }

        relocate(from, to)?;
        log::info!("moved upload {} to {}", from.display(), to.display());
        // The claim above makes this the only successful move
        let _ = self.moved_to.set(to.to_path_buf());
        Ok(())
    }

    fn stream(&self) -> Result<ResourceStream, StreamError> {
        if let Some(to) = self.moved_to.get() {
            return Err(StreamError::Moved(to.clone()));
        }
        ResourceStream::open(&Resource::file(self.tmp_path()))
    }
}

impl Body for FileUpload {
    fn body(&self) -> Option<&Resource> {
        self.body.as_ref()
    }
}

/// Moves `from` to `to` completely or not at all
fn relocate(from: &Path, to: &Path) -> Result<(), UploadError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            log::warn!(
                "{} and {} are on different filesystems, copying",
                from.display(),
                to.display()
            );
            copy_across(from, to, |path| fs::remove_file(path))
        }
        Err(err) => Err(UploadError::Write {
            path: to.to_path_buf(),
            source: err,
        }),
    }
}

/// Copies `from` into place through a sibling `.partial` file, then removes the source with
/// `remove_source`. Any failure leaves neither the partial file nor `to` behind.
fn copy_across(
    from: &Path,
    to: &Path,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), UploadError> {
    let write_err = |source: io::Error| UploadError::Write {
        path: to.to_path_buf(),
        source,
    };
    let file_name = to
        .file_name()
        .ok_or_else(|| UploadError::InvalidDestination(to.to_path_buf()))?;
    let partial = to.with_file_name(format!(".{}.partial", file_name.to_string_lossy()));

    let copied = (|| {
        let mut src = File::open(from)?;
        let mut dst = File::create(&partial)?;
        io::copy(&mut src, &mut dst)?;
        dst.sync_all()?;
        fs::rename(&partial, to)
    })();
    if let Err(err) = copied {
        remove_quietly(&partial);
        return Err(write_err(err));
    }

    if let Err(err) = remove_source(from) {
        // The source must be gone for the move to count, so take the copy back
        remove_quietly(to);
        return Err(write_err(err));
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            log::warn!("could not remove {}: {err}", path.display());
        }
    }
}

/// A node of the uploads tree, shaped like the form field names the files arrived under
#[derive(Debug)]
pub enum UploadNode {
    Upload(FileUpload),
    Map(ParamMap<UploadNode>),
}

impl UploadNode {
    pub fn as_upload(&self) -> Option<&FileUpload> {
        match self {
            Self::Upload(upload) => Some(upload),
            Self::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&ParamMap<UploadNode>> {
        match self {
            Self::Upload(_) => None,
            Self::Map(map) => Some(map),
        }
    }

    pub fn get(&self, key: &str) -> Option<&UploadNode> {
        self.as_map()?.get(key)
    }

    /// Every upload below this node, depth first
    pub fn uploads(&self) -> Vec<&FileUpload> {
        match self {
            Self::Upload(upload) => vec![upload],
            Self::Map(map) => map.values().flat_map(UploadNode::uploads).collect(),
        }
    }

    pub(crate) fn children(&self) -> Option<&ParamMap<Self>> {
        self.as_map()
    }
}
