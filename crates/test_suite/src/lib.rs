//! Shared fixtures for the request interop integration tests

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use request_interop_api::RawValue;
use tempfile::TempDir;

/// Routes `log` output through the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// A scratch directory standing in for a server's upload temp dir
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Writes a file the way a server would when receiving an upload
    pub fn write(&self, name: &str, content: &[u8]) -> io::Result<PathBuf> {
        let path = self.join(name);
        fs::write(&path, content)?;
        log::debug!("wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.join(name))
    }
}

/// A single file descriptor, as a multipart decoder reports one file field
pub fn file_item(tmp_name: &str, name: &str, media_type: &str, size: i64) -> RawValue {
    RawValue::map([
        ("tmp_name", RawValue::from(tmp_name)),
        ("error", RawValue::Int(0)),
        ("name", RawValue::from(name)),
        ("full_path", RawValue::from(name)),
        ("type", RawValue::from(media_type)),
        ("size", RawValue::Int(size)),
    ])
}

/// A `docs[]` style group of files: one list per descriptor key
pub fn file_group(files: &[(&str, &str, i64)]) -> RawValue {
    let column = |f: fn(&(&str, &str, i64)) -> RawValue| {
        RawValue::List(files.iter().map(f).collect())
    };
    RawValue::map([
        ("tmp_name", column(|(tmp, _, _)| RawValue::from(*tmp))),
        (
            "error",
            column(|(tmp, _, _)| RawValue::Int(if tmp.is_empty() { 4 } else { 0 })),
        ),
        ("name", column(|(_, name, _)| RawValue::from(*name))),
        ("size", column(|(_, _, size)| RawValue::Int(*size))),
    ])
}

/// Headers as a CGI style adapter would collect them, with mixed case names
pub fn browser_headers() -> RawValue {
    RawValue::map([
        ("Host", "example.com"),
        ("User-Agent", "Mozilla/5.0"),
        ("Accept", "text/html"),
        ("Accept-Language", "en-US"),
        ("Cookie", "session=abc; theme=dark"),
    ])
}

/// Server variables as a CGI style adapter would collect them
pub fn cgi_server() -> RawValue {
    RawValue::map([
        ("REQUEST_METHOD", "POST"),
        ("REQUEST_URI", "/upload?album=1"),
        ("SERVER_PROTOCOL", "HTTP/1.1"),
        ("REMOTE_ADDR", "127.0.0.1"),
    ])
}
