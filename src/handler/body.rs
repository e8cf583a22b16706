//! Response body variants
//!
//! The dispatcher hands the file handler a [`ResponseBody`]. Only file-like
//! variants are accepted; they are converted once into a [`FileResource`]
//! which the rest of the pipeline works with.

use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION, CONTENT_LENGTH};

use crate::error::HandlerError;

/// Body produced by a route before it is written out
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Plain text, not handled by the file handler
    Text(String),
    /// Raw bytes, not handled by the file handler
    Bytes(Bytes),
    /// Path on disk that has not been inspected yet
    Path(PathBuf),
    /// File on disk with its metadata already read
    File(SystemFile),
    /// Framework-provided file-like value
    Special(Arc<dyn SpecialFile>),
}

impl ResponseBody {
    /// Short name of the variant, used in error messages
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Path(_) => "path",
            Self::File(_) => "file",
            Self::Special(_) => "special file",
        }
    }

    /// Whether this body names a resource with a name and modification time
    pub const fn is_file_like(&self) -> bool {
        matches!(self, Self::Path(_) | Self::File(_) | Self::Special(_))
    }
}

/// File-like value that is not backed by a path on disk
pub trait SpecialFile: fmt::Debug + Send + Sync {
    /// Name used for media type detection
    fn name(&self) -> &str;

    /// Modification time in epoch milliseconds
    fn last_modified(&self) -> i64;

    fn length(&self) -> u64;

    /// Full contents to send
    fn contents(&self) -> Bytes;

    /// Add headers describing the body
    fn process(&self, headers: &mut HeaderMap) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.length()));
    }
}

/// File embedded in the binary, e.g. the favicon
#[derive(Debug, Clone)]
pub struct EmbeddedFile {
    name: &'static str,
    data: &'static [u8],
    last_modified: i64,
}

impl EmbeddedFile {
    pub const fn new(name: &'static str, data: &'static [u8], last_modified: i64) -> Self {
        Self {
            name,
            data,
            last_modified,
        }
    }
}

impl SpecialFile for EmbeddedFile {
    fn name(&self) -> &str {
        self.name
    }

    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn length(&self) -> u64 {
        self.data.len() as u64
    }

    fn contents(&self) -> Bytes {
        Bytes::from_static(self.data)
    }
}

/// File on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFile {
    path: PathBuf,
    length: u64,
    last_modified: i64,
    attachment: Option<String>,
}

impl SystemFile {
    /// Read metadata for `path`
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HandlerError> {
        let path = path.into();
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(Self::from_metadata(path, &metadata)),
            Err(source) => Err(HandlerError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            path,
            length: metadata.len(),
            last_modified: DateTime::<Utc>::from(modified).timestamp_millis(),
            attachment: None,
        }
    }

    /// Send as a download named `filename`
    #[must_use]
    pub fn attach(mut self, filename: impl Into<String>) -> Self {
        self.attachment = Some(filename.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories, falling back to the full path
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    pub const fn length(&self) -> u64 {
        self.length
    }

    pub const fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn process(&self, headers: &mut HeaderMap) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.length));
        if let Some(filename) = &self.attachment {
            let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', "\\\""));
            if let Ok(value) = HeaderValue::try_from(disposition) {
                headers.insert(CONTENT_DISPOSITION, value);
            }
        }
    }
}

/// Resource accepted by the file handler
#[derive(Debug, Clone)]
pub enum FileResource {
    System(SystemFile),
    Special(Arc<dyn SpecialFile>),
}

impl FileResource {
    /// Convert a file-like body, reading metadata for bare paths
    pub async fn from_body(body: ResponseBody) -> Result<Self, HandlerError> {
        match body {
            ResponseBody::Path(path) => Ok(Self::System(SystemFile::open(path).await?)),
            ResponseBody::File(file) => Ok(Self::System(file)),
            ResponseBody::Special(special) => Ok(Self::Special(special)),
            other => Err(HandlerError::Unsupported(other.kind())),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::System(file) => file.name(),
            Self::Special(special) => special.name().to_string(),
        }
    }

    pub fn last_modified(&self) -> i64 {
        match self {
            Self::System(file) => file.last_modified(),
            Self::Special(special) => special.last_modified(),
        }
    }

    pub fn length(&self) -> u64 {
        match self {
            Self::System(file) => file.length(),
            Self::Special(special) => special.length(),
        }
    }

    /// Add the resource's own headers after the cache headers
    pub fn process(&self, headers: &mut HeaderMap) {
        match self {
            Self::System(file) => file.process(headers),
            Self::Special(special) => special.process(headers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_open_reads_metadata() {
        let mut tmp = tempfile::Builder::new().suffix(".css").tempfile().unwrap();
        tmp.write_all(b"body { color: red }").unwrap();

        let file = SystemFile::open(tmp.path()).await.unwrap();
        assert_eq!(file.length(), 19);
        assert!(file.name().ends_with(".css"));
        assert!(file.last_modified() > 0);
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = SystemFile::open("/nonexistent/file.txt").await.unwrap_err();
        assert!(matches!(err, HandlerError::Io { .. }));
    }

    #[tokio::test]
    async fn test_from_body_rejects_unsupported() {
        let err = FileResource::from_body(ResponseBody::Text("hi".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Unsupported("text")));
    }

    #[test]
    fn test_attachment_headers() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let metadata = std::fs::metadata(tmp.path()).unwrap();
        let file = SystemFile::from_metadata(tmp.path().to_path_buf(), &metadata).attach("report.pdf");

        let mut headers = HeaderMap::new();
        FileResource::System(file).process(&mut headers);
        assert_eq!(headers[CONTENT_LENGTH], "0");
        assert_eq!(headers[CONTENT_DISPOSITION], "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn test_embedded_file() {
        let favicon = EmbeddedFile::new("favicon.svg", b"<svg/>", 42);
        let resource = FileResource::Special(Arc::new(favicon));
        assert_eq!(resource.name(), "favicon.svg");
        assert_eq!(resource.last_modified(), 42);
        assert_eq!(resource.length(), 6);

        let mut headers = HeaderMap::new();
        resource.process(&mut headers);
        assert_eq!(headers[CONTENT_LENGTH], "6");
        assert!(!headers.contains_key(CONTENT_DISPOSITION));
    }
}
