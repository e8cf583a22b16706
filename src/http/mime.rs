//! MIME type detection module
//!
//! Resolves a Content-Type from a file name through an extension table in
//! `mime.types` format. The table is loaded once, off the request path, and
//! shared by every request afterwards.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::future::Future;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::logger;

/// Content-Type used whenever an extension cannot be resolved
pub const DEFAULT_MEDIA_TYPE: &str = "text/plain";

const BUNDLED_MIME_TYPES: &str = include_str!("../../assets/mime.types");

/// Resolved media type together with the extension it was found under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    name: String,
    extension: String,
}

impl MediaType {
    pub fn new(name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
        }
    }

    pub fn text_plain() -> Self {
        Self::new(DEFAULT_MEDIA_TYPE, "")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lowercase extension → media type mapping
#[derive(Debug, Clone, Default)]
pub struct MimeTypeTable {
    types: HashMap<String, String>,
}

impl MimeTypeTable {
    /// Parse `mime.types` formatted text
    ///
    /// `#` lines and blank lines are skipped. On every other line the first
    /// whitespace-separated field is the type and the rest are extensions.
    pub fn parse<R: BufRead>(mut reader: R) -> io::Result<Self> {
        let mut types = HashMap::with_capacity(256);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            // Lines that are not UTF-8 are skipped, the rest of the file still loads
            let Ok(line) = std::str::from_utf8(&buf) else {
                continue;
            };
            if line.starts_with('#') {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(media_type) = fields.next() else {
                continue;
            };
            for extension in fields {
                types.insert(extension.to_lowercase(), media_type.to_string());
            }
        }

        Ok(Self { types })
    }

    pub fn get(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Where the extension table is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeSource {
    /// Table compiled into the binary
    Bundled,
    /// Operator supplied `mime.types` file
    File(PathBuf),
}

impl fmt::Display for MimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Load the extension table, falling back to an empty table on I/O failure
pub fn load_mime_types(source: &MimeSource) -> MimeTypeTable {
    let loaded = match source {
        MimeSource::Bundled => MimeTypeTable::parse(BUNDLED_MIME_TYPES.as_bytes()),
        MimeSource::File(path) => File::open(path).and_then(|f| MimeTypeTable::parse(BufReader::new(f))),
    };

    match loaded {
        Ok(table) => {
            logger::log_mime_types_loaded(table.len(), source);
            table
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to load mime types for file extension detection from {source}: {e}"
            ));
            MimeTypeTable::default()
        }
    }
}

/// Extension of the last path segment, without the dot
///
/// # Examples
/// ```
/// use static_responder::http::mime::extension_of;
/// assert_eq!(extension_of("a.b/c.txt"), "txt");
/// assert_eq!(extension_of("dir.with.dot/file"), "");
/// ```
pub fn extension_of(filename: &str) -> &str {
    let Some(dot) = filename.rfind('.') else {
        return "";
    };
    let separator = filename.rfind(['/', '\\']);
    if separator.is_some_and(|sep| sep > dot) {
        return "";
    }
    &filename[dot + 1..]
}

/// Extension table that becomes available once its background load finishes
///
/// Every clone observes the same load. A loader that dies without
/// publishing closes the channel, and all waiters see `None`.
#[derive(Debug, Clone)]
pub struct SharedMimeTable {
    rx: watch::Receiver<Option<Arc<MimeTypeTable>>>,
}

impl SharedMimeTable {
    /// Start loading on the blocking pool. Must be called inside a tokio runtime.
    pub fn spawn(source: MimeSource) -> Self {
        let (tx, rx) = watch::channel(None);
        tokio::task::spawn_blocking(move || {
            let table = load_mime_types(&source);
            // Nobody listening means the server is already gone
            let _ = tx.send(Some(Arc::new(table)));
        });
        Self { rx }
    }

    /// Table that is already resolved
    pub fn ready(table: MimeTypeTable) -> Self {
        let (_tx, rx) = watch::channel(Some(Arc::new(table)));
        Self { rx }
    }

    /// Resolved table without waiting
    pub fn try_get(&self) -> Option<Arc<MimeTypeTable>> {
        self.rx.borrow().as_ref().map(Arc::clone)
    }

    /// Wait for the load to complete
    pub async fn wait(&self) -> Option<Arc<MimeTypeTable>> {
        if let Some(table) = self.try_get() {
            return Some(table);
        }

        let mut rx = self.rx.clone();
        let ready = rx.wait_for(Option::is_some).await;
        ready.ok().and_then(|table| table.as_ref().map(Arc::clone))
    }

    #[cfg(test)]
    pub(crate) fn pending() -> (watch::Sender<Option<Arc<MimeTypeTable>>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self { rx })
    }
}

/// Outcome of a resolution that may have been cut short
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub media_type: MediaType,
    /// The wait for the table was abandoned; `media_type` is the default
    pub interrupted: bool,
}

/// Maps file names to media types
#[derive(Debug, Clone)]
pub struct MediaTypeResolver {
    table: SharedMimeTable,
}

impl MediaTypeResolver {
    pub const fn new(table: SharedMimeTable) -> Self {
        Self { table }
    }

    /// Resolve, waiting for the table as long as it takes
    pub async fn resolve(&self, filename: &str) -> MediaType {
        self.resolve_until(filename, std::future::pending()).await.media_type
    }

    /// Resolve, giving up on the table wait when `interrupt` completes first
    pub async fn resolve_until<F>(&self, filename: &str, interrupt: F) -> Resolution
    where
        F: Future<Output = ()>,
    {
        let table = tokio::select! {
            biased;
            table = self.table.wait() => table,
            () = interrupt => {
                return Resolution {
                    media_type: MediaType::text_plain(),
                    interrupted: true,
                };
            }
        };

        let extension = extension_of(filename).to_lowercase();
        let media_type = table
            .as_deref()
            .and_then(|t| t.get(&extension))
            .map_or_else(MediaType::text_plain, |name| MediaType::new(name, extension.as_str()));

        Resolution {
            media_type,
            interrupted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn bundled() -> MediaTypeResolver {
        MediaTypeResolver::new(SharedMimeTable::ready(load_mime_types(&MimeSource::Bundled)))
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.b/c.txt"), "txt");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of("dir.with.dot/file"), "");
        assert_eq!(extension_of("C:\\dir.d\\file"), "");
        assert_eq!(extension_of("C:\\dir\\file.PNG"), "PNG");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_parse_table() {
        let text = "# comment\n\ntext/html\t\thtml  HTM\napplication/x-empty\nimage/png png\ntext/x-html html\n";
        let table = MimeTypeTable::parse(text.as_bytes()).unwrap();
        assert_eq!(table.get("htm"), Some("text/html"));
        assert_eq!(table.get("png"), Some("image/png"));
        // later lines win
        assert_eq!(table.get("html"), Some("text/x-html"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_parse_skips_non_utf8_lines() {
        let bytes: &[u8] = b"# caf\xe9 au lait\r\ntext/css css\r\nimage/x-\xe9 bad\nimage/png png";
        let table = MimeTypeTable::parse(bytes).unwrap();
        assert_eq!(table.get("css"), Some("text/css"));
        assert_eq!(table.get("png"), Some("image/png"));
        assert_eq!(table.get("bad"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_bundled_table_loads() {
        let table = load_mime_types(&MimeSource::Bundled);
        assert_eq!(table.get("css"), Some("text/css"));
        assert_eq!(table.get("jpg"), Some("image/jpeg"));
        assert_eq!(table.get("gz"), Some("application/gzip"));
    }

    #[test]
    fn test_missing_file_gives_empty_table() {
        let table = load_mime_types(&MimeSource::File(PathBuf::from("/nonexistent/mime.types")));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive() {
        let resolver = bundled();
        assert_eq!(resolver.resolve("IMAGE.JPG").await, resolver.resolve("image.jpg").await);
        let media = resolver.resolve("photos/IMAGE.JPG").await;
        assert_eq!(media.name(), "image/jpeg");
        assert_eq!(media.extension(), "jpg");
    }

    #[tokio::test]
    async fn test_resolve_defaults() {
        let resolver = bundled();
        assert_eq!(resolver.resolve("file.unknownext").await, MediaType::text_plain());
        assert_eq!(resolver.resolve("Makefile").await, MediaType::text_plain());
    }

    #[tokio::test]
    async fn test_unavailable_source_resolves_text_plain() {
        let table = SharedMimeTable::spawn(MimeSource::File(PathBuf::from("/nonexistent/mime.types")));
        let resolver = MediaTypeResolver::new(table);
        assert_eq!(resolver.resolve("index.html").await.name(), DEFAULT_MEDIA_TYPE);
        assert_eq!(resolver.resolve("x.png").await.name(), DEFAULT_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_spawned_load_is_shared() {
        let resolver = MediaTypeResolver::new(SharedMimeTable::spawn(MimeSource::Bundled));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve("site.css").await })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().name(), "text/css");
        }
    }

    #[tokio::test]
    async fn test_dropped_loader_falls_back() {
        let (tx, table) = SharedMimeTable::pending();
        let resolver = MediaTypeResolver::new(table);
        let waiting = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve("a.css").await }
        });
        drop(tx);
        assert_eq!(waiting.await.unwrap(), MediaType::text_plain());
    }

    #[tokio::test]
    async fn test_waiters_see_late_table() {
        let (tx, table) = SharedMimeTable::pending();
        let resolver = MediaTypeResolver::new(table);
        let waiting = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve("a.css").await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(Some(Arc::new(load_mime_types(&MimeSource::Bundled)))).unwrap();
        assert_eq!(waiting.await.unwrap().name(), "text/css");
    }

    #[tokio::test]
    async fn test_interrupted_wait_returns_default() {
        let (_tx, table) = SharedMimeTable::pending();
        let resolver = MediaTypeResolver::new(table);
        let resolution = resolver
            .resolve_until("a.css", tokio::time::sleep(Duration::from_millis(5)))
            .await;
        assert!(resolution.interrupted);
        assert_eq!(resolution.media_type, MediaType::text_plain());
    }

    #[tokio::test]
    async fn test_ready_table_wins_over_interrupt() {
        let resolution = bundled().resolve_until("a.css", std::future::ready(())).await;
        assert!(!resolution.interrupted);
        assert_eq!(resolution.media_type.name(), "text/css");
    }
}
