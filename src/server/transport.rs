// Transport module
// Per-request connection state and the writer that turns a handler outcome
// into a hyper response

use std::sync::atomic::{AtomicBool, Ordering};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONNECTION};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use tokio::sync::watch;

use crate::handler::{FileResource, Outcome};
use crate::http;
use crate::logger;

/// Connection-level facts and signals for a single request
#[derive(Debug)]
pub struct TransportContext {
    keep_alive: bool,
    is_head: bool,
    shutdown: watch::Receiver<bool>,
    interrupted: AtomicBool,
}

impl TransportContext {
    pub fn new(request: &Parts, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            keep_alive: http::is_keep_alive(request.version, &request.headers),
            is_head: request.method == Method::HEAD,
            shutdown,
            interrupted: AtomicBool::new(false),
        }
    }

    pub const fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub const fn is_head(&self) -> bool {
        self.is_head
    }

    /// Completes once server shutdown has been requested
    ///
    /// Never completes if the shutdown source is gone without signalling.
    pub async fn cancelled(&self) {
        let mut shutdown = self.shutdown.clone();
        let closed = shutdown.wait_for(|requested| *requested).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }

    /// Record that work for this request was cut short
    pub fn mark_interrupted(&self) {
        self.interrupted.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }
}

/// Write a handler outcome as a response
///
/// 304 and HEAD responses carry no body. The connection is closed after the
/// response unless the client asked for keep-alive and the request was not
/// interrupted.
pub async fn write_outcome(outcome: Outcome, ctx: &TransportContext) -> Response<Full<Bytes>> {
    let (status, mut headers, body) = match outcome {
        Outcome::NotModified { headers } => (StatusCode::NOT_MODIFIED, headers, Bytes::new()),
        Outcome::Serve { headers, resource } => {
            let body = if ctx.is_head() {
                Bytes::new()
            } else {
                match read_resource(&resource).await {
                    Some(body) => body,
                    None => return http::build_500_response(),
                }
            };
            (StatusCode::OK, headers, body)
        }
    };

    if !ctx.is_keep_alive() || ctx.is_interrupted() {
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
    }

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

async fn read_resource(resource: &FileResource) -> Option<Bytes> {
    match resource {
        FileResource::System(file) => match tokio::fs::read(file.path()).await {
            Ok(content) => Some(Bytes::from(content)),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {}",
                    file.path().display(),
                    e
                ));
                None
            }
        },
        FileResource::Special(special) => Some(special.contents()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{EmbeddedFile, SystemFile};
    use http_body_util::BodyExt;
    use hyper::header::{HeaderMap, CONTENT_LENGTH, DATE};
    use hyper::{Request, Version};
    use std::sync::Arc;

    fn parts(method: Method, version: Version, connection: Option<&str>) -> Parts {
        let mut builder = Request::builder().method(method).version(version).uri("/x");
        if let Some(value) = connection {
            builder = builder.header(CONNECTION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn embedded() -> FileResource {
        FileResource::Special(Arc::new(EmbeddedFile::new("hello.txt", b"hello", 0)))
    }

    #[tokio::test]
    async fn test_not_modified_has_no_body() {
        let (_tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::GET, Version::HTTP_11, None), rx);
        let mut headers = HeaderMap::new();
        headers.insert(DATE, HeaderValue::from_static("Tue, 14 Nov 2023 22:13:20 GMT"));

        let response = write_outcome(Outcome::NotModified { headers }, &ctx).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(!response.headers().contains_key(CONNECTION));
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_not_modified_closes_like_normal_response() {
        let (_tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::GET, Version::HTTP_10, None), rx);
        let response = write_outcome(Outcome::NotModified { headers: HeaderMap::new() }, &ctx).await;
        assert_eq!(response.headers()[CONNECTION], "close");
    }

    #[tokio::test]
    async fn test_serve_special_file() {
        let (_tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::GET, Version::HTTP_11, None), rx);
        let outcome = Outcome::Serve {
            headers: HeaderMap::new(),
            resource: embedded(),
        };
        let response = write_outcome(outcome, &ctx).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(response).await, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_head_skips_body() {
        let (_tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::HEAD, Version::HTTP_11, None), rx);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(5u64));
        let outcome = Outcome::Serve {
            headers,
            resource: embedded(),
        };
        let response = write_outcome(outcome, &ctx).await;
        assert_eq!(response.headers()[CONTENT_LENGTH], "5");
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_vanished_file_is_500() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let file = SystemFile::open(tmp.path()).await.unwrap();
        drop(tmp);

        let (_tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::GET, Version::HTTP_11, None), rx);
        let outcome = Outcome::Serve {
            headers: HeaderMap::new(),
            resource: FileResource::System(file),
        };
        assert_eq!(write_outcome(outcome, &ctx).await.status(), 500);
    }

    #[tokio::test]
    async fn test_interrupted_request_closes_connection() {
        let (tx, rx) = watch::channel(false);
        let ctx = TransportContext::new(&parts(Method::GET, Version::HTTP_11, None), rx);
        tx.send(true).unwrap();
        ctx.cancelled().await;
        ctx.mark_interrupted();

        let response = write_outcome(Outcome::NotModified { headers: HeaderMap::new() }, &ctx).await;
        assert_eq!(response.headers()[CONNECTION], "close");
    }
}
