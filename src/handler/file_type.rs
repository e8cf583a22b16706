//! File response module
//!
//! Serves file-like bodies with `If-Modified-Since` validation, a
//! Content-Type resolved from the file extension, and freshness headers.

use std::sync::Arc;

use chrono::Utc;
use hyper::header::{HeaderMap, HeaderValue, CONNECTION, CONTENT_TYPE, IF_MODIFIED_SINCE};
use hyper::http::request::Parts;

use crate::config::FileHandlerConfig;
use crate::error::HandlerError;
use crate::handler::body::{FileResource, ResponseBody};
use crate::http::cache;
use crate::http::mime::{MediaType, MediaTypeResolver, SharedMimeTable};
use crate::logger;
use crate::server::transport::TransportContext;

/// What the transport should write for a handled file
#[derive(Debug)]
pub enum Outcome {
    /// 304 with only a `Date` header, no body
    NotModified { headers: HeaderMap },
    /// 200 with the file as body
    Serve {
        headers: HeaderMap,
        resource: FileResource,
    },
}

/// Handler for file-like response bodies
#[derive(Debug, Clone)]
pub struct FileTypeHandler {
    config: Arc<FileHandlerConfig>,
    resolver: MediaTypeResolver,
}

impl FileTypeHandler {
    pub const fn new(config: Arc<FileHandlerConfig>, mime_types: SharedMimeTable) -> Self {
        Self {
            config,
            resolver: MediaTypeResolver::new(mime_types),
        }
    }

    /// Whether `body` can be passed to [`handle`](Self::handle)
    pub const fn supports(&self, body: &ResponseBody) -> bool {
        body.is_file_like()
    }

    /// Validate the request against the file and prepare the response headers
    pub async fn handle(
        &self,
        body: ResponseBody,
        request: &Parts,
        ctx: &TransportContext,
    ) -> Result<Outcome, HandlerError> {
        let resource = FileResource::from_body(body).await?;
        Ok(self.handle_resource(resource, request, ctx).await)
    }

    async fn handle_resource(
        &self,
        resource: FileResource,
        request: &Parts,
        ctx: &TransportContext,
    ) -> Outcome {
        let now = Utc::now();
        let last_modified = resource.last_modified();

        let if_modified_since = request
            .headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok());
        if cache::is_not_modified(if_modified_since, last_modified, &self.config.date_format) {
            let mut headers = HeaderMap::new();
            cache::set_date_header(&mut headers, &self.config.date_format, now);
            return Outcome::NotModified { headers };
        }

        let mut headers = HeaderMap::new();
        let media_type = self.media_type(&resource.name(), ctx).await;
        if let Ok(value) = HeaderValue::try_from(media_type.name()) {
            headers.insert(CONTENT_TYPE, value);
        }
        cache::set_date_and_cache_headers(&mut headers, &self.config, last_modified, now);
        if ctx.is_keep_alive() {
            headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        resource.process(&mut headers);

        Outcome::Serve { headers, resource }
    }

    /// Resolve the media type, falling back to `text/plain` if shutdown
    /// interrupts the wait for the extension table
    async fn media_type(&self, filename: &str, ctx: &TransportContext) -> MediaType {
        let resolution = self.resolver.resolve_until(filename, ctx.cancelled()).await;
        if resolution.interrupted {
            logger::log_warning(&format!(
                "Media type lookup for '{filename}' interrupted, using {}",
                resolution.media_type
            ));
            ctx.mark_interrupted();
        }
        resolution.media_type
    }
}
