//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, mapping the
//! path to a file-like body, and handing it to the file handler.

use crate::config::AppState;
use crate::error::HandlerError;
use crate::handler::body::{EmbeddedFile, ResponseBody, SystemFile};
use crate::handler::file_type::FileTypeHandler;
use crate::http;
use crate::logger;
use crate::server::transport::{self, TransportContext};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const FAVICON_PATHS: [&str; 2] = ["/favicon.svg", "/favicon.ico"];
const FAVICON: &[u8] = include_bytes!("../../assets/favicon.svg");

/// Favicon compiled into the binary, stamped with the process start time
pub fn embedded_favicon(started_at: i64) -> EmbeddedFile {
    EmbeddedFile::new("favicon.svg", FAVICON, started_at)
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, _body) = req.into_parts();

    if state.access_log {
        logger::log_request(&parts.method, &parts.uri, parts.version);
    }

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(&parts.method) {
        return Ok(resp);
    }

    // 2. Map path to a file-like body
    let Some(body) = resolve_body(&parts, &state).await else {
        return Ok(finish(http::build_404_response(), state.access_log));
    };

    // 3. Hand over to the file handler and transport
    let ctx = TransportContext::new(&parts, state.shutdown.clone());
    let response = serve_body(&state.handler, body, &parts, &ctx).await;
    Ok(finish(response, state.access_log))
}

/// Run the file handler for `body` and write its outcome
pub async fn serve_body(
    handler: &FileTypeHandler,
    body: ResponseBody,
    parts: &Parts,
    ctx: &TransportContext,
) -> Response<Full<Bytes>> {
    if !handler.supports(&body) {
        logger::log_error(&format!("No handler for {} body", body.kind()));
        return http::build_500_response();
    }

    match handler.handle(body, parts, ctx).await {
        Ok(outcome) => transport::write_outcome(outcome, ctx).await,
        Err(HandlerError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            http::build_404_response()
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            http::build_500_response()
        }
    }
}

fn finish(response: Response<Full<Bytes>>, access_log: bool) -> Response<Full<Bytes>> {
    if access_log {
        logger::log_response(response.status());
    }
    response
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Pick the body for a request path
///
/// `?download` serves the file as an attachment.
async fn resolve_body(parts: &Parts, state: &AppState) -> Option<ResponseBody> {
    let path = parts.uri.path();
    if FAVICON_PATHS.contains(&path) {
        return Some(ResponseBody::Special(Arc::clone(&state.favicon)));
    }

    let server = &state.config.server;
    let file_path = locate_file(&server.root, path, &server.index_files).await?;

    let download = parts
        .uri
        .query()
        .is_some_and(|q| q.split('&').any(|p| p == "download"));
    if download {
        let file = SystemFile::open(file_path).await.ok()?;
        let name = file.name();
        return Some(ResponseBody::File(file.attach(name)));
    }

    Some(ResponseBody::Path(file_path))
}

/// Map a request path to a file inside `root`, trying index files for directories
async fn locate_file(root: &str, path: &str, index_files: &[String]) -> Option<PathBuf> {
    let root_canonical = match tokio::fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Root directory not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    let mut file_path = root_canonical.join(path.trim_start_matches('/'));

    if is_dir(&file_path).await {
        let mut index = None;
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if is_file(&candidate).await {
                index = Some(candidate);
                break;
            }
        }
        file_path = index?;
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = tokio::fs::canonicalize(&file_path).await else {
        return None;
    };
    if !file_path_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    if !is_file(&file_path_canonical).await {
        return None;
    }
    Some(file_path_canonical)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
