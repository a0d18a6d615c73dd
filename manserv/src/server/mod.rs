//! Development HTTP server for a rendered documentation tree.
//!
//! Serves the static mirror produced by the builder, with the redirect
//! engine as fallback for everything that is not a file on disk:
//!
//! 1. A request path matching an existing file is served directly; when
//!    only a `.gz` sibling exists it is decompressed on the fly.
//! 2. Everything else goes through [`resolve`](crate::redirect::resolve)
//!    and either redirects to a concrete page or renders a minimal
//!    disambiguation page from the not-found result.
//!
//! The index is loaded once before the listener binds and shared
//! read-only across requests; a new index means restarting the server.
//! This is a development server, not hardened for production use.

use std::collections::HashMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use flate2::read::GzDecoder;
use thiserror::Error;

use crate::index::{EntryQuery, Index};
use crate::redirect::{resolve, NotFound, RedirectError, RedirectRequest, SectionOrder};

/// Error starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The server terminated abnormally.
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

struct AppState {
    serving_dir: PathBuf,
    index: Index,
    section_order: SectionOrder,
}

/// Serve `serving_dir` on `addr` until the process is stopped.
pub async fn serve(
    addr: &str,
    serving_dir: PathBuf,
    index: Index,
    section_order: SectionOrder,
) -> Result<(), ServerError> {
    let state = Arc::new(AppState {
        serving_dir,
        index,
        section_order,
    });

    let app = Router::new()
        .route("/jump", get(handle_jump))
        .fallback(get(handle_request))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    tracing::info!(addr = %addr, "serving documentation");
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}

async fn handle_request(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let path = uri.path().to_string();

    // Deny path traversal outright; the server may be exposed beyond
    // localhost for testing.
    if path.contains("..") {
        tracing::warn!(path = %path, "rejected invalid URL path");
        return (StatusCode::BAD_REQUEST, "invalid URL path").into_response();
    }

    match read_static(&state.serving_dir, &path) {
        Ok(Some((body, content_type))) => {
            ([(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Ok(None) => redirect_fallback(&state, &path, &headers, &params),
        Err(err) => {
            tracing::error!(path = %path, error = %err, "failed to serve file");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

/// Resolve a free-form page reference, e.g. `/jump?q=i3(1)`.
async fn handle_jump(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let q = params.get("q").map(String::as_str).unwrap_or("").trim();
    if q.is_empty() {
        return (StatusCode::BAD_REQUEST, "missing q parameter").into_response();
    }
    redirect_fallback(&state, &format!("/{}", q), &headers, &params)
}

fn redirect_fallback(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
    params: &HashMap<String, String>,
) -> Response {
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();
    let referrer = EntryQuery {
        product: params.get("suite").cloned().unwrap_or_default(),
        binarypkg: params.get("binarypkg").cloned().unwrap_or_default(),
        section: params.get("section").cloned().unwrap_or_default(),
        language: params.get("language").cloned().unwrap_or_default(),
    };
    let request = RedirectRequest {
        path: path.to_string(),
        accept_language,
        referrer,
    };

    match resolve(&state.index, &state.section_order, &request) {
        Ok(target) => Redirect::temporary(&target).into_response(),
        Err(RedirectError::NotApplicable) => {
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
        Err(RedirectError::NotFound(not_found)) => {
            (StatusCode::NOT_FOUND, Html(render_not_found(&not_found))).into_response()
        }
    }
}

/// Read a file below `serving_dir`, trying a `.gz` sibling when the
/// plain file does not exist. Returns `None` when neither exists.
fn read_static(serving_dir: &Path, path: &str) -> io::Result<Option<(Vec<u8>, &'static str)>> {
    let relative = path.trim_start_matches('/');
    let mut candidate = serving_dir.join(relative);
    if path == "/" {
        candidate = candidate.join("index.html");
    }

    match std::fs::read(&candidate) {
        Ok(body) => return Ok(Some((body, content_type_for(path)))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        // Directory listings are not served; let the redirect engine
        // classify the path instead.
        Err(_) if candidate.is_dir() => return Ok(None),
        Err(err) => return Err(err),
    }

    // The mirror stores most pages compressed; serve them transparently.
    let gz_candidate = candidate.with_file_name(format!(
        "{}.gz",
        candidate
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    match std::fs::File::open(&gz_candidate) {
        Ok(file) => {
            let mut body = Vec::new();
            GzDecoder::new(file).read_to_end(&mut body)?;
            Ok(Some((body, content_type_for(path))))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Content type by file extension; unknown extensions are served as
/// HTML, matching how the mirror stores extension-less rendered pages.
fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "text/xml",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "gz" => "application/gzip",
        _ => "text/html",
    }
}

/// Render the disambiguation page for a not-found result.
fn render_not_found(not_found: &NotFound) -> String {
    let mut body = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>Manual page not found</title></head>\n<body>\n",
    );

    if not_found.manpage.is_empty() {
        body.push_str("<h1>No such manual page</h1>\n");
    } else {
        body.push_str(&format!(
            "<h1>No manual page matches <code>{}</code></h1>\n",
            escape_html(&not_found.manpage)
        ));
    }

    if !not_found.choices.is_empty() {
        body.push_str("<p>Did you mean one of these?</p>\n<ul>\n");
        for choice in &not_found.choices {
            body.push_str(&format!(
                "<li><a href=\"{}\">{}({}) [{}] from {} in {}</a></li>\n",
                escape_html(&choice.serving_path(".html")),
                escape_html(&choice.name),
                escape_html(&choice.section),
                escape_html(&choice.language),
                escape_html(&choice.binarypkg),
                escape_html(&choice.product),
            ));
        }
        body.push_str("</ul>\n");
    }

    if !not_found.products.is_empty() {
        body.push_str(&format!(
            "<p>Known products: {}</p>\n",
            not_found
                .products
                .iter()
                .map(|name| escape_html(name))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    body.push_str("</body>\n</html>\n");
    body
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
