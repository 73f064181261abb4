//! Serving files straight from allow-listed directories.
//!
//! A `GET`/`HEAD` whose path names an existing file under one of
//! [`ContainerConfig::valid_file_paths`] never reaches the dispatcher.

use crate::config::ContainerConfig;
use crate::error::Result;
use crate::query::decode_path;
use lambda_http::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use lambda_http::http::Method;
use lambda_http::{Body, Response};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Find the file a request path points at, if static serving applies.
///
/// The resolved file must stay inside its root after symlinks and `..` are
/// resolved.
pub async fn resolve(config: &ContainerConfig, method: &Method, path: &str) -> Option<PathBuf> {
    if !config.serves_static_files() || !matches!(*method, Method::GET | Method::HEAD) {
        return None;
    }

    let decoded = decode_path(path);
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    for root in &config.valid_file_paths {
        let Ok(root) = fs::canonicalize(root).await else {
            debug!(root = %root.display(), "skipping unreadable static root");
            continue;
        };
        let Ok(candidate) = fs::canonicalize(root.join(relative)).await else {
            continue;
        };
        if !candidate.starts_with(&root) {
            continue;
        }
        if fs::metadata(&candidate).await.is_ok_and(|meta| meta.is_file()) {
            return Some(candidate);
        }
    }
    None
}

/// Read `file` into a 200 response. `HEAD` gets headers only.
pub async fn serve(file: &Path, method: &Method) -> Result<Response<Body>> {
    let bytes = fs::read(file).await?;
    let length = bytes.len();
    let body = if *method == Method::HEAD {
        Body::Empty
    } else {
        Body::Binary(bytes)
    };

    let response = Response::builder()
        .status(200)
        .header(CONTENT_TYPE, content_type_for(file))
        .header(CONTENT_LENGTH, length)
        .body(body)?;
    Ok(response)
}

/// Content type from the file extension.
pub fn content_type_for(file: &Path) -> &'static str {
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" | "text" => "text/plain",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
