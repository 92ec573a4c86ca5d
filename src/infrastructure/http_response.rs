// HTTP response utilities for downloadable exports
use axum::{
    body::Body,
    http::{HeaderValue, Response, StatusCode, header},
};

pub const CSV: &str = "text/csv; charset=utf-8";
pub const JSON: &str = "application/json";
pub const PDF: &str = "application/pdf";

/// Build a download response with an attachment filename.
pub fn attachment_response(
    bytes: Vec<u8>,
    content_type: &str,
    filename: &str,
) -> Result<Response<Body>, StatusCode> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| {
            tracing::error!("Invalid download filename {}: {}", filename, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let content_type = HeaderValue::from_str(content_type).map_err(|e| {
        tracing::error!("Invalid content type {}: {}", content_type, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::debug!("Sending {} ({} bytes)", filename, bytes.len());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| {
            tracing::error!("Response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Dated download name such as `serie_20240101.csv`.
pub fn export_filename(stem: &str, extension: &str) -> String {
    format!("{}_{}.{}", stem, chrono::Utc::now().format("%Y%m%d"), extension)
}
