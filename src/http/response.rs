//! Response construction.
//!
//! Relayed bodies and proxy-generated messages share one content type, so a
//! browser caller can read either the same way.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

pub const TEXT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A text body with the given status.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    let mut response = (status, body.into()).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TEXT_CONTENT_TYPE),
    );
    response
}
