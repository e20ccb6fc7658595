//! HTTP response construction for login outcomes.
//!
//! - `Authenticated` becomes `302 Found` with a `Location` and, for a new
//!   session, a `Set-Cookie`.
//! - `ExpiredSignature`, `InvalidSignature`, and a vanished principal become
//!   `401 Unauthorized` with the configured message.

use http::StatusCode;
use http::header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, HeaderValue, LOCATION, SET_COOKIE};
use tracing::{error, warn};

use crate::body::LinkResponseBody;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// Build a redirect to `location`, optionally attaching a session cookie.
///
/// A destination that is not a valid header value yields `400 Bad Request`.
#[must_use]
pub fn redirect_response(
    location: &str,
    set_cookie: Option<HeaderValue>,
) -> http::Response<LinkResponseBody> {
    let Ok(location_value) = HeaderValue::from_str(location) else {
        warn!(location, "redirect target is not a valid header value");
        return text_response(StatusCode::BAD_REQUEST, "Invalid redirect target");
    };

    let mut builder = http::Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location_value);
    if let Some(cookie) = set_cookie {
        builder = builder.header(SET_COOKIE, cookie);
    }
    build_response(builder, LinkResponseBody::empty())
}

/// Build the `401 Unauthorized` response for a rejected link.
#[must_use]
pub fn unauthorized_response(message: &str) -> http::Response<LinkResponseBody> {
    text_response(StatusCode::UNAUTHORIZED, message)
}

/// Build the `404 Not Found` response.
#[must_use]
pub fn not_found_response() -> http::Response<LinkResponseBody> {
    text_response(StatusCode::NOT_FOUND, "Not Found")
}

/// Build the `405 Method Not Allowed` response for the login route.
#[must_use]
pub fn method_not_allowed_response() -> http::Response<LinkResponseBody> {
    let builder = http::Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(ALLOW, "GET")
        .header(CONTENT_TYPE, TEXT_PLAIN);
    build_response(builder, LinkResponseBody::from_string("Method Not Allowed"))
}

/// Build the `500 Internal Server Error` response.
#[must_use]
pub fn internal_error_response() -> http::Response<LinkResponseBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Build a `200 OK` JSON response.
#[must_use]
pub fn json_response(value: &serde_json::Value) -> http::Response<LinkResponseBody> {
    let builder = http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, APPLICATION_JSON);
    build_response(builder, LinkResponseBody::from_string(value.to_string()))
}

/// Add headers common to every response.
///
/// Login URLs carry signatures, so responses are never cached and never leak
/// the URL through `Referer`.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<LinkResponseBody>,
    request_id: &str,
) -> http::Response<LinkResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert("Server", HeaderValue::from_static("PassLink"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));

    response
}

fn text_response(status: StatusCode, message: &str) -> http::Response<LinkResponseBody> {
    let builder = http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN);
    build_response(builder, LinkResponseBody::from_string(message))
}

/// Finish a response builder, falling back to a bare 500 if a header was invalid.
fn build_response(
    builder: http::response::Builder,
    body: LinkResponseBody,
) -> http::Response<LinkResponseBody> {
    builder.body(body).unwrap_or_else(|e| {
        error!(error = %e, "failed to build HTTP response");
        let mut response = http::Response::new(LinkResponseBody::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}
