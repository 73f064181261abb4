//! Canonical response to platform response.

use crate::config::ContainerConfig;
use crate::event::EventSource;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_http::aws_lambda_events::alb::AlbTargetGroupResponse;
use lambda_http::aws_lambda_events::apigw::{ApiGatewayProxyResponse, ApiGatewayV2httpResponse};
use lambda_http::http::header::{CONTENT_TYPE, SET_COOKIE};
use lambda_http::http::{HeaderMap, HeaderValue, StatusCode};
use lambda_http::{Body, Response};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

/// The JSON envelope returned to Lambda, one variant per event source.
///
/// Every variant fills both header maps so REST callers that only read
/// `headers` keep working. Only ALB carries `statusDescription` and only
/// HTTP API carries `cookies`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlatformResponse {
    ApiGateway(ApiGatewayProxyResponse),
    Alb(AlbTargetGroupResponse),
    HttpApi(ApiGatewayV2httpResponse),
}

impl PlatformResponse {
    pub fn source(&self) -> EventSource {
        match self {
            PlatformResponse::ApiGateway(_) => EventSource::ApiGateway,
            PlatformResponse::Alb(_) => EventSource::Alb,
            PlatformResponse::HttpApi(_) => EventSource::HttpApi,
        }
    }

    pub fn status_code(&self) -> i64 {
        match self {
            PlatformResponse::ApiGateway(r) => r.status_code,
            PlatformResponse::Alb(r) => r.status_code,
            PlatformResponse::HttpApi(r) => r.status_code,
        }
    }

    /// The single-value map: one value per name, the last one the application set.
    pub fn headers(&self) -> &HeaderMap {
        match self {
            PlatformResponse::ApiGateway(r) => &r.headers,
            PlatformResponse::Alb(r) => &r.headers,
            PlatformResponse::HttpApi(r) => &r.headers,
        }
    }

    pub fn multi_value_headers(&self) -> &HeaderMap {
        match self {
            PlatformResponse::ApiGateway(r) => &r.multi_value_headers,
            PlatformResponse::Alb(r) => &r.multi_value_headers,
            PlatformResponse::HttpApi(r) => &r.multi_value_headers,
        }
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.multi_value_headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.multi_value_headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> Option<&Body> {
        match self {
            PlatformResponse::ApiGateway(r) => r.body.as_ref(),
            PlatformResponse::Alb(r) => r.body.as_ref(),
            PlatformResponse::HttpApi(r) => r.body.as_ref(),
        }
    }

    /// The body as it appears on the wire: text as-is, binary base64-encoded.
    pub fn body_string(&self) -> Option<String> {
        match self.body()? {
            Body::Empty => None,
            Body::Text(text) => Some(text.clone()),
            Body::Binary(bytes) => Some(STANDARD.encode(bytes)),
        }
    }

    pub fn is_base64_encoded(&self) -> bool {
        match self {
            PlatformResponse::ApiGateway(r) => r.is_base64_encoded.unwrap_or_default(),
            PlatformResponse::Alb(r) => r.is_base64_encoded,
            PlatformResponse::HttpApi(r) => r.is_base64_encoded.unwrap_or_default(),
        }
    }

    /// `"200 OK"` style status line, ALB only.
    pub fn status_description(&self) -> Option<&str> {
        match self {
            PlatformResponse::Alb(r) => r.status_description.as_deref(),
            _ => None,
        }
    }

    /// `Set-Cookie` values, HTTP API only.
    pub fn cookies(&self) -> &[String] {
        match self {
            PlatformResponse::HttpApi(r) => &r.cookies,
            _ => &[],
        }
    }
}

/// Encode a handler response for the platform the request came from.
pub fn encode(
    response: Response<Body>,
    source: EventSource,
    config: &ContainerConfig,
) -> PlatformResponse {
    let (mut parts, body) = response.into_parts();

    if let Some(charset) = config.default_charset.as_deref() {
        apply_default_charset(&mut parts.headers, charset);
    }

    let mut cookies = Vec::new();
    if source == EventSource::HttpApi {
        cookies = parts
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        parts.headers.remove(SET_COOKIE);
    }

    // The envelope is JSON, so every value must be a visible ASCII string.
    let mut multi_value_headers = HeaderMap::with_capacity(parts.headers.len());
    let mut headers = HeaderMap::with_capacity(parts.headers.keys_len());
    for (name, value) in parts.headers.iter() {
        if value.to_str().is_err() {
            warn!(header = %name, "dropping response header that is not visible ASCII");
            continue;
        }
        multi_value_headers.append(name.clone(), value.clone());
        headers.insert(name.clone(), value.clone());
    }

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let (body, is_base64_encoded) = encode_body(body, content_type);
    let status_code = i64::from(parts.status.as_u16());

    match source {
        EventSource::ApiGateway => PlatformResponse::ApiGateway(ApiGatewayProxyResponse {
            status_code,
            headers,
            multi_value_headers,
            body,
            is_base64_encoded: Some(is_base64_encoded),
        }),
        EventSource::Alb => PlatformResponse::Alb(AlbTargetGroupResponse {
            status_code,
            status_description: Some(status_description(parts.status)),
            headers,
            multi_value_headers,
            body,
            is_base64_encoded,
        }),
        EventSource::HttpApi => PlatformResponse::HttpApi(ApiGatewayV2httpResponse {
            status_code,
            headers,
            multi_value_headers,
            body,
            is_base64_encoded: Some(is_base64_encoded),
            cookies,
        }),
    }
}

/// A JSON `{"message": ..}` response with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::Text(json!({ "message": message }).to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Append `; charset=<charset>` to the Content-Type unless it already names one.
fn apply_default_charset(headers: &mut HeaderMap, charset: &str) {
    let updated = match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(content_type) if !has_charset(content_type) => format!(
            "{}; charset={charset}",
            content_type.trim_end().trim_end_matches(';')
        ),
        _ => return,
    };
    if let Ok(value) = HeaderValue::from_str(&updated) {
        headers.insert(CONTENT_TYPE, value);
    }
}

fn has_charset(content_type: &str) -> bool {
    content_type
        .split(';')
        .skip(1)
        .any(|param| param.trim().to_ascii_lowercase().starts_with("charset="))
}

/// Textual bodies go out as text; anything else binary is base64-encoded on
/// serialization.
fn encode_body(body: Body, content_type: Option<&str>) -> (Option<Body>, bool) {
    match body {
        Body::Empty => (None, false),
        Body::Text(text) => (Some(Body::Text(text)), false),
        Body::Binary(bytes) if is_text_content_type(content_type) => {
            match String::from_utf8(bytes) {
                Ok(text) => (Some(Body::Text(text)), false),
                Err(err) => (Some(Body::Binary(err.into_bytes())), true),
            }
        }
        Body::Binary(bytes) => (Some(Body::Binary(bytes)), true),
    }
}

fn is_text_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/")
        || essence.ends_with("/json")
        || essence.ends_with("+json")
        || essence.ends_with("/xml")
        || essence.ends_with("+xml")
        || essence.ends_with("/javascript")
        || essence == "application/x-www-form-urlencoded"
}

fn status_description(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}
