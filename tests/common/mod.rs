//! Shared fixtures: an event builder for every shape and a small routed app.

#![allow(dead_code)]

use lambda_container::{EventSource, PlatformResponse, ProxyError};
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::Method;
use lambda_http::{Body, Error, Request, RequestExt, Response};
use serde_json::{json, Map, Value};

pub const SOURCES: [EventSource; 3] = [EventSource::ApiGateway, EventSource::Alb, EventSource::HttpApi];

pub const TEST_VALUE: &str = "test";
pub const UTF8_TEST_STRING: &str = "health心跳测试";
pub const CUSTOM_HEADER_NAME: &str = "X-Custom-Header";
pub const CUSTOM_QS_NAME: &str = "qs";

/// Builds a platform event in any of the three shapes.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    source: EventSource,
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Option<String>,
    base64: bool,
}

impl EventBuilder {
    pub fn new(source: EventSource, path: &str, method: &str) -> Self {
        Self {
            source,
            method: method.to_string(),
            path: path.to_string(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            base64: false,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_string(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Body already base64-encoded by the caller.
    pub fn base64_body(mut self, encoded: &str) -> Self {
        self.body = Some(encoded.to_string());
        self.base64 = true;
        self
    }

    pub fn build(&self) -> Value {
        match self.source {
            EventSource::ApiGateway => {
                let mut event = self.v1_common();
                event["resource"] = json!(self.path);
                event["requestContext"] = json!({
                    "resourcePath": self.path,
                    "httpMethod": self.method,
                    "stage": "test",
                    "protocol": "HTTP/1.1",
                    "identity": { "sourceIp": "127.0.0.1" }
                });
                event
            }
            EventSource::Alb => {
                let mut event = self.v1_common();
                event["requestContext"] = json!({
                    "elb": { "targetGroupArn": "arn:aws:elasticloadbalancing:us-east-1:123456789012:targetgroup/lambda/abc" }
                });
                event
            }
            EventSource::HttpApi => {
                let raw_query = self
                    .query
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&");
                json!({
                    "version": "2.0",
                    "routeKey": "$default",
                    "rawPath": self.path,
                    "rawQueryString": raw_query,
                    "headers": joined(&self.headers),
                    "queryStringParameters": joined(&self.query),
                    "requestContext": {
                        "stage": "$default",
                        "http": {
                            "method": self.method,
                            "path": self.path,
                            "protocol": "HTTP/1.1",
                            "sourceIp": "127.0.0.1"
                        }
                    },
                    "body": self.body,
                    "isBase64Encoded": self.base64
                })
            }
        }
    }

    fn v1_common(&self) -> Value {
        json!({
            "path": self.path,
            "httpMethod": self.method,
            "headers": last_wins(&self.headers),
            "multiValueHeaders": grouped(&self.headers),
            "queryStringParameters": last_wins(&self.query),
            "multiValueQueryStringParameters": grouped(&self.query),
            "body": self.body,
            "isBase64Encoded": self.base64
        })
    }
}

fn last_wins(pairs: &[(String, String)]) -> Value {
    if pairs.is_empty() {
        return Value::Null;
    }
    let map: Map<String, Value> = pairs.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
    Value::Object(map)
}

fn grouped(pairs: &[(String, String)]) -> Value {
    if pairs.is_empty() {
        return Value::Null;
    }
    let mut map = Map::new();
    for (k, v) in pairs {
        if let Some(values) = map.entry(k.clone()).or_insert_with(|| json!([])).as_array_mut() {
            values.push(json!(v));
        }
    }
    Value::Object(map)
}

fn joined(pairs: &[(String, String)]) -> Value {
    if pairs.is_empty() {
        return Value::Null;
    }
    let mut map: Map<String, Value> = Map::new();
    for (k, v) in pairs {
        let value = match map.get(k).and_then(Value::as_str) {
            Some(existing) => format!("{existing},{v}"),
            None => v.clone(),
        };
        map.insert(k.clone(), json!(value));
    }
    Value::Object(map)
}

fn single_value(value: impl ToString) -> Result<Response<Body>, Error> {
    json_response(200, json!({ "value": value.to_string() }))
}

fn json_response(status: u16, body: Value) -> Result<Response<Body>, Error> {
    let resp = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body.to_string().into())
        .map_err(Box::new)?;
    Ok(resp)
}

/// Routes mirroring a typical controller.
pub async fn test_app(request: Request) -> Result<Response<Body>, Error> {
    if request.method() != Method::GET {
        return json_response(405, json!({ "message": "Method Not Allowed" }));
    }

    match request.uri().path() {
        "/test" => single_value(TEST_VALUE),
        "/missing-params" => {
            if !request.headers().contains_key(CUSTOM_HEADER_NAME) {
                return Err(ProxyError::BadRequest(format!("missing header {CUSTOM_HEADER_NAME}")).into());
            }
            let params = request.query_string_parameters();
            let Some(qs) = params.first(CUSTOM_QS_NAME) else {
                return Err(ProxyError::BadRequest(format!("missing query {CUSTOM_QS_NAME}")).into());
            };
            single_value(qs)
        }
        "/test/query-string" => {
            let count = request
                .query_string_parameters()
                .all("list")
                .map_or(0, |values| values.len());
            single_value(count)
        }
        "/test/headers" => {
            let values: Vec<_> = request
                .headers()
                .get_all(CUSTOM_HEADER_NAME)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            single_value(values.join(","))
        }
        "/test/utf8" => {
            let content_type = request
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/json")
                .to_string();
            let resp = Response::builder()
                .status(200)
                .header(CONTENT_TYPE, content_type)
                .body(json!({ "value": UTF8_TEST_STRING }).to_string().into())
                .map_err(Box::new)?;
            Ok(resp)
        }
        "/echo-body" => {
            let body = match request.body() {
                Body::Empty => String::new(),
                Body::Text(text) => text.clone(),
                Body::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            };
            single_value(body)
        }
        "/fail" => Err("database unavailable".into()),
        "/panic" => panic!("handler exploded"),
        path => match path.strip_prefix("/test/") {
            Some(domain) if !domain.contains('/') => single_value(domain),
            _ => json_response(404, json!({ "message": "Not Found" })),
        },
    }
}

/// The `value` field of a `{"value": ..}` body.
pub fn single_value_of(response: &PlatformResponse) -> String {
    let body = response.body_string().expect("response has a body");
    let parsed: Value = serde_json::from_str(&body).expect("body is json");
    parsed["value"].as_str().expect("value is a string").to_string()
}
