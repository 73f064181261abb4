//! Platform event shapes.
//!
//! Lambda hands us one of three JSON envelopes for an HTTP request and never
//! says which. [`PlatformEvent::from_value`] looks at the fields that only one
//! shape carries and deserializes into the matching struct. Every collection
//! tolerates `null`.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Which envelope an event arrived in. Responses are encoded for the same source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// API Gateway REST API proxy integration (payload format 1.0).
    #[default]
    ApiGateway,
    /// Application Load Balancer target group.
    Alb,
    /// API Gateway HTTP API (payload format 2.0).
    HttpApi,
}

impl EventSource {
    /// Detect the envelope from shape-distinguishing fields.
    pub fn detect(event: &Value) -> Self {
        let has_elb = event
            .pointer("/requestContext/elb")
            .is_some_and(|elb| !elb.is_null());
        if has_elb {
            EventSource::Alb
        } else if event.get("version").and_then(Value::as_str) == Some("2.0") {
            EventSource::HttpApi
        } else {
            EventSource::ApiGateway
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventSource::ApiGateway => "api_gateway",
            EventSource::Alb => "alb",
            EventSource::HttpApi => "http_api",
        };
        f.write_str(name)
    }
}

/// A decoded platform event, tagged by shape.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    ApiGateway(ApiGatewayEvent),
    Alb(AlbEvent),
    HttpApi(HttpApiEvent),
}

impl PlatformEvent {
    pub fn from_value(event: Value) -> Result<Self, serde_json::Error> {
        Ok(match EventSource::detect(&event) {
            EventSource::ApiGateway => PlatformEvent::ApiGateway(serde_json::from_value(event)?),
            EventSource::Alb => PlatformEvent::Alb(serde_json::from_value(event)?),
            EventSource::HttpApi => PlatformEvent::HttpApi(serde_json::from_value(event)?),
        })
    }

    pub fn source(&self) -> EventSource {
        match self {
            PlatformEvent::ApiGateway(_) => EventSource::ApiGateway,
            PlatformEvent::Alb(_) => EventSource::Alb,
            PlatformEvent::HttpApi(_) => EventSource::HttpApi,
        }
    }
}

/// API Gateway REST proxy event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayEvent {
    pub resource: Option<String>,
    pub path: Option<String>,
    pub http_method: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "nullable")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub stage_variables: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub request_context: ApiGatewayRequestContext,
    pub body: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayRequestContext {
    pub account_id: Option<String>,
    pub api_id: Option<String>,
    pub resource_id: Option<String>,
    pub resource_path: Option<String>,
    pub http_method: Option<String>,
    pub path: Option<String>,
    pub stage: Option<String>,
    pub protocol: Option<String>,
    pub request_id: Option<String>,
    pub request_time: Option<String>,
    pub request_time_epoch: Option<i64>,
    pub domain_name: Option<String>,
    pub domain_prefix: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub identity: ApiGatewayIdentity,
    #[serde(deserialize_with = "nullable")]
    pub authorizer: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiGatewayIdentity {
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub account_id: Option<String>,
    pub caller: Option<String>,
    pub access_key: Option<String>,
    pub api_key: Option<String>,
    pub api_key_id: Option<String>,
    pub user_arn: Option<String>,
    pub user: Option<String>,
    pub cognito_identity_id: Option<String>,
    pub cognito_identity_pool_id: Option<String>,
    pub cognito_authentication_type: Option<String>,
    pub cognito_authentication_provider: Option<String>,
}

/// Application Load Balancer target event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbEvent {
    pub path: Option<String>,
    pub http_method: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(deserialize_with = "nullable")]
    pub request_context: AlbRequestContext,
    pub body: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbRequestContext {
    #[serde(deserialize_with = "nullable")]
    pub elb: ElbContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElbContext {
    pub target_group_arn: Option<String>,
}

/// API Gateway HTTP API event, payload format 2.0.
///
/// Repeated headers and query parameters arrive comma-joined in a single value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpApiEvent {
    pub version: Option<String>,
    pub route_key: Option<String>,
    pub raw_path: Option<String>,
    pub raw_query_string: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub cookies: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub headers: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub path_parameters: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub stage_variables: HashMap<String, String>,
    #[serde(deserialize_with = "nullable")]
    pub request_context: HttpApiRequestContext,
    pub body: Option<String>,
    #[serde(deserialize_with = "flexible_bool")]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpApiRequestContext {
    pub account_id: Option<String>,
    pub api_id: Option<String>,
    pub domain_name: Option<String>,
    pub domain_prefix: Option<String>,
    pub request_id: Option<String>,
    pub route_key: Option<String>,
    pub stage: Option<String>,
    pub time: Option<String>,
    pub time_epoch: Option<i64>,
    #[serde(deserialize_with = "nullable")]
    pub http: HttpApiHttpContext,
    pub authorizer: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpApiHttpContext {
    pub method: Option<String>,
    pub path: Option<String>,
    pub protocol: Option<String>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// `null` deserializes to `T::default()`.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `true`, `"true"`, `"TRUE"`, `null` and friends.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) => match s.trim() {
            v if v.eq_ignore_ascii_case("true") => Ok(true),
            v if v.eq_ignore_ascii_case("false") || v.is_empty() => Ok(false),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &"a boolean or boolean-like string",
            )),
        },
        Some(other) => Err(de::Error::invalid_type(
            unexpected(&other),
            &"a boolean or boolean-like string",
        )),
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(de::Unexpected::Signed)
            .unwrap_or(de::Unexpected::Other("number")),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
        _ => de::Unexpected::Other("value"),
    }
}
