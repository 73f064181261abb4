//! Platform event to canonical request.
//!
//! The decoded request carries the event data where [`lambda_http::RequestExt`]
//! looks for it, so handlers read query strings, path parameters, stage
//! variables and the request context exactly as they would under
//! `lambda_http::run`.

use crate::config::ContainerConfig;
use crate::error::{ProxyError, Result};
use crate::event::{AlbEvent, ApiGatewayEvent, HttpApiEvent, PlatformEvent};
use crate::query::{encode_path, QueryParams};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_http::aws_lambda_events::alb::{AlbTargetGroupRequestContext, ElbContext};
use lambda_http::aws_lambda_events::apigw::{
    ApiGatewayProxyRequest, ApiGatewayProxyRequestContext, ApiGatewayRequestIdentity,
    ApiGatewayV2httpRequestContext, ApiGatewayV2httpRequestContextHttpDescription,
};
use lambda_http::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use lambda_http::request::{LambdaRequest, RequestContext};
use lambda_http::{Body, Request, RequestExt};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Fields common to every event shape, before validation.
struct Parts {
    method: Method,
    path: Option<String>,
    headers: HeaderMap,
    query: QueryParams,
    path_parameters: HashMap<String, String>,
    stage_variables: HashMap<String, String>,
    context: RequestContext,
    body: Option<String>,
    is_base64_encoded: bool,
}

/// Decode a raw platform event into a canonical request.
///
/// Missing or `null` fields become empty values. Only structurally invalid
/// input fails, always with a 400-class [`ProxyError`].
pub fn decode(event: Value, config: &ContainerConfig) -> Result<Request> {
    let parts = match PlatformEvent::from_value(event)? {
        PlatformEvent::ApiGateway(event) => from_api_gateway(event)?,
        PlatformEvent::Alb(event) => from_alb(event)?,
        PlatformEvent::HttpApi(event) => from_http_api(event)?,
    };
    build(parts, config)
}

fn from_api_gateway(event: ApiGatewayEvent) -> Result<Parts> {
    let ctx = event.request_context;
    let method = parse_method(event.http_method.as_deref().or(ctx.http_method.as_deref()))?;
    let id = ctx.identity;

    let context = ApiGatewayProxyRequestContext {
        account_id: ctx.account_id,
        resource_id: ctx.resource_id,
        stage: ctx.stage,
        domain_name: ctx.domain_name,
        domain_prefix: ctx.domain_prefix,
        request_id: ctx.request_id,
        protocol: ctx.protocol,
        identity: ApiGatewayRequestIdentity {
            cognito_identity_pool_id: id.cognito_identity_pool_id,
            account_id: id.account_id,
            cognito_identity_id: id.cognito_identity_id,
            caller: id.caller,
            api_key: id.api_key,
            api_key_id: id.api_key_id,
            access_key: id.access_key,
            source_ip: id.source_ip,
            cognito_authentication_type: id.cognito_authentication_type,
            cognito_authentication_provider: id.cognito_authentication_provider,
            user_arn: id.user_arn,
            user_agent: id.user_agent,
            user: id.user,
        },
        resource_path: ctx.resource_path.or(event.resource),
        path: ctx.path,
        authorizer: ctx.authorizer,
        http_method: method.clone(),
        request_time: ctx.request_time,
        request_time_epoch: ctx.request_time_epoch.unwrap_or_default(),
        apiid: ctx.api_id,
        ..Default::default()
    };

    Ok(Parts {
        method,
        path: event.path,
        headers: merge_headers(event.headers, event.multi_value_headers),
        query: QueryParams::merge(
            event.query_string_parameters,
            event.multi_value_query_string_parameters,
        ),
        path_parameters: event.path_parameters,
        stage_variables: event.stage_variables,
        context: RequestContext::ApiGatewayV1(context),
        body: event.body,
        is_base64_encoded: event.is_base64_encoded,
    })
}

fn from_alb(event: AlbEvent) -> Result<Parts> {
    // ALB forwards query strings exactly as the client sent them.
    let query = QueryParams::merge(
        event.query_string_parameters,
        event.multi_value_query_string_parameters,
    )
    .decoded();
    let context = AlbTargetGroupRequestContext {
        elb: ElbContext {
            target_group_arn: event.request_context.elb.target_group_arn,
        },
    };

    Ok(Parts {
        method: parse_method(event.http_method.as_deref())?,
        path: event.path,
        headers: merge_headers(event.headers, event.multi_value_headers),
        query,
        path_parameters: HashMap::new(),
        stage_variables: HashMap::new(),
        context: RequestContext::Alb(context),
        body: event.body,
        is_base64_encoded: event.is_base64_encoded,
    })
}

fn from_http_api(event: HttpApiEvent) -> Result<Parts> {
    let ctx = event.request_context;
    let method = parse_method(ctx.http.method.as_deref())?;

    let mut headers = merge_headers(event.headers, HashMap::new());
    if !event.cookies.is_empty() && !headers.contains_key(header::COOKIE) {
        append_header(&mut headers, "cookie", &event.cookies.join("; "));
    }

    let query = match event.raw_query_string.as_deref() {
        Some(raw) if !raw.is_empty() => QueryParams::parse(raw),
        _ => QueryParams::merge(event.query_string_parameters, HashMap::new()),
    };

    let authorizer = ctx
        .authorizer
        .and_then(|authorizer| match serde_json::from_value(authorizer) {
            Ok(authorizer) => Some(authorizer),
            Err(err) => {
                warn!(error = %err, "ignoring unrecognized authorizer context");
                None
            }
        });

    let path = event.raw_path.or_else(|| ctx.http.path.clone());
    let context = ApiGatewayV2httpRequestContext {
        route_key: ctx.route_key.or(event.route_key),
        account_id: ctx.account_id,
        stage: ctx.stage,
        request_id: ctx.request_id,
        authorizer,
        apiid: ctx.api_id,
        domain_name: ctx.domain_name,
        domain_prefix: ctx.domain_prefix,
        time: ctx.time,
        time_epoch: ctx.time_epoch.unwrap_or_default(),
        http: ApiGatewayV2httpRequestContextHttpDescription {
            method: method.clone(),
            path: ctx.http.path,
            protocol: ctx.http.protocol,
            source_ip: ctx.http.source_ip,
            user_agent: ctx.http.user_agent,
        },
        ..Default::default()
    };

    Ok(Parts {
        method,
        path,
        headers,
        query,
        path_parameters: event.path_parameters,
        stage_variables: event.stage_variables,
        context: RequestContext::ApiGatewayV2(context),
        body: event.body,
        is_base64_encoded: event.is_base64_encoded,
    })
}

/// Missing means `GET`; anything present must be a valid method token.
fn parse_method(method: Option<&str>) -> Result<Method> {
    match method.map(str::trim) {
        None | Some("") => Ok(Method::GET),
        Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes())
            .map_err(|_| ProxyError::InvalidMethod(m.to_string())),
    }
}

fn build(parts: Parts, config: &ContainerConfig) -> Result<Request> {
    let raw_path = parts.path.unwrap_or_default();
    let raw_path = if raw_path.starts_with('/') {
        raw_path
    } else {
        format!("/{raw_path}")
    };
    let path = config.strip_base(&raw_path);

    let query = if config.expand_comma_query_values {
        parts.query.expand_commas()
    } else {
        parts.query
    };

    let mut uri = encode_path(path);
    let query_string = query.to_query_string();
    if !query_string.is_empty() {
        uri.push('?');
        uri.push_str(&query_string);
    }
    let uri: Uri = uri.parse()?;

    let body = match parts.body {
        None => Body::Empty,
        Some(body) if parts.is_base64_encoded => Body::Binary(STANDARD.decode(body.trim())?),
        Some(body) if body.is_empty() => Body::Empty,
        Some(body) => Body::Text(body),
    };

    let (mut head, _) = stage_variables_request(parts.stage_variables).into_parts();
    head.method = parts.method;
    head.uri = uri;
    head.headers = parts.headers;

    let request = Request::from_parts(head, body)
        .with_raw_http_path(&raw_path)
        .with_query_string_parameters(query)
        .with_path_parameters(parts.path_parameters)
        .with_request_context(parts.context);
    Ok(request)
}

/// An empty request holding `stage_variables` for
/// [`RequestExt::stage_variables`]. `lambda_http` only sets that extension
/// while converting an event, so a bare REST event is converted here and its
/// other fields are overwritten by the caller.
fn stage_variables_request(stage_variables: HashMap<String, String>) -> Request {
    LambdaRequest::ApiGatewayV1(ApiGatewayProxyRequest {
        stage_variables,
        ..Default::default()
    })
    .into()
}

/// Combine both header representations. Multi-value entries win; a
/// single-value header is only used when its name (case-insensitive) is not
/// already present.
fn merge_headers(single: HashMap<String, String>, multi: HashMap<String, Vec<String>>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let mut multi: Vec<_> = multi.into_iter().collect();
    multi.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, values) in multi {
        for value in values {
            append_header(&mut headers, &name, &value);
        }
    }

    let mut single: Vec<_> = single.into_iter().collect();
    single.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in single {
        let present = HeaderName::from_bytes(name.as_bytes())
            .map(|name| headers.contains_key(name))
            .unwrap_or(false);
        if !present {
            append_header(&mut headers, &name, &value);
        }
    }
    headers
}

fn append_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_bytes(value.as_bytes()),
    ) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => warn!(header = name, "dropping header with invalid name or value"),
    }
}
