use lambda_container::{ContainerConfig, ProxyHandler};
use lambda_http::request::RequestContext;
use lambda_http::{Body, Request, RequestExt, Response};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Reports back what the container decoded, which is handy when wiring a new
/// API Gateway or ALB integration.
async fn echo_handler(event: Request) -> Result<Response<Body>, Error> {
    let method = event.method();
    let queryparams = event.query_string_parameters();
    let pathparams = event.path_parameters();
    let stagevars = event.stage_variables();
    let path = event.raw_http_path();

    let (stage, source_ip) = match event.request_context() {
        RequestContext::ApiGatewayV1(ctx) => (ctx.stage, ctx.identity.source_ip),
        RequestContext::ApiGatewayV2(ctx) => (ctx.stage, ctx.http.source_ip),
        _ => (None, None),
    };

    let body = match event.body() {
        Body::Empty => Value::Null,
        Body::Text(text) => json!(text),
        Body::Binary(bytes) => json!(String::from_utf8_lossy(bytes)),
    };

    let resp = Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(
            json!({
                "method": method.to_string(),
                "path": path,
                "queryparams": queryparams,
                "pathparams": pathparams,
                "stagevars": stagevars,
                "stage": stage,
                "sourceIp": source_ip,
                "body": body,
            })
            .to_string()
            .into(),
        )
        .map_err(Box::new)?;
    Ok(resp)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();

    let config = ContainerConfig::from_env();
    tracing::info!(?config, "container configured");

    let handler = ProxyHandler::new(config, echo_handler);
    let handler = &handler;
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<_, Error>(handler.handle(event.payload).await)
    }))
    .await
}
