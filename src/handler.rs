//! The invocation entry point: event in, platform response out.

use crate::config::ContainerConfig;
use crate::dispatch::Dispatcher;
use crate::error::ProxyError;
use crate::event::EventSource;
use crate::request::decode;
use crate::response::{encode, error_response, PlatformResponse};
use crate::static_files;
use futures::FutureExt;
use lambda_http::http::StatusCode;
use lambda_http::{Body, Request, Response};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Translates platform events for a wrapped [`Dispatcher`].
///
/// The configuration is fixed at construction and shared read-only, so one
/// handler can serve concurrent invocations.
pub struct ProxyHandler<D> {
    config: Arc<ContainerConfig>,
    dispatcher: D,
}

impl<D: Dispatcher> ProxyHandler<D> {
    pub fn new(config: ContainerConfig, dispatcher: D) -> Self {
        Self::with_shared_config(Arc::new(config), dispatcher)
    }

    pub fn with_shared_config(config: Arc<ContainerConfig>, dispatcher: D) -> Self {
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Handle one invocation. Always returns a well-formed response: bad
    /// events become 400s, application failures and panics become 500s.
    #[instrument(skip_all, fields(source = %EventSource::detect(&event)))]
    pub async fn handle(&self, event: Value) -> PlatformResponse {
        let source = EventSource::detect(&event);

        let response = match decode(event, &self.config) {
            Ok(request) => self.respond(request).await,
            Err(err) => {
                warn!(error = %err, "rejecting malformed event");
                error_response(err.status_code(), &err.public_message())
            }
        };

        let response = encode(response, source, &self.config);
        debug!(status = response.status_code(), "encoded response");
        response
    }

    async fn respond(&self, request: Request) -> Response<Body> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        info!(%method, %path, "handling request");

        if let Some(file) = static_files::resolve(&self.config, &method, &path).await {
            debug!(file = %file.display(), "serving static file");
            return match static_files::serve(&file, &method).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, file = %file.display(), "static file read failed");
                    error_response(err.status_code(), &err.public_message())
                }
            };
        }

        match AssertUnwindSafe(self.dispatcher.dispatch(request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => match err.downcast_ref::<ProxyError>() {
                Some(err) => {
                    let status = err.status_code();
                    if status.is_server_error() {
                        error!(error = %err, "application error");
                    } else {
                        debug!(error = %err, %status, "application rejected request");
                    }
                    error_response(status, &err.public_message())
                }
                None => {
                    error!(error = %err, "application error");
                    internal_error()
                }
            },
            Err(panic) => {
                error!(panic = panic_message(&*panic), "application panicked");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response<Body> {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
