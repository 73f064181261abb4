//! The boundary between the container and the wrapped application.

use async_trait::async_trait;
use lambda_http::{Body, Error, Request, Response};
use std::future::Future;

/// Anything that turns a canonical request into a response.
///
/// Routing, validation and error pages belong to the implementor. An error
/// that downcasts to [`crate::ProxyError`] keeps its status code; any other
/// error becomes a 500.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, request: Request) -> Result<Response<Body>, Error>;
}

/// Plain async functions are dispatchers, the same way `service_fn` turns
/// them into Lambda handlers.
#[async_trait]
impl<F, Fut, E> Dispatcher for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Body>, E>> + Send + 'static,
    E: Into<Error> + 'static,
{
    async fn dispatch(&self, request: Request) -> Result<Response<Body>, Error> {
        (self)(request).await.map_err(Into::into)
    }
}
