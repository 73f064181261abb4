//! Run HTTP applications behind AWS Lambda.
//!
//! API Gateway REST, Application Load Balancer and HTTP API events are
//! decoded into a [`lambda_http::Request`], handed to a [`Dispatcher`], and
//! the resulting response is encoded back into the envelope the event came
//! from. Event data reaches the application through
//! [`lambda_http::RequestExt`], as it would under `lambda_http::run`.
//!
//! ```no_run
//! use lambda_container::{ContainerConfig, ProxyHandler};
//! use lambda_http::{Body, Error, Request, Response};
//! use lambda_runtime::{run, service_fn, LambdaEvent};
//! use serde_json::Value;
//!
//! async fn app(_req: Request) -> Result<Response<Body>, Error> {
//!     Ok(Response::new("hello".into()))
//! }
//!
//! # async fn start() -> Result<(), Error> {
//! let handler = ProxyHandler::new(ContainerConfig::default(), app);
//! let handler = &handler;
//! run(service_fn(move |event: LambdaEvent<Value>| async move {
//!     Ok::<_, Error>(handler.handle(event.payload).await)
//! }))
//! .await
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod query;
pub mod request;
pub mod response;
pub mod static_files;

pub use config::ContainerConfig;
pub use dispatch::Dispatcher;
pub use error::{ProxyError, Result};
pub use event::{EventSource, PlatformEvent};
pub use handler::ProxyHandler;
pub use query::QueryParams;
pub use request::decode;
pub use response::{encode, PlatformResponse};
