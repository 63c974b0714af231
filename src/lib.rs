//! api-envelope - uniform `{data, error}` JSON envelopes for axum APIs.
//!
//! Handlers return plain values or faults; a router-wide middleware turns them
//! into one response shape, classifies faults into status and error code, and
//! adds cache-prevention and CORS headers.
//!
//! ```json
//! {"data": {"id": 42, "name": "foobar"}, "error": null}
//! {"data": null, "error": {"code": 12, "title": "not found", "errorData": null}}
//! ```
//!
//! # Pipeline
//! 1. [`ApiConfigCompiler`] resolves the request's [`ApiConfig`]: hardcoded
//!    fallback, global defaults, the first matching path rule, then the
//!    route's [`ActionConfig`]. Requests claimed by neither a path rule nor
//!    an action config pass through untouched.
//! 2. A successful result goes through the [`SerializerAdapter`] named by the
//!    config (see [`SerializerAdapterFactory`]), under its visibility groups.
//! 3. A fault is classified by [`ErrorClassifier`] and rendered as an error
//!    envelope, always with the plain JSON adapter.
//! 4. Cache and CORS headers are applied to every handled response.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use api_envelope::{
//!     ApiError, EnvelopeService, Fault, Reply, ServiceRegistry, config, envelope_router,
//! };
//! use axum::{Router, http::StatusCode, routing::get};
//!
//! async fn show() -> Result<Reply, Fault> {
//!     Err(ApiError::new(12, "not found").with_status(StatusCode::NOT_FOUND).into())
//! }
//!
//! # fn main() -> eyre::Result<()> {
//! let cfg = config::load_validated_config("envelope.toml")?;
//! let service = Arc::new(EnvelopeService::new(&cfg, ServiceRegistry::new())?);
//! let routes = Router::new().route("/api/items/{id}", get(show));
//! let app: Router = envelope_router(routes, service);
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! **Ports** (traits) live in `ports`, their implementations in `adapters`,
//! and the pipeline itself in `core`.
//!
//! # Error Handling
//! Startup problems are [`ValidationError`]s or `eyre::Result` with context.
//! At request time nothing escapes: the worst outcome is a 500 envelope.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{
        AccessDeniedHandler, AuthenticationEntryPoint, ExposureSerializer, FactoryError,
        SerializerAdapterFactory, ServiceRegistry, action_config_middleware,
        create_action_middleware, create_envelope_middleware, envelope_middleware,
        envelope_router,
    },
    config::{ActionConfig, ApiConfig, EnvelopeConfig, PathConfig, Pattern, ValidationError},
    core::{
        AccessDeniedError, ApiConfigCompiler, ApiError, AuthenticationError, Data,
        EnvelopeService, ErrorClassifier, Fault, FormErrors, HttpError, Reply, ResponseGenerator,
        Serializable,
    },
    ports::{ExternalSerializer, SerializationContext, SerializationError, SerializerAdapter},
};
