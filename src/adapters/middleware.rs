//! Axum middleware wiring the envelope pipeline into a `Router`.
//!
//! Two layers cooperate:
//! * [`create_envelope_middleware`] wraps the whole router. It resolves the
//!   request's config after the handler ran and renders the envelope.
//! * [`create_action_middleware`] wraps a single route and attaches that
//!   route's [`ActionConfig`] to the response for the outer layer to read.
//!   Use it with `MethodRouter::layer`.
//!
//! The envelope layer must see the router's finished responses, including the
//! `Allow` header axum adds to a 405 after the route's own layers ran, so it
//! wraps the router as a service instead of going through `Router::layer`.
//! [`envelope_router`] does that and also turns handler panics into faults.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use api_envelope::{
//!     ActionConfig, EnvelopeConfig, EnvelopeService, Reply, ServiceRegistry,
//!     create_action_middleware, envelope_router,
//! };
//! use axum::{Router, middleware, routing::get};
//!
//! # fn build() -> eyre::Result<Router> {
//! let service = Arc::new(EnvelopeService::new(&EnvelopeConfig::default(), ServiceRegistry::new())?);
//! let routes = Router::new().route(
//!     "/status",
//!     get(|| async { Reply::new("ok") })
//!         .layer(middleware::from_fn(create_action_middleware(ActionConfig::new()))),
//! );
//! let app = envelope_router(routes, service);
//! # Ok(app) }
//! ```
use std::{any::Any, future::Future, pin::Pin, sync::Arc};

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http::{Method, StatusCode, header};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    config::{ActionConfig, ApiConfig},
    core::{
        fault::{Fault, HandlerPanic, HttpError},
        generator::Enveloped,
        reply::{PendingFault, PendingResult},
        service::EnvelopeService,
    },
    tracing_setup::create_request_span,
};

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Wrap a finished router in the envelope pipeline.
///
/// Layers added to the returned router run outside the pipeline.
pub fn envelope_router(routes: Router, service: Arc<EnvelopeService>) -> Router {
    let enveloped = ServiceBuilder::new()
        .layer(middleware::from_fn(create_envelope_middleware(service)))
        .layer(CatchPanicLayer::custom(panic_response))
        .service(routes);

    Router::new().fallback_service(enveloped)
}

/// Router-wide envelope layer.
pub async fn envelope_middleware(
    req: Request,
    next: Next,
    service: Arc<EnvelopeService>,
) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let origin = req.headers().get(header::ORIGIN).cloned();

    let response = next.run(req).await;

    let action = response.extensions().get::<ActionConfig>().cloned();
    let Some(config) = service.compile(&path, action.as_ref()) else {
        return response;
    };

    let span = create_request_span(method.as_str(), &path);
    span.in_scope(|| {
        let (outcome, mut response) = envelope_response(
            &service,
            &method,
            &config,
            action.and_then(|a| a.status),
            response,
        );
        service.finalize(&config, origin.as_ref(), &mut response);

        span.record("http.status_code", response.status().as_u16());
        span.record("envelope.outcome", outcome);
        tracing::debug!("Response enveloped");
        response
    })
}

/// Create a cloneable closure wrapping [`envelope_middleware`].
pub fn create_envelope_middleware(
    service: Arc<EnvelopeService>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let service = service.clone();
        Box::pin(async move { envelope_middleware(req, next, service).await })
    }
}

/// Route layer attaching `action` to the response.
///
/// The innermost action layer wins when several wrap the same route.
pub async fn action_config_middleware(req: Request, next: Next, action: ActionConfig) -> Response {
    let mut response = next.run(req).await;

    if response.extensions().get::<ActionConfig>().is_none() {
        response.extensions_mut().insert(action);
    }

    response
}

/// Create a cloneable closure wrapping [`action_config_middleware`].
pub fn create_action_middleware(
    action: ActionConfig,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req, next| {
        let action = action.clone();
        Box::pin(async move { action_config_middleware(req, next, action).await })
    }
}

fn envelope_response(
    service: &EnvelopeService,
    method: &Method,
    config: &ApiConfig,
    action_status: Option<StatusCode>,
    mut response: Response,
) -> (&'static str, Response) {
    if let Some(PendingResult(reply)) = response.extensions_mut().remove::<PendingResult>() {
        return ("result", service.on_result(config, reply, action_status));
    }

    if let Some(PendingFault(fault)) = response.extensions_mut().remove::<PendingFault>() {
        return ("fault", service.on_fault(method, &fault));
    }

    if let Some(fault) = router_rejection(&response) {
        return ("rejection", service.on_fault(method, &fault));
    }

    ("passthrough", response)
}

/// Error responses nobody enveloped: axum's 404 and 405, extractor
/// rejections, or a handler's raw error status.
fn router_rejection(response: &Response) -> Option<Fault> {
    let status = response.status();
    if response.extensions().get::<Enveloped>().is_some()
        || !(status.is_client_error() || status.is_server_error())
    {
        return None;
    }

    let mut fault = HttpError::new(status);
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            fault = fault.with_header(name.clone(), value.clone());
        }
    }
    Some(fault.into())
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };

    Fault::unhandled(HandlerPanic(message)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        extract::Path,
        routing::get,
    };
    use http::HeaderValue;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        adapters::factory::ServiceRegistry,
        config::{EnvelopeConfig, PathConfig},
        core::{fault::FaultKind, reply::Reply},
    };

    fn app() -> Router {
        let config = EnvelopeConfig::builder()
            .path(PathConfig::with_prefix("/api", ApiConfig::default()))
            .build()
            .unwrap();
        let service = Arc::new(EnvelopeService::new(&config, ServiceRegistry::new()).unwrap());

        let routes = Router::new()
            .route("/api/items", get(|| async { Reply::new("items") }))
            .route(
                "/api/items/{id}",
                get(|Path(id): Path<i64>| async move { Reply::new(id) }),
            )
            .route(
                "/api/panic",
                get(|| async {
                    if true {
                        panic!("kaboom");
                    }
                    Reply::new("unreachable")
                }),
            )
            .route("/web", get(|| async { Reply::new("web") }))
            .route(
                "/action",
                get(|| async { Reply::new("action") }).layer(middleware::from_fn(
                    create_action_middleware(ActionConfig::new().status(StatusCode::ACCEPTED)),
                )),
            );

        envelope_router(routes, service)
    }

    async fn call(method: Method, uri: &str) -> Response {
        app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unmatched_path_is_untouched() {
        let response = call(Method::GET, "/web").await;
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert!(response.extensions().get::<PendingResult>().is_some());
    }

    #[tokio::test]
    async fn matched_path_is_enveloped() {
        let response = call(Method::GET, "/api/items").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.extensions().get::<Enveloped>().is_some());
        assert!(response.headers().get(header::CACHE_CONTROL).is_some());
    }

    #[tokio::test]
    async fn action_config_claims_route_and_sets_status() {
        let response = call(Method::GET, "/action").await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(response.extensions().get::<Enveloped>().is_some());
    }

    #[tokio::test]
    async fn router_not_found_under_api_is_enveloped() {
        let response = call(Method::GET, "/api/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn method_not_allowed_keeps_router_allow_header() {
        let response = call(Method::DELETE, "/api/items").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let allow = response.headers()[header::ALLOW].to_str().unwrap().to_string();
        assert!(allow.contains("GET"));
        assert_eq!(json(response).await["error"]["code"], 405);
    }

    #[tokio::test]
    async fn preflight_keeps_router_allow_header() {
        let response = call(Method::OPTIONS, "/api/items").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::ALLOW]
                .to_str()
                .unwrap()
                .contains("GET")
        );
    }

    #[tokio::test]
    async fn extractor_rejection_is_enveloped() {
        let response = call(Method::GET, "/api/items/abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = json(response).await;
        assert!(body["data"].is_null());
        assert_eq!(body["error"]["code"], 400);
        assert_eq!(body["error"]["title"], "Bad Request");
    }

    #[tokio::test]
    async fn handler_panic_becomes_server_error_envelope() {
        let response = call(Method::GET, "/api/panic").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = json(response).await;
        assert!(body["data"].is_null());
        assert_eq!(body["error"]["code"], 500);
    }

    fn bare(status: StatusCode) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        response
    }

    #[test]
    fn rejection_detection() {
        assert!(router_rejection(&bare(StatusCode::NOT_FOUND)).is_some());
        assert!(router_rejection(&bare(StatusCode::IM_A_TEAPOT)).is_some());
        assert!(router_rejection(&bare(StatusCode::OK)).is_none());
        assert!(router_rejection(&bare(StatusCode::FOUND)).is_none());

        let mut enveloped = bare(StatusCode::NOT_FOUND);
        enveloped.extensions_mut().insert(Enveloped);
        assert!(router_rejection(&enveloped).is_none());
    }

    #[test]
    fn rejection_forwards_headers_but_not_body_type() {
        let mut allowed = bare(StatusCode::METHOD_NOT_ALLOWED);
        allowed
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET,HEAD"));
        allowed
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let fault = router_rejection(&allowed).unwrap();
        assert!(fault.is_method_not_allowed());

        let FaultKind::Http(http) = fault.kind() else {
            panic!("expected an HTTP fault");
        };
        assert_eq!(http.headers()[header::ALLOW], "GET,HEAD");
        assert!(http.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn missing_allow_stays_absent() {
        let fault = router_rejection(&bare(StatusCode::METHOD_NOT_ALLOWED)).unwrap();
        let FaultKind::Http(http) = fault.kind() else {
            panic!("expected an HTTP fault");
        };
        assert!(http.headers().get(header::ALLOW).is_none());
    }
}
