// End-to-end tests driving an axum Router through the envelope middleware
#[cfg(test)]
mod test {
    use std::sync::Arc;

    use api_envelope::{
        AccessDeniedError, ApiConfig, ApiError, AuthenticationEntryPoint, AuthenticationError,
        Data, EnvelopeConfig, EnvelopeService, Fault, PathConfig, Pattern, Reply, Serializable,
        ServiceRegistry, envelope_router,
    };
    use axum::{
        Router,
        body::{Body, to_bytes},
        extract::Path,
        http::{HeaderValue, Method, Request, StatusCode, header},
        response::{IntoResponse, Response},
        routing::get,
    };
    use eyre::eyre;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct Opaque;

    impl Serializable for Opaque {}

    fn service(debug: bool) -> Arc<EnvelopeService> {
        let config = EnvelopeConfig::builder()
            .debug(debug)
            .path(
                PathConfig::with_prefix(
                    "/api",
                    ApiConfig::default()
                        .with_serializer("json_group_encode")
                        .with_cors_allow_origin(Pattern::new("^https://good\\.example$").unwrap())
                        .with_cors_allow_headers(["Content-Type", "Authorization"])
                        .with_cors_max_age(600),
                )
                .named("api"),
            )
            .build()
            .unwrap();

        Arc::new(EnvelopeService::new(&config, ServiceRegistry::new()).unwrap())
    }

    fn app(debug: bool) -> Router {
        let service = service(debug);
        let entry_point = AuthenticationEntryPoint::new(service.generator().clone(), "api");

        let routes = Router::new()
            .route("/api/items", get(|| async { Reply::new(Data::list(["a", "b"])) }))
            .route(
                "/api/items/{id}",
                get(|Path(id): Path<i64>| async move { Reply::new(id) }),
            )
            .route(
                "/api/panic",
                get(|| async {
                    let items: Vec<i64> = Vec::new();
                    Reply::new(items[3])
                }),
            )
            .route(
                "/api/missing",
                get(|| async {
                    Err::<Reply, Fault>(
                        ApiError::new(12, "not found")
                            .with_status(StatusCode::NOT_FOUND)
                            .into(),
                    )
                }),
            )
            .route(
                "/api/boom",
                get(|| async { Err::<Reply, Fault>(Fault::from(eyre!("boom"))) }),
            )
            .route(
                "/api/private",
                get(|| async {
                    Err::<Reply, Fault>(AuthenticationError::with_message("expired token").into())
                }),
            )
            .route(
                "/api/forbidden",
                get(|| async { Err::<Reply, Fault>(AccessDeniedError::new().into()) }),
            )
            .route(
                "/api/challenge",
                get(move || {
                    let entry_point = entry_point.clone();
                    async move { entry_point.start(None) }
                }),
            )
            .route("/api/nan", get(|| async { Reply::new(8f64.acos()) }))
            .route("/api/opaque", get(|| async { Data::object(Opaque) }))
            .route("/web/page", get(|| async { "plain page".into_response() }));

        envelope_router(routes, service)
    }

    async fn send(app: Router, method: Method, uri: &str, origin: Option<&str>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(origin) = origin {
            request = request.header(header::ORIGIN, origin);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_is_wrapped() {
        let response = send(app(false), Method::GET, "/api/items", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");
        assert_eq!(
            response.headers()[header::EXPIRES],
            "Mon, 01 Jan 1990 00:00:00 GMT"
        );
        assert_eq!(json_body(response).await, json!({"data": ["a", "b"], "error": null}));
    }

    #[tokio::test]
    async fn api_fault_is_verbatim() {
        let response = send(app(false), Method::GET, "/api/missing", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 12, "title": "not found", "errorData": null}})
        );
    }

    #[tokio::test]
    async fn unclassified_fault_is_generic_outside_debug() {
        let response = send(app(false), Method::GET, "/api/boom", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], 500);
        assert_eq!(body["error"]["title"], "Internal Server Error");
        assert_eq!(body["error"]["errorData"], Value::Null);
        assert_eq!(body["data"], Value::Null);
    }

    #[tokio::test]
    async fn unclassified_fault_is_detailed_in_debug() {
        let response = send(app(true), Method::GET, "/api/boom", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        let title = body["error"]["title"].as_str().unwrap();
        assert!(title.contains("with message 'boom'"), "{title}");
        assert!(title.contains("envelope_pipeline.rs:"), "{title}");
        assert!(body["error"]["errorData"].is_string());
    }

    #[tokio::test]
    async fn authentication_fault_is_401() {
        let response = send(app(false), Method::GET, "/api/private", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 401, "title": "Unauthorized", "errorData": null}})
        );
    }

    #[tokio::test]
    async fn access_denied_fault_is_403() {
        let response = send(app(false), Method::GET, "/api/forbidden", None).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"]["code"], 403);
    }

    #[tokio::test]
    async fn basic_auth_challenge_is_stripped() {
        let response = send(app(false), Method::GET, "/api/challenge", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(json_body(response).await["error"]["title"], "Unauthorized");
    }

    #[tokio::test]
    async fn serialization_failure_is_500_envelope() {
        let response = send(app(false), Method::GET, "/api/nan", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"]["code"], 500);
    }

    #[tokio::test]
    async fn non_serializable_object_is_empty_object() {
        let response = send(app(false), Method::GET, "/api/opaque", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"data": {}, "error": null}));
    }

    #[tokio::test]
    async fn matching_origin_gets_cors_headers() {
        let response = send(
            app(false),
            Method::GET,
            "/api/items",
            Some("https://good.example"),
        )
        .await;

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://good.example");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    }

    #[tokio::test]
    async fn foreign_origin_gets_no_cors_headers() {
        let response = send(
            app(false),
            Method::GET,
            "/api/items",
            Some("https://evil.example"),
        )
        .await;

        let headers = response.headers();
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).is_none());
        assert!(headers.get(header::ACCESS_CONTROL_MAX_AGE).is_none());
    }

    #[tokio::test]
    async fn preflight_is_answered_with_allow() {
        let response = send(
            app(false),
            Method::OPTIONS,
            "/api/items",
            Some("https://good.example"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let allow = response.headers()[header::ALLOW].clone();
        assert!(allow.to_str().unwrap().contains("GET"));
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], allow);
        assert_eq!(json_body(response).await, json!({"data": null, "error": null}));
    }

    #[tokio::test]
    async fn wrong_method_is_405_envelope() {
        let response = send(app(false), Method::DELETE, "/api/items", None).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 405, "title": "Method Not Allowed", "errorData": null}})
        );
    }

    #[tokio::test]
    async fn unknown_api_route_is_404_envelope() {
        let response = send(app(false), Method::GET, "/api/nowhere", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 404, "title": "Not Found", "errorData": null}})
        );
    }

    #[tokio::test]
    async fn paths_outside_the_api_are_untouched() {
        let response = send(
            app(false),
            Method::GET,
            "/web/page",
            Some("https://good.example"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            HeaderValue::from_static("text/plain; charset=utf-8")
        );

        let response = send(app(false), Method::GET, "/web/nowhere", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn extractor_rejection_is_400_envelope() {
        let response = send(
            app(false),
            Method::GET,
            "/api/items/abc",
            Some("https://good.example"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://good.example"
        );
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 400, "title": "Bad Request", "errorData": null}})
        );

        let response = send(app(false), Method::GET, "/api/items/7", None).await;
        assert_eq!(json_body(response).await, json!({"data": 7, "error": null}));
    }

    #[tokio::test]
    async fn panicking_handler_is_500_envelope() {
        let response = send(app(false), Method::GET, "/api/panic", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key(header::CACHE_CONTROL));
        assert_eq!(
            json_body(response).await,
            json!({"data": null, "error": {"code": 500, "title": "Internal Server Error", "errorData": null}})
        );
    }

    #[tokio::test]
    async fn panic_details_are_shown_in_debug_mode() {
        let response = send(app(true), Method::GET, "/api/panic", None).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        let title = body["error"]["title"].as_str().unwrap();
        assert!(title.contains("HandlerPanic"));
        assert!(title.contains("index out of bounds"));
    }
}
