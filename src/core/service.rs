use axum::response::Response;
use http::{HeaderValue, Method, StatusCode, header};
use tracing::{debug, warn};

use crate::{
    adapters::factory::{SerializerAdapterFactory, ServiceRegistry},
    config::{
        ActionConfig, ApiConfig, EnvelopeConfig, EnvelopeConfigValidator, ValidationError,
        ValidationResult,
    },
    core::{
        classifier::ErrorClassifier,
        compiler::ApiConfigCompiler,
        cors,
        fault::{Fault, FaultKind},
        generator::ResponseGenerator,
        reply::Reply,
    },
    metrics::{self, Outcome},
};

/// The envelope pipeline: one instance per application, shared behind an `Arc`.
///
/// The three hooks run at most once per handled request: [`on_result`] or
/// [`on_fault`], then [`finalize`].
///
/// [`on_result`]: EnvelopeService::on_result
/// [`on_fault`]: EnvelopeService::on_fault
/// [`finalize`]: EnvelopeService::finalize
#[derive(Debug, Clone)]
pub struct EnvelopeService {
    compiler: ApiConfigCompiler,
    generator: ResponseGenerator,
    classifier: ErrorClassifier,
}

impl EnvelopeService {
    /// Build the pipeline, failing if any configured serializer cannot be resolved.
    pub fn new(config: &EnvelopeConfig, registry: ServiceRegistry) -> ValidationResult<Self> {
        EnvelopeConfigValidator::validate(config)?;

        let factory = SerializerAdapterFactory::new(&config.default_serializer, registry);
        for name in config.serializer_names() {
            factory
                .create(Some(name))
                .map_err(|e| ValidationError::InvalidField {
                    field: "serializer".to_string(),
                    message: e.to_string(),
                })?;
        }

        Ok(Self {
            compiler: ApiConfigCompiler::from_config(config),
            generator: ResponseGenerator::new(factory),
            classifier: ErrorClassifier::new(config.debug),
        })
    }

    pub fn compiler(&self) -> &ApiConfigCompiler {
        &self.compiler
    }

    pub fn generator(&self) -> &ResponseGenerator {
        &self.generator
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Resolve the request's config; `None` leaves the response untouched.
    pub fn compile(&self, path: &str, action: Option<&ActionConfig>) -> Option<ApiConfig> {
        self.compiler.compile(path, action)
    }

    /// Envelope a successful result.
    ///
    /// Status: the reply's own, else the route's, else 200.
    pub fn on_result(
        &self,
        config: &ApiConfig,
        reply: Reply,
        action_status: Option<StatusCode>,
    ) -> Response {
        let status = reply.status.or(action_status);

        match self.generator.generate_success(
            reply.data,
            status,
            config.groups.as_deref(),
            config.serializer.as_deref(),
        ) {
            Ok(response) => {
                metrics::record_envelope_response(Outcome::Success, response.status());
                response
            }
            Err(e) => {
                warn!(error = %e, serializer = ?config.serializer, "Success envelope could not be generated");
                self.render_fault(&Fault::unhandled(e))
            }
        }
    }

    /// Envelope a fault.
    ///
    /// A 405 on an `OPTIONS` request is a CORS preflight for an existing route
    /// and becomes an empty `200` that keeps the `Allow` header.
    pub fn on_fault(&self, method: &Method, fault: &Fault) -> Response {
        if method == Method::OPTIONS && fault.is_method_not_allowed() {
            debug!("Answering preflight request");
            let mut response = self.generator.generate_empty_success();
            if let Some(allow) = allow_header(fault) {
                response.headers_mut().insert(header::ALLOW, allow);
            }
            metrics::record_envelope_response(Outcome::Preflight, response.status());
            return response;
        }

        self.render_fault(fault)
    }

    /// Cache and CORS headers; runs on every handled response.
    pub fn finalize(&self, config: &ApiConfig, origin: Option<&HeaderValue>, response: &mut Response) {
        cors::finalize_response(config, origin, response);
    }

    fn render_fault(&self, fault: &Fault) -> Response {
        metrics::record_fault(fault.kind().label());

        let classification = self.classifier.classify(fault);
        let response = self.generator.generate_from_classification(&classification);

        metrics::record_envelope_response(Outcome::Error, response.status());
        response
    }
}

fn allow_header(fault: &Fault) -> Option<HeaderValue> {
    match fault.kind() {
        FaultKind::Http(http) => http.headers().get(header::ALLOW).cloned(),
        _ => None,
    }
}
