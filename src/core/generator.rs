use axum::{body::Body, response::Response};
use http::{HeaderValue, StatusCode, header};
use thiserror::Error;
use tracing::warn;

use crate::{
    adapters::{
        factory::{FactoryError, SerializerAdapterFactory},
        serializers::JsonEncodeSerializerAdapter,
    },
    core::{
        classifier::Classification,
        data::Data,
        envelope::{ErrorModel, ResponseEnvelope},
    },
    ports::serializer::{SerializationError, SerializerAdapter},
};

/// Marker extension on every response produced by [`ResponseGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Enveloped;

/// Error raised while building a success response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GenerateError {
    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// Result type alias for response generation
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Builds enveloped JSON responses.
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    factory: SerializerAdapterFactory,
}

impl ResponseGenerator {
    pub fn new(factory: SerializerAdapterFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &SerializerAdapterFactory {
        &self.factory
    }

    /// `{"data": <data>, "error": null}` through the named (or default) adapter.
    ///
    /// `status` defaults to 200.
    pub fn generate_success(
        &self,
        data: Data,
        status: Option<StatusCode>,
        groups: Option<&[String]>,
        serializer: Option<&str>,
    ) -> GenerateResult<Response> {
        let adapter = self.factory.create(serializer)?;
        let body = adapter.serialize(&Data::object(ResponseEnvelope::success(data)), groups)?;

        Ok(json_response(status.unwrap_or(StatusCode::OK), body))
    }

    /// `200 {"data": null, "error": null}`, the answer to a preflight request.
    pub fn generate_empty_success(&self) -> Response {
        let body = JsonEncodeSerializerAdapter
            .serialize(&Data::object(ResponseEnvelope::empty()), None)
            .unwrap_or_else(|_| r#"{"data":null,"error":null}"#.to_string());

        json_response(StatusCode::OK, body)
    }

    /// Error envelope, always through the plain JSON adapter.
    ///
    /// Status defaults to 500 and code to 0. Error data that cannot be
    /// encoded is dropped; the envelope itself is always produced.
    pub fn generate_error(
        &self,
        status: Option<StatusCode>,
        code: Option<i64>,
        title: Option<String>,
        error_data: Option<Data>,
    ) -> Response {
        let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let model = ErrorModel::new(code.unwrap_or(0), title, error_data);

        let body = match encode_error(&model) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, code = model.code, "Dropping error data that cannot be encoded");
                let stripped = ErrorModel {
                    error_data: None,
                    ..model
                };
                encode_error(&stripped).unwrap_or_else(|_| literal_error(&stripped))
            }
        };

        json_response(status, body)
    }

    /// Error envelope for a classified fault, with the fault's headers.
    pub fn generate_from_classification(&self, classification: &Classification) -> Response {
        let mut response = self.generate_error(
            Some(classification.status),
            Some(classification.code),
            classification.title.clone(),
            classification.error_data.clone(),
        );

        for (name, value) in &classification.headers {
            response.headers_mut().insert(name.clone(), value.clone());
        }

        response
    }
}

fn encode_error(model: &ErrorModel) -> Result<String, SerializationError> {
    JsonEncodeSerializerAdapter.serialize(
        &Data::object(ResponseEnvelope::failure(model.clone())),
        None,
    )
}

fn literal_error(model: &ErrorModel) -> String {
    serde_json::json!({
        "data": null,
        "error": {"code": model.code, "title": model.title, "errorData": null}
    })
    .to_string()
}

fn json_response(status: StatusCode, body: String) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response.extensions_mut().insert(Enveloped);
    response
}
