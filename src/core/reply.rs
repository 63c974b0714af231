//! Handler return types.
//!
//! Handlers return [`Reply`], [`Data`] or `Result<_, Fault>`. The value is
//! parked in the response extensions, where the envelope middleware picks it
//! up and renders the envelope. Without that middleware the response still
//! makes sense on its own: a result becomes plain JSON, a fault an empty body
//! with its status.
use std::sync::Arc;

use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;
use tracing::warn;

use crate::{
    adapters::serializers::JsonEncodeSerializerAdapter,
    core::{
        data::Data,
        fault::{Fault, FaultKind},
    },
    ports::serializer::{SerializationResult, SerializerAdapter},
};

/// A successful handler result.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub data: Data,
    /// Overrides the route's success status
    pub status: Option<StatusCode>,
}

impl Reply {
    pub fn new(data: impl Into<Data>) -> Self {
        Self {
            data: data.into(),
            status: None,
        }
    }

    /// Wrap any serde value, honouring its own serde attributes.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> SerializationResult<Self> {
        Data::from_serialize(value).map(Self::new)
    }

    pub fn created(data: impl Into<Data>) -> Self {
        Self::new(data).with_status(StatusCode::CREATED)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

/// Result waiting for the envelope middleware.
#[derive(Debug, Clone)]
pub struct PendingResult(pub Reply);

/// Fault waiting for the envelope middleware.
#[derive(Debug, Clone)]
pub struct PendingFault(pub Arc<Fault>);

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);

        let mut response = match JsonEncodeSerializerAdapter.serialize(&self.data, None) {
            Ok(body) => {
                let mut response = Response::new(Body::from(body));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                *response.status_mut() = status;
                response
            }
            Err(e) => {
                warn!(error = %e, "Reply cannot be rendered as plain JSON");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };

        response.extensions_mut().insert(PendingResult(self));
        response
    }
}

impl IntoResponse for Data {
    fn into_response(self) -> Response {
        Reply::new(self).into_response()
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();

        if let FaultKind::Http(http) = self.kind() {
            for (name, value) in http.headers() {
                response.headers_mut().insert(name.clone(), value.clone());
            }
        }

        response.extensions_mut().insert(PendingFault(Arc::new(self)));
        response
    }
}
