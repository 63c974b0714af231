//! Envelopes for an authentication layer's own rejections.
//!
//! An auth layer that answers before any handler runs can use these to keep
//! its 401 and 403 responses in the envelope format.
use axum::response::Response;
use http::{HeaderValue, StatusCode, header};
use tracing::debug;

use crate::core::{
    fault::{AccessDeniedError, AuthenticationError},
    generator::ResponseGenerator,
};

fn reason(status: StatusCode) -> Option<String> {
    status.canonical_reason().map(str::to_string)
}

/// Answers unauthenticated requests with a 401 envelope and a basic-auth challenge.
///
/// The envelope middleware strips the challenge again on API paths.
#[derive(Debug, Clone)]
pub struct AuthenticationEntryPoint {
    generator: ResponseGenerator,
    realm: String,
}

impl AuthenticationEntryPoint {
    pub fn new(generator: ResponseGenerator, realm: impl Into<String>) -> Self {
        Self {
            generator,
            realm: realm.into(),
        }
    }

    pub fn start(&self, error: Option<&AuthenticationError>) -> Response {
        if let Some(error) = error {
            debug!(error = %error, "Authentication required");
        }

        let status = StatusCode::UNAUTHORIZED;
        let mut response = self.generator.generate_error(
            Some(status),
            Some(status.as_u16().into()),
            reason(status),
            None,
        );

        let challenge = format!("Basic realm=\"{}\"", self.realm.replace('"', "'"));
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        response
    }
}

/// Answers authenticated but unauthorized requests with a 403 envelope.
#[derive(Debug, Clone)]
pub struct AccessDeniedHandler {
    generator: ResponseGenerator,
}

impl AccessDeniedHandler {
    pub fn new(generator: ResponseGenerator) -> Self {
        Self { generator }
    }

    pub fn handle(&self, error: &AccessDeniedError) -> Response {
        debug!(error = %error, "Access denied");

        let status = StatusCode::FORBIDDEN;
        self.generator.generate_error(
            Some(status),
            Some(status.as_u16().into()),
            reason(status),
            None,
        )
    }
}
