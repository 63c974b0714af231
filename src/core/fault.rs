//! Faults a handler can raise, and how they are recognized later.
//!
//! The typed faults map to fixed rows of the classification table. Anything
//! else travels as [`UnhandledFault`], an [`eyre::Report`] plus the type name
//! and source location captured where it entered the pipeline.
use std::{error::Error as StdError, fmt, panic::Location};

use http::{HeaderMap, HeaderValue, StatusCode, header};
use thiserror::Error;

use crate::{
    adapters::factory::FactoryError,
    core::{data::Data, envelope::FormErrors},
    ports::serializer::SerializationError,
};

/// Title used by [`ApiError::invalid_form`].
pub const INVALID_FORM_TITLE: &str = "Invalid form submission.";

/// A deliberate API failure: status, application code, title and optional data
/// are exposed to the client verbatim.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: i64,
    message: String,
    error_data: Option<Data>,
}

impl ApiError {
    /// A 400 failure with an application code and a title.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
            error_data: None,
        }
    }

    /// A failure titled with the reason phrase of `status`, code 0.
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            status,
            code: 0,
            message: reason_phrase(status),
            error_data: None,
        }
    }

    /// Failed form validation: 400, the form's messages as `errorData`.
    pub fn invalid_form(errors: FormErrors) -> Self {
        Self::new(0, INVALID_FORM_TITLE).with_error_data(errors)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Extra data exposed to the client; never put internals here.
    pub fn with_error_data(mut self, data: impl Into<Data>) -> Self {
        self.error_data = Some(data.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_data(&self) -> Option<&Data> {
        self.error_data.as_ref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl StdError for ApiError {}

/// A protocol-level failure such as 404 or 405, with headers to forward.
#[derive(Debug, Clone)]
pub struct HttpError {
    status: StatusCode,
    headers: HeaderMap,
}

impl HttpError {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 405 carrying the permitted methods in `Allow`.
    pub fn method_not_allowed(allow: HeaderValue) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED).with_header(header::ALLOW, allow)
    }

    /// Add a header value; repeated names keep every value.
    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn reason(&self) -> String {
        reason_phrase(self.status)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)
    }
}

impl StdError for HttpError {}

/// The caller is not authenticated.
#[derive(Error, Debug, Clone, Default)]
#[error("Authentication required{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct AuthenticationError(pub Option<String>);

impl AuthenticationError {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self(Some(message.into()))
    }
}

/// The caller is authenticated but not allowed.
#[derive(Error, Debug, Clone, Default)]
#[error("Access denied{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct AccessDeniedError(pub Option<String>);

impl AccessDeniedError {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self(Some(message.into()))
    }
}

/// A handler panicked; carries the panic message.
#[derive(Error, Debug, Clone)]
#[error("handler panicked: {0}")]
pub struct HandlerPanic(pub String);

/// Any other failure, kept with where it was raised.
#[derive(Error, Debug)]
#[error("{report}")]
pub struct UnhandledFault {
    report: eyre::Report,
    type_name: &'static str,
    location: &'static Location<'static>,
}

impl UnhandledFault {
    #[track_caller]
    pub fn new(report: eyre::Report, type_name: &'static str) -> Self {
        Self {
            report,
            type_name,
            location: Location::caller(),
        }
    }

    pub fn report(&self) -> &eyre::Report {
        &self.report
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn message(&self) -> String {
        self.report.to_string()
    }
}

/// Everything a handler can fail with.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Fault {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    AccessDenied(#[from] AccessDeniedError),

    #[error(transparent)]
    Unhandled(UnhandledFault),
}

/// The classification-relevant view of a [`Fault`].
#[derive(Debug, Clone, Copy)]
pub enum FaultKind<'a> {
    Api(&'a ApiError),
    Http(&'a HttpError),
    Authentication(&'a AuthenticationError),
    AccessDenied(&'a AccessDeniedError),
    Unclassified(&'a UnhandledFault),
}

impl FaultKind<'_> {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FaultKind::Api(_) => "api",
            FaultKind::Http(_) => "http",
            FaultKind::Authentication(_) => "authentication",
            FaultKind::AccessDenied(_) => "access_denied",
            FaultKind::Unclassified(_) => "unhandled",
        }
    }
}

impl Fault {
    /// Wrap any error as an unhandled fault, recording the caller.
    #[track_caller]
    pub fn unhandled<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Fault::Unhandled(UnhandledFault::new(
            eyre::Report::new(error),
            std::any::type_name::<E>(),
        ))
    }

    /// Resolve the fault to its classification row.
    ///
    /// An unhandled report is searched for typed faults along its cause chain,
    /// in the same priority order as the direct variants.
    pub fn kind(&self) -> FaultKind<'_> {
        match self {
            Fault::Api(e) => FaultKind::Api(e),
            Fault::Http(e) => FaultKind::Http(e),
            Fault::Authentication(e) => FaultKind::Authentication(e),
            Fault::AccessDenied(e) => FaultKind::AccessDenied(e),
            Fault::Unhandled(unhandled) => probe(unhandled),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            FaultKind::Api(e) => e.status(),
            FaultKind::Http(e) => e.status(),
            FaultKind::Authentication(_) => StatusCode::UNAUTHORIZED,
            FaultKind::AccessDenied(_) => StatusCode::FORBIDDEN,
            FaultKind::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for a 405, the fault a preflight request runs into.
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self.kind(), FaultKind::Http(e) if e.status() == StatusCode::METHOD_NOT_ALLOWED)
    }
}

fn probe(unhandled: &UnhandledFault) -> FaultKind<'_> {
    let chain = || unhandled.report.chain();

    if let Some(e) = chain().find_map(typed::<ApiError>) {
        return FaultKind::Api(e);
    }
    if let Some(e) = chain().find_map(typed::<HttpError>) {
        return FaultKind::Http(e);
    }
    if let Some(e) = chain().find_map(typed::<AuthenticationError>) {
        return FaultKind::Authentication(e);
    }
    if let Some(e) = chain().find_map(typed::<AccessDeniedError>) {
        return FaultKind::AccessDenied(e);
    }
    FaultKind::Unclassified(unhandled)
}

// A `Fault` inside a report hides its typed payload behind `transparent`.
fn typed<'a, T>(error: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    if let Some(found) = error.downcast_ref::<T>() {
        return Some(found);
    }

    let inner: &(dyn StdError + 'static) = match error.downcast_ref::<Fault>()? {
        Fault::Api(e) => e,
        Fault::Http(e) => e,
        Fault::Authentication(e) => e,
        Fault::AccessDenied(e) => e,
        Fault::Unhandled(e) => return e.report.chain().find_map(typed::<T>),
    };
    inner.downcast_ref::<T>()
}

// `Fault::from` and `?` record the caller; `.into()` records the blanket `Into` impl instead.
impl From<eyre::Report> for Fault {
    #[track_caller]
    fn from(report: eyre::Report) -> Self {
        Fault::Unhandled(UnhandledFault::new(
            report,
            std::any::type_name::<eyre::Report>(),
        ))
    }
}

impl From<SerializationError> for Fault {
    #[track_caller]
    fn from(error: SerializationError) -> Self {
        Fault::unhandled(error)
    }
}

impl From<FactoryError> for Fault {
    #[track_caller]
    fn from(error: FactoryError) -> Self {
        Fault::unhandled(error)
    }
}

fn reason_phrase(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown Status")
        .to_string()
}
