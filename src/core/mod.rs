pub mod classifier;
pub mod compiler;
pub mod cors;
pub mod data;
pub mod envelope;
pub mod fault;
pub mod generator;
pub mod reply;
pub mod service;

pub use classifier::{Classification, ErrorClassifier};
pub use compiler::{ApiConfigCompiler, PathMatcher};
pub use data::{DEFAULT_GROUP, Data, ExposedField, Serializable};
pub use envelope::{ErrorModel, FormErrors, ResponseEnvelope};
pub use fault::{
    AccessDeniedError, ApiError, AuthenticationError, Fault, FaultKind, HandlerPanic, HttpError,
    UnhandledFault,
};
pub use generator::{Enveloped, GenerateError, GenerateResult, ResponseGenerator};
pub use reply::{PendingFault, PendingResult, Reply};
pub use service::EnvelopeService;
