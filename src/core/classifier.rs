use http::{HeaderMap, StatusCode};
use tracing::error;

use crate::core::{
    data::Data,
    fault::{Fault, FaultKind, UnhandledFault},
};

/// The error envelope and status a fault turns into.
#[derive(Debug, Clone)]
pub struct Classification {
    pub status: StatusCode,
    pub code: i64,
    pub title: Option<String>,
    pub error_data: Option<Data>,
    /// Headers the fault asks to forward, such as `Allow`
    pub headers: HeaderMap,
}

impl Classification {
    fn new(status: StatusCode, code: i64, title: impl Into<String>) -> Self {
        Self {
            status,
            code,
            title: Some(title.into()),
            error_data: None,
            headers: HeaderMap::new(),
        }
    }

    /// Status used as both HTTP status and error code, titled by its reason phrase.
    fn generic(status: StatusCode) -> Self {
        Self::new(status, status.as_u16().into(), reason(status))
    }
}

/// Maps faults to classifications, first match wins:
///
/// | fault | status | code | title | errorData |
/// |---|---|---|---|---|
/// | [`ApiError`](crate::core::fault::ApiError) | its status | its code | its message | its data |
/// | [`HttpError`](crate::core::fault::HttpError) | its status | its status | reason phrase | none |
/// | authentication | 401 | 401 | `Unauthorized` | none |
/// | access denied | 403 | 403 | `Forbidden` | none |
/// | anything else | 500 | 500 | generic, or details in debug mode | report in debug mode |
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier {
    debug: bool,
}

impl ErrorClassifier {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Classify `fault`; 5xx outcomes are logged as critical.
    pub fn classify(&self, fault: &Fault) -> Classification {
        let classification = match fault.kind() {
            FaultKind::Api(e) => Classification {
                status: e.status(),
                code: e.code(),
                title: Some(e.message().to_string()),
                error_data: e.error_data().cloned(),
                headers: HeaderMap::new(),
            },
            FaultKind::Http(e) => Classification {
                headers: e.headers().clone(),
                ..Classification::generic(e.status())
            },
            FaultKind::Authentication(_) => Classification::generic(StatusCode::UNAUTHORIZED),
            FaultKind::AccessDenied(_) => Classification::generic(StatusCode::FORBIDDEN),
            FaultKind::Unclassified(unhandled) => self.unclassified(unhandled),
        };

        if classification.status.is_server_error() {
            log_critical(fault);
        }

        classification
    }

    fn unclassified(&self, unhandled: &UnhandledFault) -> Classification {
        let mut classification = Classification::generic(StatusCode::INTERNAL_SERVER_ERROR);

        if self.debug {
            let location = unhandled.location();
            classification.title = Some(format!(
                "error '{}' with message '{}' in {}:{}",
                unhandled.type_name(),
                unhandled.message(),
                location.file(),
                location.line()
            ));
            classification.error_data = Some(Data::String(format!("{:?}", unhandled.report())));
        }

        classification
    }
}

fn log_critical(fault: &Fault) {
    let (type_name, message, location) = match fault.kind() {
        FaultKind::Unclassified(unhandled) => (
            unhandled.type_name(),
            unhandled.message(),
            Some(unhandled.location()),
        ),
        FaultKind::Api(e) => (std::any::type_name_of_val(e), e.message().to_string(), None),
        FaultKind::Http(e) => (std::any::type_name_of_val(e), e.reason(), None),
        FaultKind::Authentication(e) => (std::any::type_name_of_val(e), e.to_string(), None),
        FaultKind::AccessDenied(e) => (std::any::type_name_of_val(e), e.to_string(), None),
    };

    match location {
        Some(location) => error!(
            severity = "critical",
            fault_type = type_name,
            fault.message = %message,
            fault.file = location.file(),
            fault.line = location.line(),
            "API fault {type_name}: \"{message}\" at {} line {}",
            location.file(),
            location.line()
        ),
        None => error!(
            severity = "critical",
            fault_type = type_name,
            fault.message = %message,
            "API fault {type_name}: \"{message}\""
        ),
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}
