//! Envelope counters on the OpenTelemetry global meter.
//!
//! No exporter is installed here; until the host application registers a
//! meter provider the instruments are no-ops.
//!
//! Provided metrics:
//! * `envelope_responses_total` (counter; labels `outcome`, `status`)
//! * `envelope_faults_total` (counter; label `kind`)
use http::StatusCode;
use once_cell::sync::Lazy;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Meter},
};

pub const METER_NAME: &str = "api-envelope";
pub const ENVELOPE_RESPONSES_TOTAL: &str = "envelope_responses_total";
pub const ENVELOPE_FAULTS_TOTAL: &str = "envelope_faults_total";

/// Outcome label of an enveloped response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
    Preflight,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
            Outcome::Preflight => "preflight",
        }
    }
}

struct EnvelopeInstruments {
    responses: Counter<u64>,
    faults: Counter<u64>,
}

static INSTRUMENTS: Lazy<EnvelopeInstruments> = Lazy::new(|| {
    let meter: Meter = global::meter(METER_NAME);

    EnvelopeInstruments {
        responses: meter
            .u64_counter(ENVELOPE_RESPONSES_TOTAL)
            .with_description("Responses wrapped in an envelope, by outcome and status.")
            .build(),
        faults: meter
            .u64_counter(ENVELOPE_FAULTS_TOTAL)
            .with_description("Faults classified by the envelope pipeline, by kind.")
            .build(),
    }
});

/// Create the instruments up front.
///
/// Call after the host has installed its meter provider; instruments created
/// earlier stay bound to the no-op provider.
pub fn init_metrics() {
    Lazy::force(&INSTRUMENTS);
}

pub fn record_envelope_response(outcome: Outcome, status: StatusCode) {
    INSTRUMENTS.responses.add(
        1,
        &[
            KeyValue::new("outcome", outcome.as_str()),
            KeyValue::new("status", i64::from(status.as_u16())),
        ],
    );
}

pub fn record_fault(kind: &'static str) {
    INSTRUMENTS.faults.add(1, &[KeyValue::new("kind", kind)]);
}
