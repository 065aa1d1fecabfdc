//! Prometheus metrics for the request/reply bridge.
//!
//! All metrics follow the naming convention: `care_bridge_<metric>_<unit>`
//! and carry a `call_type` label (`user_exists`, `announcement_owner`,
//! `application_verification`).
//!
//! Collectors are usable before `register_metrics()` is called; registration
//! only makes them visible to `encode_metrics()`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::time::Duration;

use crate::TelemetryError;

/// Value of the `role` label on malformed-message counts from the requester side.
pub const ROLE_REQUESTER: &str = "requester";

/// Value of the `role` label on malformed-message counts from the responder side.
pub const ROLE_RESPONDER: &str = "responder";

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REQUESTER METRICS
    // =========================================================================

    /// Calls issued (one request published or attempted per call)
    pub static ref CALLS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_calls_total", "Total calls issued by requesters"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Calls resolved by a matched reply
    pub static ref REPLIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_replies_total", "Calls resolved by a matched reply"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Calls resolved by the fallback policy at their deadline
    pub static ref TIMEOUTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_timeouts_total", "Calls resolved by fallback after timing out"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Calls that failed because the request could not be published
    pub static ref PUBLISH_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_publish_failures_total", "Requests the transport refused to publish"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Replies with no pending call (late, duplicate, or for another process)
    pub static ref UNMATCHED_REPLIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_unmatched_replies_total", "Replies that matched no pending call"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Calls currently waiting for a reply or a timeout
    pub static ref PENDING_CALLS: IntGaugeVec = IntGaugeVec::new(
        Opts::new("care_bridge_pending_calls", "Calls currently pending"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Time from publish to resolution, by outcome (reply/timeout)
    pub static ref CALL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "care_bridge_call_duration_seconds",
            "Time from request publish to resolution"
        ).buckets(exponential_buckets(0.001, 2.0, 14).expect("valid buckets")),
        &["call_type", "outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // SHARED METRICS
    // =========================================================================

    /// Messages that failed to decode (role: requester/responder)
    pub static ref MALFORMED_MESSAGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_malformed_messages_total", "Messages dropped because they failed to decode"),
        &["call_type", "role"]
    ).expect("metric creation failed");

    // =========================================================================
    // RESPONDER METRICS
    // =========================================================================

    /// Requests handled and answered
    pub static ref REQUESTS_HANDLED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_requests_handled_total", "Requests answered by responders"),
        &["call_type"]
    ).expect("metric creation failed");

    /// Handler errors and panics (no reply sent)
    pub static ref HANDLER_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("care_bridge_handler_failures_total", "Handler invocations that failed or panicked"),
        &["call_type"]
    ).expect("metric creation failed");
}

/// Register all bridge metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Requester
        Box::new(CALLS_TOTAL.clone()),
        Box::new(REPLIES_TOTAL.clone()),
        Box::new(TIMEOUTS_TOTAL.clone()),
        Box::new(PUBLISH_FAILURES_TOTAL.clone()),
        Box::new(UNMATCHED_REPLIES_TOTAL.clone()),
        Box::new(PENDING_CALLS.clone()),
        Box::new(CALL_DURATION.clone()),
        // Shared
        Box::new(MALFORMED_MESSAGES_TOTAL.clone()),
        // Responder
        Box::new(REQUESTS_HANDLED_TOTAL.clone()),
        Box::new(HANDLER_FAILURES_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record a call resolved by a matched reply.
pub fn observe_reply(call_type: &str, elapsed: Duration) {
    REPLIES_TOTAL.with_label_values(&[call_type]).inc();
    CALL_DURATION
        .with_label_values(&[call_type, "reply"])
        .observe(elapsed.as_secs_f64());
}

/// Record a call resolved by its fallback.
pub fn observe_timeout(call_type: &str, elapsed: Duration) {
    TIMEOUTS_TOTAL.with_label_values(&[call_type]).inc();
    CALL_DURATION
        .with_label_values(&[call_type, "timeout"])
        .observe(elapsed.as_secs_f64());
}
