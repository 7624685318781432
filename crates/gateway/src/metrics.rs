use axum::http::StatusCode;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};

/// Attribute value for requests rejected before a model was picked
const NO_MODEL: &str = "none";

/// Request-level instruments. Without a meter provider installed these
/// resolve to no-ops.
#[derive(Clone)]
pub struct DetectMetrics {
    requests: Counter<u64>,
    detections: Counter<u64>,
    duration: Histogram<f64>,
}

impl DetectMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        Self::from_meter(&global::meter(meter_name))
    }

    pub fn from_meter(meter: &Meter) -> Self {
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        let requests = meter
            .u64_counter("detect_requests_total")
            .with_description("Total detect requests, by model and response status")
            .build();
        let detections = meter
            .u64_counter("detect_detections_total")
            .with_description("Total detections returned to clients")
            .build();
        let duration = meter
            .f64_histogram("detect_duration_seconds")
            .with_description("Time to read, decode, run and select detections for one upload")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();

        Self {
            requests,
            detections,
            duration,
        }
    }

    pub fn record(
        &self,
        model: Option<&str>,
        status: StatusCode,
        returned: usize,
        elapsed_secs: f64,
    ) {
        let attributes = [
            KeyValue::new("model", model.unwrap_or(NO_MODEL).to_string()),
            KeyValue::new("status", i64::from(status.as_u16())),
        ];
        self.requests.add(1, &attributes);
        self.duration.record(elapsed_secs, &attributes);
        if returned > 0 {
            self.detections.add(returned as u64, &attributes[..1]);
        }
    }
}
