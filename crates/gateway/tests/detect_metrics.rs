use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use gateway::{AppState, metrics::DetectMetrics, router};
use image::{ImageFormat, RgbImage};
use inference::{Detection, Detector, ModelRegistry, SelectionPolicy};
use opentelemetry::{Value, metrics::MeterProvider};
use opentelemetry_sdk::metrics::{
    InMemoryMetricExporter, PeriodicReader, SdkMeterProvider,
    data::{AggregatedMetrics, MetricData},
};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "metrics-test-boundary";

struct OneDetection;

impl Detector for OneDetection {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        Ok(vec![Detection {
            label: "person".to_string(),
            confidence: 0.9,
            bbox: [0, 0, 4, 4],
        }])
    }
}

fn app(metrics: DetectMetrics) -> axum::Router {
    let detector: Arc<dyn Detector> = Arc::new(OneDetection);
    let registry = ModelRegistry::new(vec![("yolo11n.pt".to_string(), detector)], "yolo11n.pt")
        .unwrap();
    let mut state = AppState::new(registry, SelectionPolicy::default(), false);
    state.metrics = metrics;
    router(state, 1024 * 1024)
}

fn request(part_name: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let disposition = match filename {
        Some(filename) => format!("form-data; name=\"{part_name}\"; filename=\"{filename}\""),
        None => format!("form-data; name=\"{part_name}\""),
    };

    let mut body = format!("--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\n\r\n").into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// `(model, status, count)` points of `detect_requests_total`, sorted
fn request_counts(exporter: &InMemoryMetricExporter) -> Vec<(String, i64, u64)> {
    let mut counts = Vec::new();

    for resource in exporter.get_finished_metrics().unwrap() {
        for scope in resource.scope_metrics() {
            for metric in scope.metrics() {
                if metric.name() != "detect_requests_total" {
                    continue;
                }
                let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() else {
                    panic!("detect_requests_total should be a u64 sum");
                };
                for point in sum.data_points() {
                    let mut model = String::new();
                    let mut status = 0;
                    for attribute in point.attributes() {
                        match (attribute.key.as_str(), &attribute.value) {
                            ("model", value) => model = value.as_str().into_owned(),
                            ("status", Value::I64(code)) => status = *code,
                            _ => {}
                        }
                    }
                    counts.push((model, status, point.value()));
                }
            }
        }
    }

    counts.sort();
    counts
}

#[tokio::test]
async fn test_rejected_and_served_requests_are_counted() {
    let exporter = InMemoryMetricExporter::default();
    let provider = SdkMeterProvider::builder()
        .with_reader(PeriodicReader::builder(exporter.clone()).build())
        .build();
    let metrics = DetectMetrics::from_meter(&provider.meter("detect-test"));

    let mut png = Vec::new();
    RgbImage::new(4, 4)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let rejected = app(metrics.clone())
        .oneshot(request("model", None, b"yolo11n.pt"))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let undecodable = app(metrics.clone())
        .oneshot(request("image", Some("x.png"), b"not an image"))
        .await
        .unwrap();
    assert_eq!(undecodable.status(), StatusCode::BAD_REQUEST);

    let served = app(metrics)
        .oneshot(request("image", Some("x.png"), &png))
        .await
        .unwrap();
    assert_eq!(served.status(), StatusCode::OK);

    provider.force_flush().unwrap();

    assert_eq!(
        request_counts(&exporter),
        vec![
            ("none".to_string(), 400, 1),
            ("yolo11n.pt".to_string(), 200, 1),
            ("yolo11n.pt".to_string(), 400, 1),
        ]
    );
}
