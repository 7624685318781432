use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use inference::{
    InferenceOutput, SelectionPolicy,
    labels::{COCO_80, LabelTable},
    processing::post::{PostProcessor, TransformParams},
};
use ndarray::{Array, IxDyn};

/// Mock end-to-end YOLO output: 300 rows, the first `num_detections` confident
fn create_mock_rows(num_rows: usize, num_detections: usize) -> InferenceOutput {
    let mut data = vec![0.0f32; num_rows * 6];

    for i in 0..num_detections.min(num_rows) {
        let row = &mut data[i * 6..(i + 1) * 6];
        row.copy_from_slice(&[
            100.0,
            100.0,
            200.0,
            200.0,
            0.3 + (i % 70) as f32 / 100.0,
            (i % 80) as f32,
        ]);
    }

    InferenceOutput::Rows(Array::from_shape_vec(IxDyn(&[1, num_rows, 6]), data).unwrap())
}

fn benchmark_decode_and_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_and_select");

    let postprocessor = PostProcessor::new(0.25, LabelTable::from_static(&COCO_80));
    let transform = TransformParams {
        orig_width: 1920,
        orig_height: 1080,
        scale: 640.0 / 1920.0,
        offset_x: 0.0,
        offset_y: 140.0,
    };
    let policy = SelectionPolicy::default();

    for num_detections in [0, 10, 50, 300] {
        let output = create_mock_rows(300, num_detections);

        group.bench_with_input(
            BenchmarkId::from_parameter(num_detections),
            &output,
            |b, output| {
                b.iter(|| {
                    let raw = postprocessor
                        .parse_detections(black_box(output), black_box(&transform))
                        .unwrap();
                    policy.select(raw)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_decode_and_select);
criterion_main!(benches);
