use crate::{backend::InferenceOutput, detection::Detection, labels::LabelTable};
use common::span;
use preprocess::PreprocessResult;

const ROW_WIDTH: usize = 6;

/// Maps model input coordinates back to the source image.
#[derive(Debug, Clone, Copy)]
pub struct TransformParams {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl TransformParams {
    pub fn identity(orig_width: u32, orig_height: u32) -> Self {
        Self {
            orig_width,
            orig_height,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn from_preprocess(result: &PreprocessResult, orig_width: u32, orig_height: u32) -> Self {
        Self {
            orig_width,
            orig_height,
            scale: result.scale,
            offset_x: result.offset_x,
            offset_y: result.offset_y,
        }
    }

    #[inline]
    fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x) / self.scale,
            (y - self.offset_y) / self.scale,
        )
    }

    #[inline]
    fn size(&self) -> (u32, u32) {
        (self.orig_width, self.orig_height)
    }
}

pub struct PostProcessor {
    pub score_threshold: f32,
    labels: LabelTable,
}

impl PostProcessor {
    pub fn new(score_threshold: f32, labels: LabelTable) -> Self {
        Self {
            score_threshold,
            labels,
        }
    }

    /// Turn raw model output into detections in source pixel space, in model
    /// output order.
    #[tracing::instrument(name = "decode_output", skip_all)]
    pub fn parse_detections(
        &self,
        output: &InferenceOutput,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<Detection>> {
        match output {
            InferenceOutput::Rows(rows) => self.parse_rows(rows, transform),
            InferenceOutput::Tensors {
                boxes,
                labels,
                scores,
            } => self.parse_tensors(boxes, labels, scores, transform),
        }
    }

    fn parse_rows(
        &self,
        rows: &ndarray::ArrayD<f32>,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<Detection>> {
        let _s = span!("parse_rows");

        let width = rows.shape().last().copied().unwrap_or(0);
        if !rows.is_empty() && width < ROW_WIDTH {
            anyhow::bail!(
                "Unexpected detection row width {} (shape {:?}), expected at least {}",
                width,
                rows.shape(),
                ROW_WIDTH
            );
        }

        let data: Vec<f32> = rows.iter().copied().collect();
        let mut detections = Vec::new();

        for row in data.chunks_exact(width.max(ROW_WIDTH)) {
            let confidence = row[4];

            // NaN fails this comparison as well
            if !(confidence >= self.score_threshold) {
                continue;
            }

            let (x1, y1) = transform.to_source(row[0], row[1]);
            let (x2, y2) = transform.to_source(row[2], row[3]);

            detections.push(Detection::from_corners(
                self.labels.label(row[5] as i64),
                confidence,
                (x1, y1, x2, y2),
                transform.size(),
            ));
        }

        Ok(detections)
    }

    fn parse_tensors(
        &self,
        boxes: &ndarray::ArrayD<f32>,
        labels: &ndarray::ArrayD<i64>,
        scores: &ndarray::ArrayD<f32>,
        transform: &TransformParams,
    ) -> anyhow::Result<Vec<Detection>> {
        let _s = span!("parse_tensors");

        let count = scores.len();
        if labels.len() != count || boxes.len() != count * 4 {
            anyhow::bail!(
                "Output tensor mismatch: boxes {:?}, labels {:?}, scores {:?}",
                boxes.shape(),
                labels.shape(),
                scores.shape()
            );
        }

        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let mut detections = Vec::new();

        for ((corners, &label), &confidence) in boxes
            .chunks_exact(4)
            .zip(labels.iter())
            .zip(scores.iter())
        {
            if !(confidence >= self.score_threshold) {
                continue;
            }

            let (x1, y1) = transform.to_source(corners[0], corners[1]);
            let (x2, y2) = transform.to_source(corners[2], corners[3]);

            detections.push(Detection::from_corners(
                self.labels.label(label),
                confidence,
                (x1, y1, x2, y2),
                transform.size(),
            ));
        }

        Ok(detections)
    }
}
