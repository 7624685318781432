use crate::{Normalization, Preprocess, PreprocessResult, check_rgb_buffer, to_planar};
use common::span;
use ndarray::{Array, IxDyn};

/// Feeds the image at its own resolution as an un-batched `[3, H, W]` tensor.
///
/// Detection models that resize internally (torchvision exports) take this form
/// and report boxes directly in source pixel space, so scale is 1 and offsets 0.
#[derive(Debug, Default)]
pub struct NativePreProcessor {
    normalization: Normalization,
}

impl NativePreProcessor {
    pub fn new(normalization: Normalization) -> Self {
        Self { normalization }
    }
}

impl Preprocess for NativePreProcessor {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        let _s = span!("preprocess");

        check_rgb_buffer(pixels, width, height)?;

        let (w, h) = (width as usize, height as usize);
        let tensor = Array::from_shape_vec(
            IxDyn(&[3, h, w]),
            to_planar(pixels, w, h, self.normalization),
        )?;

        Ok(PreprocessResult {
            tensor,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        })
    }
}
