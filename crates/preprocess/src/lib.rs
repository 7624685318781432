pub mod letterbox;
pub mod native;

use ndarray::{Array, IxDyn};
use serde::Deserialize;

pub use letterbox::LetterboxPreProcessor;
pub use native::NativePreProcessor;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Per-channel scaling applied after the pixels are laid out as CHW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// `value / 255`, what Ultralytics and torchvision exports expect.
    #[default]
    Unit,
    /// `(value / 255 - mean) / std` with the ImageNet statistics.
    Imagenet,
}

impl Normalization {
    #[inline]
    fn apply(&self, channel: usize, value: u8) -> f32 {
        let v = value as f32 / 255.0;
        match self {
            Normalization::Unit => v,
            Normalization::Imagenet => (v - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

/// Result of preprocessing including transformation parameters
#[derive(Debug)]
pub struct PreprocessResult {
    /// Model input, `[1, 3, H, W]` for letterboxed input, `[3, H, W]` for native
    pub tensor: Array<f32, IxDyn>,
    /// Scale factor applied during letterboxing
    pub scale: f32,
    /// X offset from letterboxing (in pixels)
    pub offset_x: f32,
    /// Y offset from letterboxing (in pixels)
    pub offset_y: f32,
}

/// Trait for image preprocessing implementations
pub trait Preprocess: Send {
    /// Preprocess an image for inference
    ///
    /// # Arguments
    /// * `pixels` - RGB pixel data in HWC format
    /// * `width` - Image width
    /// * `height` - Image height
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult>;
}

pub(crate) fn check_rgb_buffer(pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    if width == 0 || height == 0 {
        anyhow::bail!("Empty image: {}x{}", width, height);
    }

    let expected_size = width as usize * height as usize * 3;
    if pixels.len() != expected_size {
        anyhow::bail!(
            "Buffer size mismatch: expected {}, got {} bytes",
            expected_size,
            pixels.len()
        );
    }

    Ok(())
}

/// Convert packed RGB (HWC) into planar CHW floats.
pub(crate) fn to_planar(
    pixels: &[u8],
    width: usize,
    height: usize,
    normalization: Normalization,
) -> Vec<f32> {
    let spatial = width * height;
    let mut output = vec![0.0f32; 3 * spatial];

    for (i, px) in pixels.chunks_exact(3).enumerate() {
        output[i] = normalization.apply(0, px[0]);
        output[i + spatial] = normalization.apply(1, px[1]);
        output[i + 2 * spatial] = normalization.apply(2, px[2]);
    }

    output
}
