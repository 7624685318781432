use crate::{
    DEFAULT_INPUT_SIZE, Normalization, Preprocess, PreprocessResult, check_rgb_buffer, to_planar,
};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

/// Aspect-preserving resize into a fixed model input, padded with grey.
pub struct LetterboxPreProcessor {
    pub input_size: (u32, u32),
    normalization: Normalization,
    letterboxed_buffer: Vec<u8>,
}

impl LetterboxPreProcessor {
    pub fn new(input_size: (u32, u32), normalization: Normalization) -> Self {
        Self {
            input_size,
            normalization,
            letterboxed_buffer: vec![LETTERBOX_COLOR; (input_size.0 * input_size.1 * 3) as usize],
        }
    }

    pub fn preprocess_from_u8_slice(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        let _s = span!("preprocess");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            "Preprocessing image dimensions"
        );

        check_rgb_buffer(pixels, width, height)?;

        let (scale, offset_x, offset_y) = self.resize_and_letterbox(pixels, width, height)?;

        let (w, h) = (self.input_size.0 as usize, self.input_size.1 as usize);
        let planar = to_planar(&self.letterboxed_buffer, w, h, self.normalization);
        let tensor = Array::from_shape_vec(IxDyn(&[1, 3, h, w]), planar)?;

        Ok(PreprocessResult {
            tensor,
            scale,
            offset_x,
            offset_y,
        })
    }

    fn resize_and_letterbox(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<(f32, f32, f32)> {
        let scale =
            (self.input_size.0 as f32 / width as f32).min(self.input_size.1 as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).clamp(1, self.input_size.0);
        let new_height = ((height as f32 * scale) as u32).clamp(1, self.input_size.1);

        let offset_x = (self.input_size.0 - new_width) / 2;
        let offset_y = (self.input_size.1 - new_height) / 2;

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;

        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.letterboxed_buffer.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let stride = self.input_size.0 * 3;
        let row_len = (new_width * 3) as usize;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            self.letterboxed_buffer[dst_row..dst_row + row_len]
                .copy_from_slice(&resized_data[src_row..src_row + row_len]);
        }

        Ok((scale, offset_x as f32, offset_y as f32))
    }
}

impl Default for LetterboxPreProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE, Normalization::Unit)
    }
}

impl Preprocess for LetterboxPreProcessor {
    fn preprocess(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        self.preprocess_from_u8_slice(pixels, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_preprocessing_shape() {
        let pixels = vec![
            255, 0, 0, // Red pixel
            0, 255, 0, // Green pixel
            0, 0, 255, // Blue pixel
            255, 255, 255, // White pixel
        ];

        let mut preprocessor = LetterboxPreProcessor::default();
        let result = preprocessor.preprocess(&pixels, 2, 2).unwrap();

        assert_eq!(result.tensor.shape(), &[1, 3, 640, 640]);
    }

    #[test]
    fn test_buffer_size_mismatch_detection() {
        let pixels = vec![0u8; 200]; // Wrong size for 10x10

        let mut preprocessor = LetterboxPreProcessor::default();
        let result = preprocessor.preprocess(&pixels, 10, 10);

        assert!(result.is_err(), "Size mismatch should return error");
        assert!(result.unwrap_err().to_string().contains("mismatch"));
    }

    #[test]
    fn test_letterboxing_preserves_aspect_ratio() {
        let pixels = vec![128u8; 800 * 600 * 3];

        let mut preprocessor = LetterboxPreProcessor::new((512, 512), Normalization::Unit);
        let result = preprocessor.preprocess(&pixels, 800, 600).unwrap();

        // Scale = min(512/800, 512/600) = 0.64, resized to 512x384
        assert_eq!(result.scale, 0.64);
        assert_eq!(result.offset_x, 0.0, "X offset should be 0 for wide image");
        assert_eq!(result.offset_y, 64.0, "Y offset should center vertically");
        assert_eq!(result.tensor.shape(), &[1, 3, 512, 512]);
    }

    #[test]
    fn test_padding_uses_letterbox_color() {
        let pixels = vec![0u8; 800 * 600 * 3];

        let mut preprocessor = LetterboxPreProcessor::new((512, 512), Normalization::Unit);
        let result = preprocessor.preprocess(&pixels, 800, 600).unwrap();

        let pad = result.tensor[[0, 0, 10, 256]];
        let content = result.tensor[[0, 0, 256, 256]];
        assert!((pad - 114.0 / 255.0).abs() < 1e-6, "pad was {}", pad);
        assert_eq!(content, 0.0);
    }

    #[test]
    fn test_extreme_aspect_ratio_keeps_one_pixel_row() {
        let pixels = vec![200u8; 4000 * 3];

        let mut preprocessor = LetterboxPreProcessor::new((640, 640), Normalization::Unit);
        let result = preprocessor.preprocess(&pixels, 4000, 1);

        assert!(result.is_ok(), "thin images should still preprocess");
    }
}
