use serde::{Deserialize, Serialize};

/// One predicted object, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in source image pixels, `x1 <= x2`, `y1 <= y2`
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
}

impl Detection {
    /// Build a detection from floating point corners in source pixel space.
    ///
    /// Corners are clamped to the image, truncated to whole pixels and put in
    /// order; confidence is clamped into `[0, 1]`.
    pub fn from_corners(
        label: String,
        confidence: f32,
        corners: (f32, f32, f32, f32),
        image_size: (u32, u32),
    ) -> Self {
        let (x1, y1, x2, y2) = corners;
        let (width, height) = (image_size.0 as f32, image_size.1 as f32);

        let x1 = clamp_pixel(x1, width);
        let y1 = clamp_pixel(y1, height);
        let x2 = clamp_pixel(x2, width);
        let y2 = clamp_pixel(y2, height);

        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            bbox: [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)],
        }
    }
}

#[inline]
fn clamp_pixel(value: f32, limit: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    value.max(0.0).min(limit) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_truncated_like_int_cast() {
        let det = Detection::from_corners("cat".into(), 0.5, (10.9, 20.2, 30.7, 40.99), (100, 100));
        assert_eq!(det.bbox, [10, 20, 30, 40]);
    }

    #[test]
    fn test_corners_are_clamped_and_ordered() {
        let det = Detection::from_corners("cat".into(), 1.2, (150.0, -5.0, 20.0, 80.0), (100, 60));
        assert_eq!(det.bbox, [20, 0, 100, 60]);
        assert_eq!(det.confidence, 1.0);
    }

    #[test]
    fn test_nan_corner_collapses_to_origin() {
        let det = Detection::from_corners("cat".into(), 0.3, (f32::NAN, 5.0, 10.0, 9.0), (20, 20));
        assert_eq!(det.bbox, [0, 5, 10, 9]);
    }

    #[test]
    fn test_serializes_box_field_name() {
        let det = Detection {
            label: "dog".into(),
            confidence: 0.5,
            bbox: [1, 2, 3, 4],
        };
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"label": "dog", "confidence": 0.5, "box": [1, 2, 3, 4]})
        );
    }
}
