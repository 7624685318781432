use crate::detection::Detection;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.80;
pub const DEFAULT_FALLBACK_TOP_K: usize = 10;

/// How raw detections are narrowed down before they are returned.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectionPolicy {
    /// Detections strictly above this confidence are kept.
    pub min_confidence: f32,
    /// When nothing clears `min_confidence`, keep this many of the best instead.
    pub fallback_top_k: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            fallback_top_k: DEFAULT_FALLBACK_TOP_K,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub detections: Vec<Detection>,
    pub highest_confidence: Option<Detection>,
}

impl SelectionPolicy {
    /// Pick the best raw detection, then filter.
    ///
    /// The returned list is ordered by descending confidence; ties keep model
    /// output order.
    pub fn select(&self, raw: Vec<Detection>) -> Selection {
        let highest_confidence = raw
            .iter()
            .reduce(|best, d| if d.confidence > best.confidence { d } else { best })
            .cloned();

        let mut ranked = raw;
        ranked.sort_by(by_confidence_desc);

        let above = ranked
            .iter()
            .take_while(|d| d.confidence > self.min_confidence)
            .count();

        if above > 0 {
            ranked.truncate(above);
        } else {
            tracing::debug!(
                min_confidence = self.min_confidence,
                top_k = self.fallback_top_k,
                "No detection above threshold, falling back to top-k"
            );
            ranked.truncate(self.fallback_top_k);
        }

        Selection {
            detections: ranked,
            highest_confidence,
        }
    }
}

fn by_confidence_desc(a: &Detection, b: &Detection) -> Ordering {
    b.confidence.total_cmp(&a.confidence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: [0, 0, 10, 10],
        }
    }

    fn confidences(selection: &Selection) -> Vec<f32> {
        selection.detections.iter().map(|d| d.confidence).collect()
    }

    #[test]
    fn test_keeps_only_detections_above_threshold() {
        let selection = SelectionPolicy::default().select(vec![
            det("a", 0.5),
            det("b", 0.95),
            det("c", 0.80), // exactly at threshold, dropped
            det("d", 0.81),
        ]);

        assert_eq!(confidences(&selection), vec![0.95, 0.81]);
        assert!(selection.detections.iter().all(|d| d.confidence > 0.80));
    }

    #[test]
    fn test_falls_back_to_top_ten_by_confidence() {
        let raw: Vec<Detection> = (0..15).map(|i| det("x", i as f32 / 20.0)).collect();

        let selection = SelectionPolicy::default().select(raw);

        assert_eq!(selection.detections.len(), 10);
        let got = confidences(&selection);
        let mut sorted = got.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(got, sorted, "fallback should be ordered by descending confidence");
        assert_eq!(got[0], 0.70);
        assert_eq!(got[9], 0.25);
    }

    #[test]
    fn test_fallback_with_fewer_than_ten() {
        let selection = SelectionPolicy::default().select(vec![det("a", 0.2), det("b", 0.6)]);

        assert_eq!(confidences(&selection), vec![0.6, 0.2]);
    }

    #[test]
    fn test_highest_confidence_is_taken_before_filtering() {
        let selection = SelectionPolicy::default().select(vec![
            det("low", 0.3),
            det("best", 0.99),
            det("mid", 0.85),
        ]);

        assert_eq!(selection.highest_confidence.unwrap().label, "best");
    }

    #[test]
    fn test_highest_confidence_tie_keeps_first() {
        let selection = SelectionPolicy::default().select(vec![det("first", 0.9), det("second", 0.9)]);

        assert_eq!(selection.highest_confidence.unwrap().label, "first");
        assert_eq!(selection.detections[0].label, "first");
    }

    #[test]
    fn test_empty_input() {
        let selection = SelectionPolicy::default().select(Vec::new());

        assert!(selection.detections.is_empty());
        assert!(selection.highest_confidence.is_none());
    }

    #[test]
    fn test_custom_policy() {
        let policy = SelectionPolicy {
            min_confidence: 0.5,
            fallback_top_k: 1,
        };

        let above = policy.select(vec![det("a", 0.6), det("b", 0.7)]);
        assert_eq!(confidences(&above), vec![0.7, 0.6]);

        let fallback = policy.select(vec![det("a", 0.1), det("b", 0.3)]);
        assert_eq!(confidences(&fallback), vec![0.3]);
    }
}
