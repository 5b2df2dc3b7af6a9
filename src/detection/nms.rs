//! Non-maximum suppression.

use std::mem;

use crate::iter::zip_exact;
use crate::num::TotalF32;
use crate::rect::Rect;

use super::{Detection, Keypoint};

/// How overlapping detections are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Only the detection with the highest confidence in each overlapping cluster is kept.
    Remove,

    /// Each cluster is merged into a single detection by averaging rectangles and keypoints,
    /// weighted by confidence.
    ///
    /// This is what the MediaPipe palm detection pipeline uses and tends to produce more stable
    /// results than [`SuppressionMode::Remove`].
    Average,
}

/// De-duplicates overlapping detections.
pub struct NonMaxSuppression {
    mode: SuppressionMode,
    iou_thresh: f32,
}

impl NonMaxSuppression {
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            mode: SuppressionMode::Average,
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        }
    }

    pub fn set_mode(&mut self, mode: SuppressionMode) -> &mut Self {
        self.mode = mode;
        self
    }

    pub fn set_iou_threshold(&mut self, iou_thresh: f32) -> &mut Self {
        self.iou_thresh = iou_thresh;
        self
    }

    /// Performs non-maximum suppression on `detections`, returning the surviving detections.
    ///
    /// `detections` is drained by this operation.
    pub fn process(&mut self, detections: &mut Vec<Detection>) -> Vec<Detection> {
        let mut remaining = mem::take(detections);
        remaining.sort_unstable_by_key(|det| TotalF32(det.confidence));

        let mut out = Vec::new();
        // Highest confidence detection seeds each cluster.
        while let Some(seed) = remaining.pop() {
            let (cluster, rest) = remaining
                .into_iter()
                .partition::<Vec<_>, _>(|det| seed.rect.iou(&det.rect) >= self.iou_thresh);
            remaining = rest;

            match self.mode {
                SuppressionMode::Remove => out.push(seed),
                SuppressionMode::Average => out.push(average(&seed, &cluster)),
            }
        }

        out
    }
}

impl Default for NonMaxSuppression {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges a cluster of overlapping detections into one, weighted by confidence.
///
/// The merged detection keeps the seed's confidence value.
fn average(seed: &Detection, cluster: &[Detection]) -> Detection {
    let mut total_weight = seed.confidence;
    let mut acc = RectAcc::new(&seed.rect, seed.confidence);
    let mut keypoints: Vec<[f32; 2]> = seed
        .keypoints
        .iter()
        .map(|kp| [kp.x * seed.confidence, kp.y * seed.confidence])
        .collect();

    for det in cluster {
        total_weight += det.confidence;
        acc.add(&det.rect, det.confidence);
        for (sum, kp) in zip_exact(&mut keypoints, &det.keypoints) {
            sum[0] += kp.x * det.confidence;
            sum[1] += kp.y * det.confidence;
        }
    }

    Detection::with_keypoints(
        seed.confidence,
        acc.finish(total_weight),
        keypoints
            .iter()
            .map(|[x, y]| Keypoint::new(x / total_weight, y / total_weight))
            .collect(),
    )
}

struct RectAcc {
    xc: f32,
    yc: f32,
    w: f32,
    h: f32,
}

impl RectAcc {
    fn new(rect: &Rect, weight: f32) -> Self {
        Self {
            xc: rect.x_center() * weight,
            yc: rect.y_center() * weight,
            w: rect.width() * weight,
            h: rect.height() * weight,
        }
    }

    fn add(&mut self, rect: &Rect, weight: f32) {
        self.xc += rect.x_center() * weight;
        self.yc += rect.y_center() * weight;
        self.w += rect.width() * weight;
        self.h += rect.height() * weight;
    }

    fn finish(&self, total_weight: f32) -> Rect {
        Rect::from_center(
            self.xc / total_weight,
            self.yc / total_weight,
            self.w / total_weight,
            self.h / total_weight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(confidence: f32, rect: Rect) -> Detection {
        Detection::new(confidence, rect)
    }

    #[test]
    fn remove_keeps_cluster_maximum() {
        let mut nms = NonMaxSuppression::new();
        nms.set_mode(SuppressionMode::Remove);

        let mut dets = vec![
            det(0.4, Rect::from_top_left(0.0, 0.0, 10.0, 10.0)),
            det(0.9, Rect::from_top_left(1.0, 1.0, 10.0, 10.0)),
            det(0.5, Rect::from_top_left(100.0, 100.0, 10.0, 10.0)),
        ];
        let mut out = nms.process(&mut dets);
        out.sort_unstable_by_key(|d| TotalF32(d.confidence()));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].confidence(), 0.5);
        assert_eq!(out[1].confidence(), 0.9);
        assert!(dets.is_empty());
    }

    #[test]
    fn average_blends_rects() {
        let mut nms = NonMaxSuppression::new();

        let mut dets = vec![
            det(1.0, Rect::from_center(0.0, 0.0, 2.0, 2.0)),
            det(1.0, Rect::from_center(1.0, 1.0, 2.0, 2.0)),
        ];
        let out = nms.process(&mut dets);

        assert_eq!(out.len(), 1);
        let rect = out[0].bounding_rect();
        assert_eq!(rect.center(), [0.5, 0.5]);
        assert_eq!(rect.width(), 2.0);
        assert_eq!(rect.height(), 2.0);
    }

    #[test]
    fn average_weighs_by_confidence() {
        let mut nms = NonMaxSuppression::new();

        let mut dets = vec![
            det(3.0, Rect::from_center(0.0, 0.0, 2.0, 2.0)),
            det(1.0, Rect::from_center(4.0, 0.0, 2.0, 2.0)),
        ];
        // Force a single cluster.
        nms.set_iou_threshold(0.0);
        let out = nms.process(&mut dets);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bounding_rect().center(), [1.0, 0.0]);
        assert_eq!(out[0].confidence(), 3.0);
    }
}
