//! Palm detection.
//!
//! Runs one of the pretrained MediaPipe palm detection networks. Palms are easier to detect
//! reliably than whole hands (fingers deform too much); the detected palm rectangle is grown to a
//! hand-sized region of interest by the [tracker][crate::hand::tracking].

use once_cell::sync::Lazy;

use crate::{
    detection::{
        ssd::{Anchors, LayerInfo},
        Detection, Detector, Keypoint, Network,
    },
    image::{AsImageView, Resolution},
    nn::{model_path, Cnn, CnnInputShape, ColorMapper, NeuralNetwork, Outputs},
    num::sigmoid,
    rect::Rect,
    timer::Timer,
};

/// Which pretrained palm detection network to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PalmNetwork {
    /// A smaller, faster network with reduced detection quality.
    Lite,
    /// A bigger network with better detection quality.
    Full,
}

impl PalmNetwork {
    fn file_name(&self) -> &'static str {
        match self {
            Self::Lite => "palm_detection_lite.onnx",
            Self::Full => "palm_detection_full.onnx",
        }
    }
}

/// Detects palms in an input image.
pub struct PalmDetector {
    detector: Detector,
}

impl PalmDetector {
    /// Loads a palm detection network from the model directory.
    pub fn new(network: PalmNetwork) -> anyhow::Result<Self> {
        let nn = NeuralNetwork::from_path(model_path(network.file_name()))?.load()?;
        let cnn = Cnn::new(nn, CnnInputShape::NCHW, ColorMapper::linear(0.0..=1.0))?;
        Ok(Self {
            detector: Detector::new(PalmDetectionNetwork { cnn }),
        })
    }

    pub fn input_resolution(&self) -> Resolution {
        self.detector.input_resolution()
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        self.detector.timers()
    }

    /// Detects palms, returning their locations in `image`'s coordinate system.
    pub fn detect<V: AsImageView>(&mut self, image: &V) -> &[Detection] {
        self.detector.detect(image)
    }
}

/// Number of values the network predicts per anchor: box center and size, plus X/Y for each of
/// the 7 palm keypoints (wrist, the 4 non-thumb MCPs, thumb CMC and MCP).
const BOX_PARAMS: usize = 4 + 7 * 2;

/// Anchor layout shared by the lite and full palm detection networks (192x192 input).
static ANCHORS: Lazy<Anchors> =
    Lazy::new(|| Anchors::calculate(&[LayerInfo::new(2, 24, 24), LayerInfo::new(6, 12, 12)]));

struct PalmDetectionNetwork {
    cnn: Cnn,
}

impl Network for PalmDetectionNetwork {
    fn cnn(&self) -> &Cnn {
        &self.cnn
    }

    fn extract(&self, outputs: &Outputs, threshold: f32, detections: &mut Vec<Detection>) {
        let input_res = self.cnn.input_resolution();
        let (iw, ih) = (input_res.width() as f32, input_res.height() as f32);

        let boxes = outputs[0].index(0);
        let confidences = outputs[1].index(0);
        assert_eq!(
            boxes.shape()[0],
            ANCHORS.anchor_count(),
            "network predicts a different number of boxes than there are anchors",
        );

        for (anchor, (box_params, confidence)) in ANCHORS
            .iter()
            .zip(boxes.iter().zip(confidences.iter()))
        {
            let confidence = sigmoid(confidence.as_singular());
            if confidence < threshold {
                continue;
            }

            // Box predictions are offsets in input pixels, relative to the anchor position.
            let p = box_params.as_slice();
            assert_eq!(p.len(), BOX_PARAMS);
            let rect = Rect::from_center(
                p[0] + anchor.x_center() * iw,
                p[1] + anchor.y_center() * ih,
                p[2],
                p[3],
            );
            let keypoints = p[4..]
                .chunks_exact(2)
                .map(|kp| {
                    Keypoint::new(
                        kp[0] + anchor.x_center() * iw,
                        kp[1] + anchor.y_center() * ih,
                    )
                })
                .collect();
            detections.push(Detection::with_keypoints(confidence, rect, keypoints));
        }
    }
}
