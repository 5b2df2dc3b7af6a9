//! Hand landmark estimation.
//!
//! Estimates the positions of 21 hand landmarks from a cropped view of a hand, along with a
//! presence confidence and the network's guess at which hand (left/right) is shown.

use std::fmt;

use crate::{
    image::{draw, AsImageViewMut, Color},
    iter::zip_exact,
    landmark::{Confidence, Estimate, Estimator, Landmarks, Network},
    nn::{model_path, Cnn, CnnInputShape, ColorMapper, NeuralNetwork, Outputs},
    rect::Rect,
};

/// Which pretrained hand landmark network to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkNetwork {
    /// A smaller, faster network with reduced landmark quality.
    Lite,
    /// A bigger network with better landmark quality.
    Full,
}

impl LandmarkNetwork {
    fn file_name(&self) -> &'static str {
        match self {
            Self::Lite => "hand_landmark_lite.onnx",
            Self::Full => "hand_landmark_full.onnx",
        }
    }

    /// Loads the network from the model directory.
    pub fn load(self) -> anyhow::Result<HandLandmarker> {
        let nn = NeuralNetwork::from_path(model_path(self.file_name()))?.load()?;
        let cnn = Cnn::new(nn, CnnInputShape::NCHW, ColorMapper::linear(0.0..=1.0))?;
        Ok(HandLandmarker {
            network: HandLandmarkNetwork { cnn },
        })
    }
}

/// A loaded hand landmark network.
///
/// Cheap to clone; every clone shares the loaded network. Each [`Estimator`] created from it has
/// its own output buffers, so one tracked hand can use one estimator each.
#[derive(Clone)]
pub struct HandLandmarker {
    network: HandLandmarkNetwork,
}

impl HandLandmarker {
    /// Creates a landmark estimator backed by this network.
    pub fn estimator(&self) -> Estimator<LandmarkResult> {
        Estimator::new(self.network.clone())
    }

    pub fn input_resolution(&self) -> crate::image::Resolution {
        self.network.cnn.input_resolution()
    }
}

#[derive(Clone)]
struct HandLandmarkNetwork {
    cnn: Cnn,
}

impl Network for HandLandmarkNetwork {
    type Output = LandmarkResult;

    fn cnn(&self) -> &Cnn {
        &self.cnn
    }

    fn extract(&self, outputs: &Outputs, estimate: &mut LandmarkResult) {
        // Outputs: landmarks in input pixels, presence confidence, handedness. The network also
        // predicts world-space landmarks as a 4th output, which goes unused here.
        let positions = outputs[0].index(0);
        estimate.presence = outputs[1].as_singular();
        estimate.raw_handedness = outputs[2].as_singular();

        let positions = positions.as_slice();
        for (pos, chunk) in zip_exact(
            estimate.landmarks.positions_mut(),
            positions.chunks_exact(3),
        ) {
            *pos = [chunk[0], chunk[1], chunk[2]];
        }
    }
}

/// Landmark estimate for a single hand.
#[derive(Debug, Clone)]
pub struct LandmarkResult {
    landmarks: Landmarks,
    presence: f32,
    raw_handedness: f32,
}

impl Default for LandmarkResult {
    fn default() -> Self {
        Self {
            landmarks: Landmarks::new(Self::NUM_LANDMARKS),
            presence: 0.0,
            raw_handedness: 0.0,
        }
    }
}

impl Estimate for LandmarkResult {
    fn landmarks_mut(&mut self) -> &mut Landmarks {
        &mut self.landmarks
    }
}

impl Confidence for LandmarkResult {
    fn confidence(&self) -> f32 {
        self.presence
    }
}

impl LandmarkResult {
    pub const NUM_LANDMARKS: usize = 21;

    pub fn landmarks(&self) -> &Landmarks {
        &self.landmarks
    }

    /// Returns the position of a landmark, in the coordinate system of the estimation input.
    pub fn landmark_position(&self, idx: LandmarkIdx) -> [f32; 3] {
        self.landmarks.position(idx as usize)
    }

    /// Confidence that a hand is actually present and fully visible in the input.
    pub fn presence(&self) -> f32 {
        self.presence
    }

    /// Which hand the displayed label claims this is.
    ///
    /// Computed with [`Handedness::classify`] from the wrist and thumb tip positions, not from
    /// the network's handedness output (see [`LandmarkResult::model_handedness`]).
    pub fn handedness(&self) -> Handedness {
        let [wrist_x, _, _] = self.landmark_position(LandmarkIdx::Wrist);
        let [thumb_x, _, _] = self.landmark_position(LandmarkIdx::ThumbTip);
        Handedness::classify(wrist_x, thumb_x)
    }

    /// The network's own handedness estimate.
    ///
    /// This tends to be more reliable than the wrist/thumb heuristic (which mislabels hands seen
    /// from the back, among other poses), but it is decoded for inspection only and does not feed
    /// the displayed label.
    pub fn model_handedness(&self) -> Handedness {
        if self.raw_handedness > 0.5 {
            Handedness::Right
        } else {
            Handedness::Left
        }
    }

    /// Computes the axis-aligned bounding rectangle of all 21 landmarks.
    pub fn bounding_rect(&self) -> Rect {
        Rect::bounding(self.landmarks.positions().iter().map(|&[x, y, _]| [x, y]))
            .expect("landmark list is never empty")
    }

    /// Draws the hand overlay: bounding box, skeleton, landmark markers, and handedness label.
    pub fn draw<I: AsImageViewMut>(&self, image: &mut I) {
        let rect = self.bounding_rect();
        draw::rect(image, rect).color(Color::GREEN).stroke_width(2);

        for &(a, b) in CONNECTIVITY {
            let [ax, ay, _] = self.landmark_position(a);
            let [bx, by, _] = self.landmark_position(b);
            draw::line(image, ax as i32, ay as i32, bx as i32, by as i32).color(Color::BLUE);
        }
        for &[x, y, _] in self.landmarks.positions() {
            draw::marker(image, x as i32, y as i32).color(Color::RED);
        }

        let label = format!("Hand: {}", self.handedness());
        draw::text(image, rect.x() as i32, rect.y() as i32 - 10, &label)
            .color(Color::GREEN)
            .align_left();
    }
}

/// Which hand a [`LandmarkResult`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Classifies handedness from the horizontal wrist and thumb tip positions.
    ///
    /// Returns [`Handedness::Right`] exactly when the wrist lies strictly to the left of the
    /// thumb tip; equal positions count as [`Handedness::Left`]. Both inputs must be in the same
    /// coordinate system; nothing else about it matters.
    pub fn classify(wrist_x: f32, thumb_tip_x: f32) -> Self {
        if wrist_x < thumb_tip_x {
            Self::Right
        } else {
            Self::Left
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "Left",
            Self::Right => "Right",
        })
    }
}

/// Names for the 21 hand landmarks, usable as indices.
///
/// MCP = metacarpophalangeal (base knuckle), PIP/DIP = proximal/distal interphalangeal,
/// IP = interphalangeal, CMC = carpometacarpal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Landmark pairs connected by skeleton lines.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Thumb
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index finger
        (Wrist, IndexFingerMcp),
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle finger
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring finger
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky
        (RingFingerMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

#[cfg(test)]
mod tests {
    use crate::image::Image;

    use super::*;

    #[test]
    fn classify_wrist_left_of_thumb() {
        assert_eq!(Handedness::classify(0.3, 0.7), Handedness::Right);
    }

    #[test]
    fn classify_wrist_right_of_thumb() {
        assert_eq!(Handedness::classify(0.7, 0.3), Handedness::Left);
    }

    #[test]
    fn classify_tie_is_left() {
        assert_eq!(Handedness::classify(0.5, 0.5), Handedness::Left);
    }

    #[test]
    fn connectivity_covers_all_landmarks() {
        let mut seen = [false; LandmarkResult::NUM_LANDMARKS];
        for &(a, b) in CONNECTIVITY {
            seen[a as usize] = true;
            seen[b as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "some landmarks have no skeleton line");
    }

    /// Builds a synthetic estimate for a hand in a 640x480 frame, with the wrist at normalized
    /// (0.3, 0.5) and the thumb tip at (0.7, 0.4).
    fn synthetic_hand() -> LandmarkResult {
        let mut result = LandmarkResult::default();
        result.presence = 1.0;
        let wrist = [0.3 * 640.0, 0.5 * 480.0, 0.0];
        let thumb_tip = [0.7 * 640.0, 0.4 * 480.0, 0.0];
        // All other landmarks sit halfway between the two, so the bounding box is determined by
        // the wrist and thumb tip alone.
        for pos in result.landmarks.positions_mut() {
            *pos = [
                (wrist[0] + thumb_tip[0]) / 2.0,
                (wrist[1] + thumb_tip[1]) / 2.0,
                0.0,
            ];
        }
        result.landmarks.positions_mut()[LandmarkIdx::Wrist as usize] = wrist;
        result.landmarks.positions_mut()[LandmarkIdx::ThumbTip as usize] = thumb_tip;
        result
    }

    #[test]
    fn synthetic_hand_is_labeled_right() {
        let result = synthetic_hand();
        assert_eq!(result.handedness(), Handedness::Right);

        let rect = result.bounding_rect();
        assert_eq!(rect.x(), 0.3 * 640.0);
        assert_eq!(*rect.x_range().end(), 0.7 * 640.0);
        assert_eq!(rect.y(), 0.4 * 480.0);
        assert_eq!(*rect.y_range().end(), 0.5 * 480.0);
    }

    #[test]
    fn draw_burns_overlay_into_frame() {
        let mut image = Image::new(640, 480);
        let result = synthetic_hand();
        result.draw(&mut image);

        // Bounding box corner in green, wrist marker in red.
        let rect = result.bounding_rect();
        assert_eq!(image.get(rect.x() as u32, rect.y() as u32), Color::GREEN);
        let [wx, wy, _] = result.landmark_position(LandmarkIdx::Wrist);
        assert_eq!(image.get(wx as u32, wy as u32), Color::RED);
    }
}
