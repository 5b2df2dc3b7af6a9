//! Object detection infrastructure.
//!
//! A [`Detector`] wraps a [`Network`] that scans the whole input image and produces a list of
//! [`Detection`]s: rough axis-aligned locations of objects, with per-object confidence and
//! optionally a few keypoints. Detections are typically refined by a landmark
//! [`Estimator`][crate::landmark::Estimator] afterwards.

pub mod nms;
pub mod ssd;

use crate::{
    image::{AsImageView, ImageView},
    nn::{Cnn, Outputs},
    rect::Rect,
    timer::Timer,
};

use nms::NonMaxSuppression;

/// Neural networks that detect objects of a single class.
pub trait Network: 'static {
    /// Returns the CNN to run on the (aspect-corrected) input image.
    fn cnn(&self) -> &Cnn;

    /// Extracts all detections with confidence above `threshold` from the network outputs.
    ///
    /// Detection coordinates are produced in the coordinate system of the network's input (see
    /// [`Cnn::input_resolution`]); the caller maps them back onto the full image.
    fn extract(&self, outputs: &Outputs, threshold: f32, detections: &mut Vec<Detection>);
}

/// Runs a detection network and post-processes its outputs.
pub struct Detector {
    network: Box<dyn Network>,
    detections: Vec<Detection>,
    threshold: f32,
    nms: NonMaxSuppression,
    t_infer: Timer,
    t_extract: Timer,
    t_nms: Timer,
}

impl Detector {
    pub const DEFAULT_THRESHOLD: f32 = 0.5;

    pub fn new<N: Network>(network: N) -> Self {
        Self {
            network: Box::new(network),
            detections: Vec::new(),
            threshold: Self::DEFAULT_THRESHOLD,
            nms: NonMaxSuppression::new(),
            t_infer: Timer::new("infer"),
            t_extract: Timer::new("extract"),
            t_nms: Timer::new("nms"),
        }
    }

    /// Returns the resolution the network operates at.
    pub fn input_resolution(&self) -> crate::image::Resolution {
        self.network.cnn().input_resolution()
    }

    /// Returns profiling timers for the detection stages.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_infer, &self.t_extract, &self.t_nms].into_iter()
    }

    /// Runs detection on an image, returning the filtered detections.
    ///
    /// Detection coordinates are in the coordinate system of the input image.
    pub fn detect<V: AsImageView>(&mut self, image: &V) -> &[Detection] {
        self.detect_impl(image.as_view())
    }

    fn detect_impl(&mut self, image: ImageView<'_>) -> &[Detection] {
        self.detections.clear();

        // Grow the image rect so that it matches the aspect ratio the network wants. The added
        // margin reads as transparent black.
        let input_res = self.network.cnn().input_resolution();
        let full_rect = Rect::from_top_left(0.0, 0.0, image.width() as f32, image.height() as f32);
        let view_rect = full_rect.grow_to_fit_aspect(input_res.aspect_ratio());
        let view = image.view(view_rect);

        let outputs = self
            .t_infer
            .time(|| self.network.cnn().estimate(&view))
            .unwrap();
        self.t_extract
            .time(|| self.network.extract(&outputs, self.threshold, &mut self.detections));
        self.detections = self.t_nms.time(|| self.nms.process(&mut self.detections));

        // Map detections from network input coordinates back onto the image.
        let scale = view_rect.width() / input_res.width() as f32;
        for det in &mut self.detections {
            det.rect = Rect::from_center(
                det.rect.x_center() * scale + view_rect.x(),
                det.rect.y_center() * scale + view_rect.y(),
                det.rect.width() * scale,
                det.rect.height() * scale,
            );
            for kp in &mut det.keypoints {
                kp.x = kp.x * scale + view_rect.x();
                kp.y = kp.y * scale + view_rect.y();
            }
        }

        &self.detections
    }
}

/// A detected object.
#[derive(Debug, Clone)]
pub struct Detection {
    pub(crate) confidence: f32,
    pub(crate) rect: Rect,
    pub(crate) keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn new(confidence: f32, rect: Rect) -> Self {
        Self {
            confidence,
            rect,
            keypoints: Vec::new(),
        }
    }

    pub fn with_keypoints(confidence: f32, rect: Rect, keypoints: Vec<Keypoint>) -> Self {
        Self {
            confidence,
            rect,
            keypoints,
        }
    }

    /// Confidence value of the detection (higher is more likely to be a real object).
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Axis-aligned rectangle around the detected object.
    pub fn bounding_rect(&self) -> Rect {
        self.rect
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }
}

/// A single point of interest inside a [`Detection`].
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}
