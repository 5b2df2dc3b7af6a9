//! Landmark estimation framework.
//!
//! Landmark networks take a closely cropped view of the object of interest and output a fixed
//! number of 3D positions. [`Estimator`] runs such a network; [`RoiTracker`] feeds it with a
//! region of interest that follows the object from frame to frame, so that the (more expensive)
//! detector only has to run occasionally.

use crate::{
    image::{AsImageView, ImageView},
    nn::{Cnn, Outputs},
    rect::Rect,
    timer::Timer,
};

/// A fixed-size list of 3D landmark positions.
///
/// The interpretation of the coordinates depends on where the landmarks come from; estimation
/// maps X and Y into the coordinate system of the input view.
#[derive(Debug, Clone)]
pub struct Landmarks {
    positions: Box<[[f32; 3]]>,
}

impl Landmarks {
    pub fn new(count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; count].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        self.positions[index]
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.positions
    }

    /// Applies a transformation to every landmark position.
    pub fn map_positions(&mut self, mut f: impl FnMut([f32; 3]) -> [f32; 3]) {
        for pos in &mut *self.positions {
            *pos = f(*pos);
        }
    }
}

/// Network estimates that contain landmarks.
pub trait Estimate: Default {
    fn landmarks_mut(&mut self) -> &mut Landmarks;
}

/// Network estimates that contain an object presence confidence.
pub trait Confidence {
    /// Confidence that the object of interest is present and in frame, typically in range
    /// `0.0..=1.0`.
    fn confidence(&self) -> f32;
}

/// Neural networks that estimate landmarks from a cropped object view.
pub trait Network: 'static {
    type Output: Estimate;

    fn cnn(&self) -> &Cnn;

    /// Fills `estimate` from the network outputs.
    ///
    /// Landmark coordinates are produced in the coordinate system of the network's input; the
    /// caller maps them back onto the input view.
    fn extract(&self, outputs: &Outputs, estimate: &mut Self::Output);
}

/// Runs a landmark [`Network`] and maps its outputs back onto the input.
pub struct Estimator<E> {
    network: Box<dyn Network<Output = E>>,
    output: E,
    t_infer: Timer,
    t_extract: Timer,
}

impl<E: Estimate + 'static> Estimator<E> {
    pub fn new<N: Network<Output = E>>(network: N) -> Self {
        Self {
            network: Box::new(network),
            output: E::default(),
            t_infer: Timer::new("infer"),
            t_extract: Timer::new("extract"),
        }
    }

    pub fn input_resolution(&self) -> crate::image::Resolution {
        self.network.cnn().input_resolution()
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_infer, &self.t_extract].into_iter()
    }

    /// Runs landmark estimation on a view of the object.
    ///
    /// Landmark X/Y coordinates in the result are in the view's coordinate system.
    pub fn estimate<V: AsImageView>(&mut self, image: &V) -> &mut E {
        self.estimate_impl(image.as_view())
    }

    fn estimate_impl(&mut self, image: ImageView<'_>) -> &mut E {
        let input_res = self.network.cnn().input_resolution();
        let full_rect = Rect::from_top_left(0.0, 0.0, image.width() as f32, image.height() as f32);
        let view_rect = full_rect.grow_to_fit_aspect(input_res.aspect_ratio());
        let view = image.view(view_rect);

        let outputs = self
            .t_infer
            .time(|| self.network.cnn().estimate(&view))
            .unwrap();
        self.t_extract
            .time(|| self.network.extract(&outputs, &mut self.output));

        let scale = view_rect.width() / input_res.width() as f32;
        self.output.landmarks_mut().map_positions(|[x, y, z]| {
            [
                x * scale + view_rect.x(),
                y * scale + view_rect.y(),
                z * scale,
            ]
        });

        &mut self.output
    }
}

/// Tracks an object's region of interest across frames.
///
/// Once a RoI is set (from a detection), each [`RoiTracker::track`] call runs the landmark
/// network on that region, re-centers the RoI on the resulting landmarks, and reports a loss
/// (clearing the RoI) when the network's presence confidence drops too low.
pub struct RoiTracker<E> {
    estimator: Estimator<E>,
    roi: Option<Rect>,
    loss_thresh: f32,
    roi_padding: f32,
}

impl<E: Estimate + Confidence + 'static> RoiTracker<E> {
    pub const DEFAULT_LOSS_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_ROI_PADDING: f32 = 0.3;

    pub fn new(estimator: Estimator<E>) -> Self {
        Self {
            estimator,
            roi: None,
            loss_thresh: Self::DEFAULT_LOSS_THRESHOLD,
            roi_padding: Self::DEFAULT_ROI_PADDING,
        }
    }

    /// Returns the current region of interest, if the object is being tracked.
    pub fn roi(&self) -> Option<Rect> {
        self.roi
    }

    /// Sets the region of interest to start (or re-start) tracking at.
    pub fn set_roi(&mut self, roi: Rect) {
        self.roi = Some(roi);
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        self.estimator.timers()
    }

    /// Advances tracking by one frame.
    ///
    /// Returns [`None`] (and clears the RoI) when no RoI is set or the object was lost. On
    /// success, landmark coordinates in the returned estimate are in `image`'s coordinate system.
    pub fn track(&mut self, image: &impl AsImageView) -> Option<&E> {
        let roi = self.roi?;

        let aspect = self.estimator.input_resolution().aspect_ratio();
        let view_rect = roi.grow_to_fit_aspect(aspect);
        let view = image.as_view().view(view_rect);
        let estimate = self.estimator.estimate(&view);

        if estimate.confidence() < self.loss_thresh {
            log::trace!(
                "object lost (confidence {} < {})",
                estimate.confidence(),
                self.loss_thresh,
            );
            self.roi = None;
            return None;
        }

        // Map landmarks from view coordinates into image coordinates, then re-center the RoI on
        // them for the next frame.
        estimate
            .landmarks_mut()
            .map_positions(|[x, y, z]| [x + view_rect.x(), y + view_rect.y(), z]);
        let landmark_rect = Rect::bounding(
            estimate.landmarks_mut().positions().iter().map(|&[x, y, _]| [x, y]),
        )
        .expect("landmark estimate is empty");
        self.roi = Some(landmark_rect.grow_rel(self.roi_padding));

        Some(&*estimate)
    }
}
