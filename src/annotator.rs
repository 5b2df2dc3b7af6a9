//! Burns hand overlays into frames.

use crate::{
    hand::{
        detection::PalmNetwork,
        landmark::{LandmarkNetwork, LandmarkResult},
        tracking::HandTracker,
    },
    image::Image,
    timer::{FpsCounter, Timer},
    viewer::Annotator,
};

/// The tracking backend driven by a [`HandAnnotator`].
///
/// [`HandTracker`] is the production implementation; the seam exists so the annotator's drawing
/// behavior can be tested without loading the networks.
pub trait Tracking {
    /// Processes a frame, updating the set of tracked hands.
    fn track(&mut self, frame: &Image);

    /// Returns the landmark estimates of all currently tracked hands, in frame coordinates.
    fn results(&self) -> Vec<&LandmarkResult>;

    /// Returns profiling timers of the tracking stages.
    fn timers(&self) -> Vec<&Timer> {
        Vec::new()
    }
}

impl Tracking for HandTracker {
    fn track(&mut self, frame: &Image) {
        HandTracker::track(self, frame);
    }

    fn results(&self) -> Vec<&LandmarkResult> {
        self.hands().collect()
    }

    fn timers(&self) -> Vec<&Timer> {
        HandTracker::timers(self).collect()
    }
}

/// Owns the hand tracking pipeline and draws its results onto frames.
///
/// The networks are loaded when the annotator is constructed and released when it is dropped;
/// there is no global detector state.
pub struct HandAnnotator<T = HandTracker> {
    tracker: T,
    t_track: Timer,
    fps: FpsCounter,
}

impl HandAnnotator {
    /// Loads the detection and landmark networks from the model directory.
    pub fn new(palm: PalmNetwork, landmark: LandmarkNetwork) -> anyhow::Result<Self> {
        Ok(Self::with_tracker(HandTracker::new(palm, landmark)?))
    }
}

impl<T: Tracking> HandAnnotator<T> {
    fn with_tracker(tracker: T) -> Self {
        Self {
            tracker,
            t_track: Timer::new("track"),
            fps: FpsCounter::new("tracking"),
        }
    }

    /// Runs hand tracking on `frame` and draws an overlay for every tracked hand.
    ///
    /// When no hands are found, the frame is left untouched.
    pub fn annotate_frame(&mut self, frame: &mut Image) {
        self.t_track.time(|| self.tracker.track(frame));
        for result in self.tracker.results() {
            result.draw(frame);
        }
        self.fps
            .tick_with([&self.t_track].into_iter().chain(self.tracker.timers()));
    }

    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        [&self.t_track].into_iter().chain(self.tracker.timers())
    }
}

impl<T: Tracking> Annotator for HandAnnotator<T> {
    fn annotate(&mut self, frame: &mut Image) {
        self.annotate_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        image::{Color, Resolution},
        landmark::Estimate,
    };

    use super::*;

    /// A [`Tracking`] impl that always reports the same set of hands.
    struct FixedTracker {
        results: Vec<LandmarkResult>,
        tracked_frames: u32,
    }

    impl FixedTracker {
        fn new(results: Vec<LandmarkResult>) -> Self {
            Self {
                results,
                tracked_frames: 0,
            }
        }
    }

    impl Tracking for FixedTracker {
        fn track(&mut self, _frame: &Image) {
            self.tracked_frames += 1;
        }

        fn results(&self) -> Vec<&LandmarkResult> {
            self.results.iter().collect()
        }
    }

    fn frame() -> Image {
        let data = (0..64 * 64 * 4).map(|i| i as u8).collect::<Vec<_>>();
        Image::from_rgba8(Resolution::new(64, 64), &data)
    }

    #[test]
    fn frame_without_hands_is_untouched() {
        let mut annotator = HandAnnotator::with_tracker(FixedTracker::new(Vec::new()));
        let mut frame = frame();
        let before = frame.data().to_vec();

        annotator.annotate_frame(&mut frame);

        assert_eq!(annotator.tracker.tracked_frames, 1);
        assert_eq!(frame.data(), &before[..]);
    }

    #[test]
    fn tracked_hands_are_drawn() {
        let mut result = LandmarkResult::default();
        // All landmarks default to the origin; move one away so the overlay covers some area.
        result.landmarks_mut().positions_mut()[0] = [40.0, 40.0, 0.0];
        let mut annotator = HandAnnotator::with_tracker(FixedTracker::new(vec![result]));
        let mut frame = frame();
        let before = frame.data().to_vec();

        annotator.annotate_frame(&mut frame);

        assert_ne!(frame.data(), &before[..]);
        // A landmark marker sits at the origin.
        assert_eq!(frame.get(0, 0), Color::RED);
    }
}
