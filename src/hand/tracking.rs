//! Multi-hand tracking.
//!
//! Combines palm detection and per-hand landmark estimation: palm detection runs only when there
//! is room for more hands (and a redetection interval has elapsed), while each already-tracked
//! hand is followed from frame to frame by a [`RoiTracker`] that only runs the much cheaper
//! landmark network. Everything runs synchronously on the caller's thread.

use std::time::{Duration, Instant};

use crate::{
    hand::{
        detection::{PalmDetector, PalmNetwork},
        landmark::{HandLandmarker, LandmarkNetwork, LandmarkResult},
    },
    image::AsImageView,
    landmark::RoiTracker,
    timer::Timer,
};

/// Identifies a tracked hand across frames (currently only surfaced in log output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HandId(u64);

/// Tracks up to [`HandTracker::MAX_HANDS`] hands across consecutive frames.
pub struct HandTracker {
    detector: PalmDetector,
    landmarker: HandLandmarker,
    hands: Vec<TrackedHand>,
    next_id: u64,
    next_detection: Instant,
    detection_interval: Duration,
    iou_thresh: f32,
}

impl HandTracker {
    /// At most this many hands are tracked at once.
    pub const MAX_HANDS: usize = 2;

    /// Interval between palm detector runs while there is capacity for more hands.
    pub const DEFAULT_REDETECT_INTERVAL: Duration = Duration::from_millis(300);

    /// Detections whose grown RoI overlaps an already-tracked hand by at least this much are
    /// assumed to *be* that hand and are ignored.
    pub const DEFAULT_IOU_THRESH: f32 = 0.3;

    /// How much a detected palm rectangle is grown to cover the whole hand.
    const ROI_GROWTH: f32 = 1.5;

    /// Loads the palm detection and hand landmark networks.
    pub fn new(palm: PalmNetwork, landmark: LandmarkNetwork) -> anyhow::Result<Self> {
        Ok(Self {
            detector: PalmDetector::new(palm)?,
            landmarker: landmark.load()?,
            hands: Vec::new(),
            next_id: 0,
            next_detection: Instant::now(),
            detection_interval: Self::DEFAULT_REDETECT_INTERVAL,
            iou_thresh: Self::DEFAULT_IOU_THRESH,
        })
    }

    /// Processes a frame, updating the set of tracked hands.
    pub fn track<V: AsImageView>(&mut self, image: &V) {
        // Advance tracking for known hands, dropping the ones that were lost.
        self.hands.retain_mut(|hand| match hand.tracker.track(image) {
            Some(estimate) => {
                hand.result = estimate.clone();
                true
            }
            None => {
                log::debug!("lost track of hand {:?}", hand.id);
                false
            }
        });

        let now = Instant::now();
        let run_detection = self.hands.len() < Self::MAX_HANDS
            && (self.hands.is_empty() || now >= self.next_detection);
        if run_detection {
            for detection in self.detector.detect(image) {
                if self.hands.len() >= Self::MAX_HANDS {
                    break;
                }

                let roi = detection.bounding_rect().grow_rel(Self::ROI_GROWTH);
                let tracked_already = self.hands.iter().any(|hand| {
                    hand.tracker
                        .roi()
                        .map_or(false, |r| r.iou(&roi) >= self.iou_thresh)
                });
                if tracked_already {
                    continue;
                }

                let mut tracker = RoiTracker::new(self.landmarker.estimator());
                tracker.set_roi(roi);
                // Run the landmark network right away; a false palm detection (or a hand that
                // left the frame) fails the presence check and is never tracked.
                let result = tracker.track(image).cloned();
                if let Some(result) = result {
                    let id = HandId(self.next_id);
                    self.next_id += 1;
                    log::debug!("tracking new hand {id:?} at {roi:?}");
                    self.hands.push(TrackedHand {
                        id,
                        tracker,
                        result,
                    });
                }
            }

            self.next_detection = now + self.detection_interval;
        }
    }

    /// Iterates over the landmark estimates of the hands tracked in the last processed frame,
    /// in frame coordinates.
    pub fn hands(&self) -> impl Iterator<Item = &LandmarkResult> {
        self.hands.iter().map(|hand| &hand.result)
    }

    /// Returns profiling timers of the palm detection stages.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> + '_ {
        self.detector.timers()
    }
}

struct TrackedHand {
    id: HandId,
    tracker: RoiTracker<LandmarkResult>,
    result: LandmarkResult,
}
