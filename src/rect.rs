//! Axis-aligned rectangles.

use std::ops::RangeInclusive;

use crate::image::AspectRatio;

/// An axis-aligned rectangle, stored as its minimum and maximum corners.
///
/// Coordinates are `f32`s and may refer to pixels of an image or to any other coordinate system,
/// depending on context. Storing the corners keeps [`Rect::bounding`] exact: the returned edges
/// are the input coordinates themselves, not values recomputed from a center and size.
#[derive(Clone, Copy, PartialEq)]
pub struct Rect {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

impl Rect {
    /// Creates a rectangle from its center position and size.
    pub fn from_center(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            x_min: x_center - width / 2.0,
            y_min: y_center - height / 2.0,
            x_max: x_center + width / 2.0,
            y_max: y_center + height / 2.0,
        }
    }

    /// Creates a rectangle from the position of its top left corner and its size.
    pub fn from_top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x_min: x,
            y_min: y,
            x_max: x + width,
            y_max: y + height,
        }
    }

    /// Creates a rectangle from the ranges it spans on the X and Y axes.
    pub fn from_ranges(x: RangeInclusive<f32>, y: RangeInclusive<f32>) -> Self {
        Self {
            x_min: *x.start(),
            y_min: *y.start(),
            x_max: *x.end(),
            y_max: *y.end(),
        }
    }

    /// Computes the (tight) bounding rectangle of a set of points.
    ///
    /// Returns [`None`] when `points` is empty. The result contains every input point and does not
    /// depend on the order in which the points are yielded.
    pub fn bounding<I: IntoIterator<Item = [f32; 2]>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let [mut min_x, mut min_y] = points.next()?;
        let (mut max_x, mut max_y) = (min_x, min_y);
        for [x, y] in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::from_ranges(min_x..=max_x, min_y..=max_y))
    }

    #[inline]
    pub fn x_center(&self) -> f32 {
        (self.x_min + self.x_max) / 2.0
    }

    #[inline]
    pub fn y_center(&self) -> f32 {
        (self.y_min + self.y_max) / 2.0
    }

    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [self.x_center(), self.y_center()]
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Returns the X coordinate of the left edge.
    #[inline]
    pub fn x(&self) -> f32 {
        self.x_min
    }

    /// Returns the Y coordinate of the top edge.
    #[inline]
    pub fn y(&self) -> f32 {
        self.y_min
    }

    pub fn x_range(&self) -> RangeInclusive<f32> {
        self.x_min..=self.x_max
    }

    pub fn y_range(&self) -> RangeInclusive<f32> {
        self.y_min..=self.y_max
    }

    /// Grows this rectangle on every side by an amount relative to the rectangle's size.
    ///
    /// `amount` is a fraction of the width (for the left/right edges) and height (for the
    /// top/bottom edges). `grow_rel(0.5)` doubles the extent on each axis.
    #[must_use]
    pub fn grow_rel(&self, amount: f32) -> Self {
        let (dx, dy) = (self.width() * amount, self.height() * amount);
        Self {
            x_min: self.x_min - dx,
            y_min: self.y_min - dy,
            x_max: self.x_max + dx,
            y_max: self.y_max + dy,
        }
    }

    /// Grows this rectangle symmetrically on one axis so that it matches `target_aspect`.
    ///
    /// The rectangle is only ever enlarged, never shrunk, and its center stays put.
    #[must_use]
    pub fn grow_to_fit_aspect(&self, target_aspect: AspectRatio) -> Self {
        let ratio = target_aspect.as_f32();
        if self.width() / self.height() >= ratio {
            let height = self.width() / ratio;
            Self::from_center(self.x_center(), self.y_center(), self.width(), height)
        } else {
            let width = self.height() * ratio;
            Self::from_center(self.x_center(), self.y_center(), width, self.height())
        }
    }

    fn area(&self) -> f32 {
        self.width() * self.height()
    }

    fn intersection_area(&self, other: &Self) -> f32 {
        let x = self.x_max.min(other.x_max) - self.x_min.max(other.x_min);
        let y = self.y_max.min(other.y_max) - self.y_min.max(other.y_min);
        if x <= 0.0 || y <= 0.0 {
            return 0.0;
        }
        x * y
    }

    /// Computes the intersection-over-union of `self` and `other`.
    ///
    /// Returns 0.0 when the rectangles do not overlap, 1.0 when they are identical.
    pub fn iou(&self, other: &Self) -> f32 {
        let intersection = self.intersection_area(other);
        if intersection == 0.0 {
            return 0.0;
        }
        intersection / (self.area() + other.area() - intersection)
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rect @ ({},{}), size {}x{}",
            self.x_min,
            self.y_min,
            self.width(),
            self.height(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_encloses_all_points() {
        let points = [[0.3, 0.5], [0.7, 0.4], [0.1, 0.9], [0.5, 0.5]];
        let rect = Rect::bounding(points).unwrap();
        for [x, y] in points {
            assert!(rect.x_range().contains(&x), "{x} outside {rect:?}");
            assert!(rect.y_range().contains(&y), "{y} outside {rect:?}");
        }
        assert_eq!(rect.x(), 0.1);
        assert_eq!(rect.y(), 0.4);
        assert_eq!(*rect.x_range().end(), 0.7);
        assert_eq!(*rect.y_range().end(), 0.9);
    }

    #[test]
    fn bounding_edges_are_exact() {
        // Coordinates like 0.7 are not exactly representable, so round-tripping the edges
        // through a center+size representation would put them a ulp off and push the extreme
        // points outside the rect. The stored edges must be bit-identical to the inputs.
        let points = [[0.3f32, 0.5], [0.7, 0.4]];
        let rect = Rect::bounding(points).unwrap();
        assert_eq!(rect.x().to_bits(), 0.3f32.to_bits());
        assert_eq!(rect.x_range().end().to_bits(), 0.7f32.to_bits());
        assert_eq!(rect.y().to_bits(), 0.4f32.to_bits());
        assert_eq!(rect.y_range().end().to_bits(), 0.5f32.to_bits());
        assert!(rect.x_range().contains(&0.7));
    }

    #[test]
    fn bounding_is_permutation_invariant() {
        let points = [[4.0, -1.0], [-2.0, 7.5], [0.0, 0.0], [9.0, 3.0]];
        let expected = Rect::bounding(points).unwrap();
        // Cycle through a few orderings; every one must produce the same rect.
        let mut rotated = points;
        for _ in 0..points.len() {
            rotated.rotate_left(1);
            assert_eq!(Rect::bounding(rotated), Some(expected));
        }
        let mut reversed = points;
        reversed.reverse();
        assert_eq!(Rect::bounding(reversed), Some(expected));
    }

    #[test]
    fn bounding_of_nothing() {
        assert_eq!(Rect::bounding([]), None);
    }

    #[test]
    fn bounding_of_single_point() {
        let rect = Rect::bounding([[2.0, 3.0]]).unwrap();
        assert_eq!(rect.center(), [2.0, 3.0]);
        assert_eq!(rect.width(), 0.0);
        assert_eq!(rect.height(), 0.0);
    }

    #[test]
    fn iou_disjoint_and_identical() {
        let a = Rect::from_top_left(0.0, 0.0, 2.0, 2.0);
        let b = Rect::from_top_left(10.0, 10.0, 2.0, 2.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn iou_half_overlap() {
        let a = Rect::from_top_left(0.0, 0.0, 2.0, 1.0);
        let b = Rect::from_top_left(1.0, 0.0, 2.0, 1.0);
        // intersection 1, union 3
        approx::assert_relative_eq!(a.iou(&b), 1.0 / 3.0);
    }

    #[test]
    fn grow_to_fit_aspect_only_grows() {
        let rect = Rect::from_center(5.0, 5.0, 2.0, 2.0);
        let wide = rect.grow_to_fit_aspect(AspectRatio::new(2, 1));
        assert_eq!(wide.width(), 4.0);
        assert_eq!(wide.height(), 2.0);
        assert_eq!(wide.center(), rect.center());

        let tall = rect.grow_to_fit_aspect(AspectRatio::new(1, 2));
        assert_eq!(tall.width(), 2.0);
        assert_eq!(tall.height(), 4.0);
    }
}
