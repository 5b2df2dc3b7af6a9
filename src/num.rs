//! Utilities for numerics.

use std::cmp::Ordering;

/// Applies the standard sigmoid/logistic function to the input.
pub fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// An [`f32`] wrapper that implements [`Ord`] via [`f32::total_cmp`].
///
/// Useful as a sort key for confidence values, which are never NaN in practice but are still
/// `f32`s as far as the type system is concerned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalF32(pub f32);

impl Eq for TotalF32 {}

impl PartialOrd for TotalF32 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF32 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_range() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn total_f32_sorts() {
        let mut v = [TotalF32(1.0), TotalF32(-0.5), TotalF32(0.25)];
        v.sort();
        assert_eq!(v, [TotalF32(-0.5), TotalF32(0.25), TotalF32(1.0)]);
    }
}
