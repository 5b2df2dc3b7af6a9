//! Iterator utilities.

use std::iter::Zip;

/// A variant of [`Iterator::zip`] that panics if the iterators have different lengths.
///
/// Since [`Iterator::zip`] stops yielding elements when either of the two iterators is exhausted,
/// silently ignoring the rest, it can hide bugs when both iterators are expected to always have
/// the same number of elements. This function can be used in that situation.
#[track_caller]
pub fn zip_exact<A, B>(a: A, b: B) -> Zip<A::IntoIter, B::IntoIter>
where
    A: IntoIterator,
    B: IntoIterator,
    A::IntoIter: ExactSizeIterator,
    B::IntoIter: ExactSizeIterator,
{
    let a = a.into_iter();
    let b = b.into_iter();

    assert_eq!(
        a.len(),
        b.len(),
        "`zip_exact` called on iterators of different lengths",
    );

    a.zip(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zips_equal_lengths() {
        let pairs: Vec<_> = zip_exact([1, 2], ["a", "b"]).collect();
        assert_eq!(pairs, [(1, "a"), (2, "b")]);
    }

    #[test]
    #[should_panic]
    fn panics_on_length_mismatch() {
        let _ = zip_exact([1, 2, 3], ["a", "b"]);
    }
}
