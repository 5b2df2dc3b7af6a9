//! Shape-checked tensors for network inputs and outputs.

use std::fmt;

use tinyvec::TinyVec;

/// An owned n-dimensional array of `f32`s.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    shape: TinyVec<[usize; 4]>,
    data: Box<[f32]>,
}

impl Tensor {
    /// Creates a tensor of the given shape from densely packed data in row-major order.
    ///
    /// # Panics
    ///
    /// Panics when `data` does not have exactly as many elements as `shape` requires.
    pub fn from_vec(shape: &[usize], data: Vec<f32>) -> Self {
        let expected = shape.iter().product::<usize>();
        assert_eq!(
            data.len(),
            expected,
            "tensor of shape {shape:?} needs {expected} elements, got {}",
            data.len(),
        );
        Self {
            shape: shape.iter().copied().collect(),
            data: data.into_boxed_slice(),
        }
    }

    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            data: &self.data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Indexes the leading dimension, returning a view of rank one less.
    pub fn index(&self, index: usize) -> TensorView<'_> {
        self.view().index(index)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the single element of a tensor that holds exactly one value (of any rank).
    pub fn as_singular(&self) -> f32 {
        self.view().as_singular()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor of shape {:?}", &self.shape[..])
    }
}

/// A borrowed view of a [`Tensor`], or of a lower-rank slice of one.
#[derive(Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a [usize],
    data: &'a [f32],
}

impl<'a> TensorView<'a> {
    pub fn shape(&self) -> &'a [usize] {
        self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Indexes the leading dimension, returning a view of rank one less.
    pub fn index(&self, index: usize) -> TensorView<'a> {
        assert!(
            !self.shape.is_empty(),
            "cannot index a tensor of rank 0",
        );
        assert!(
            index < self.shape[0],
            "index {index} out of bounds for dimension of size {}",
            self.shape[0],
        );
        let stride = self.shape[1..].iter().product::<usize>();
        TensorView {
            shape: &self.shape[1..],
            data: &self.data[index * stride..(index + 1) * stride],
        }
    }

    /// Iterates over the leading dimension.
    pub fn iter(&self) -> impl Iterator<Item = TensorView<'a>> + '_ {
        let this = *self;
        (0..self.shape.first().copied().unwrap_or(0)).map(move |i| this.index(i))
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the single element of a view that holds exactly one value (of any rank).
    pub fn as_singular(&self) -> f32 {
        assert_eq!(
            self.data.len(),
            1,
            "`as_singular` called on tensor of shape {:?}",
            self.shape,
        );
        self.data[0]
    }
}

impl fmt::Debug for TensorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TensorView of shape {:?}", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_indexing() {
        let t = Tensor::from_vec(&[2, 3], vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(t.rank(), 2);
        assert_eq!(t.index(0).as_slice(), &[0.0, 1.0, 2.0]);
        assert_eq!(t.index(1).as_slice(), &[10.0, 11.0, 12.0]);
        assert_eq!(t.index(1).index(2).as_singular(), 12.0);
    }

    #[test]
    fn iterates_leading_dimension() {
        let t = Tensor::from_vec(&[3, 1], vec![5.0, 6.0, 7.0]);
        let rows: Vec<f32> = t.view().iter().map(|row| row.as_singular()).collect();
        assert_eq!(rows, [5.0, 6.0, 7.0]);
    }

    #[test]
    fn singular_of_nested_shape() {
        let t = Tensor::from_vec(&[1, 1, 1], vec![9.0]);
        assert_eq!(t.as_singular(), 9.0);
    }

    #[test]
    #[should_panic]
    fn rejects_wrong_length() {
        Tensor::from_vec(&[2, 2], vec![1.0]);
    }

    #[test]
    #[should_panic]
    fn rejects_out_of_bounds_index() {
        let t = Tensor::from_vec(&[2], vec![1.0, 2.0]);
        t.index(2);
    }
}
