//! Neural network inference.
//!
//! Networks are loaded from ONNX files at runtime and executed on the CPU by
//! [tract](https://github.com/sonos/tract).

mod tensor;

use std::{
    env, fmt,
    ops::{Index, RangeInclusive},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context};
use tract_onnx::prelude::{
    Framework, Graph, InferenceModelExt, SimplePlan, TValue, TVec, TypedFact, TypedOp,
};

use crate::image::{AsImageView, Color, ImageView, Resolution};

pub use tensor::{Tensor, TensorView};

/// Environment variable overriding the directory pretrained models are loaded from.
const ENV_MODEL_DIR: &str = "HANDCAM_MODEL_DIR";

/// Returns the path of a pretrained model file.
///
/// Models are looked up in `models/` next to the working directory, or in the directory named by
/// the `HANDCAM_MODEL_DIR` environment variable when set.
pub fn model_path(file_name: &str) -> PathBuf {
    let dir = env::var_os(ENV_MODEL_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("models"));
    dir.join(file_name)
}

type Model = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A neural network plan, ready for inference.
///
/// Cheap to [`Clone`]: all clones share the same loaded plan.
#[derive(Clone)]
pub struct NeuralNetwork(Arc<Model>);

impl NeuralNetwork {
    /// Starts loading a network from an `.onnx` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Loader> {
        let path = path.as_ref();
        match path.extension() {
            Some(ext) if ext == "onnx" => {}
            _ => bail!(
                "neural network file must have `.onnx` extension: '{}'",
                path.display(),
            ),
        }
        Ok(Loader {
            path: path.to_owned(),
        })
    }

    pub fn num_inputs(&self) -> usize {
        self.0.model().inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.0.model().outputs.len()
    }

    /// Returns the concrete shape of the `index`th network input.
    pub fn input_shape(&self, index: usize) -> anyhow::Result<Vec<usize>> {
        let fact = self.0.model().input_fact(index)?;
        let shape = fact
            .shape
            .as_concrete()
            .ok_or_else(|| anyhow!("network input {index} has non-concrete shape"))?;
        Ok(shape.to_vec())
    }

    /// Runs inference, returning one [`Tensor`] per network output.
    pub fn estimate(&self, inputs: &Inputs) -> anyhow::Result<Outputs> {
        let values = inputs
            .inner
            .iter()
            .map(to_tract)
            .collect::<anyhow::Result<TVec<TValue>>>()?;
        let result = self.0.run(values)?;
        let inner = result
            .iter()
            .map(from_tract)
            .collect::<anyhow::Result<Vec<Tensor>>>()?;
        Ok(Outputs { inner })
    }
}

impl fmt::Debug for NeuralNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NeuralNetwork ({} -> {})",
            self.num_inputs(),
            self.num_outputs(),
        )
    }
}

fn to_tract(tensor: &Tensor) -> anyhow::Result<TValue> {
    let value = tract_onnx::prelude::Tensor::from_shape(tensor.shape(), tensor.as_slice())?;
    Ok(value.into())
}

fn from_tract(value: &TValue) -> anyhow::Result<Tensor> {
    let slice = value.as_slice::<f32>()?;
    Ok(Tensor::from_vec(value.shape(), slice.to_vec()))
}

/// Returned by [`NeuralNetwork::from_path`].
#[derive(Debug)]
pub struct Loader {
    path: PathBuf,
}

impl Loader {
    /// Loads and optimizes the network.
    pub fn load(self) -> anyhow::Result<NeuralNetwork> {
        let model = tract_onnx::onnx()
            .model_for_path(&self.path)
            .with_context(|| format!("failed to load network from '{}'", self.path.display()))?;
        let plan = model.into_optimized()?.into_runnable()?;
        log::debug!("loaded neural network from '{}'", self.path.display());
        Ok(NeuralNetwork(Arc::new(plan)))
    }
}

/// Tensors passed to [`NeuralNetwork::estimate`].
#[derive(Debug)]
pub struct Inputs {
    inner: Vec<Tensor>,
}

impl Inputs {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<Tensor> for Inputs {
    fn from(tensor: Tensor) -> Self {
        Self {
            inner: vec![tensor],
        }
    }
}

impl FromIterator<Tensor> for Inputs {
    fn from_iter<T: IntoIterator<Item = Tensor>>(iter: T) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Tensors returned by [`NeuralNetwork::estimate`], one per network output.
#[derive(Debug)]
pub struct Outputs {
    inner: Vec<Tensor>,
}

impl Outputs {
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tensor> {
        self.inner.iter()
    }
}

impl Index<usize> for Outputs {
    type Output = Tensor;

    fn index(&self, index: usize) -> &Tensor {
        &self.inner[index]
    }
}

/// Data layout of an image input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CnnInputShape {
    /// `[1, channels, height, width]`
    NCHW,
    /// `[1, height, width, channels]`
    NHWC,
}

/// Maps image colors to the value range expected by a network.
#[derive(Debug, Clone)]
pub struct ColorMapper {
    target_range: RangeInclusive<f32>,
}

impl ColorMapper {
    /// Linearly maps the 0-255 channel range onto `target_range`.
    pub fn linear(target_range: RangeInclusive<f32>) -> Self {
        Self { target_range }
    }

    fn map(&self, color: Color) -> [f32; 3] {
        let (start, end) = (*self.target_range.start(), *self.target_range.end());
        let [r, g, b, _] = color.channels();
        let map = |ch: u8| f32::from(ch) / 255.0 * (end - start) + start;
        [map(r), map(g), map(b)]
    }
}

/// A [`NeuralNetwork`] that takes an image as its single input.
///
/// Wraps the network with the sampling and color mapping needed to turn an [`ImageView`] into the
/// input tensor.
#[derive(Debug, Clone)]
pub struct Cnn {
    nn: NeuralNetwork,
    input_res: Resolution,
    shape: CnnInputShape,
    color_mapper: ColorMapper,
}

impl Cnn {
    /// Wraps a network, checking that its single input matches `shape` with 3 color channels.
    pub fn new(
        nn: NeuralNetwork,
        shape: CnnInputShape,
        color_mapper: ColorMapper,
    ) -> anyhow::Result<Self> {
        if nn.num_inputs() != 1 {
            bail!("CNN network must have exactly 1 input, has {}", nn.num_inputs());
        }
        let dims = nn.input_shape(0)?;
        let (n, c, h, w) = match (shape, &dims[..]) {
            (CnnInputShape::NCHW, &[n, c, h, w]) => (n, c, h, w),
            (CnnInputShape::NHWC, &[n, h, w, c]) => (n, c, h, w),
            _ => bail!("invalid input shape {dims:?} for {shape:?} network"),
        };
        if n != 1 || c != 3 {
            bail!("invalid input shape {dims:?} (expected batch size 1 and 3 color channels)");
        }
        let input_res = Resolution::new(w.try_into()?, h.try_into()?);
        Ok(Self {
            nn,
            input_res,
            shape,
            color_mapper,
        })
    }

    /// Returns the resolution input images are sampled at.
    pub fn input_resolution(&self) -> Resolution {
        self.input_res
    }

    /// Runs inference on an image.
    ///
    /// The view is sampled (nearest-neighbor) at the network's input resolution, so it should
    /// already have the right aspect ratio to avoid distortion.
    pub fn estimate<V: AsImageView>(&self, image: &V) -> anyhow::Result<Outputs> {
        self.estimate_view(image.as_view())
    }

    fn estimate_view(&self, view: ImageView<'_>) -> anyhow::Result<Outputs> {
        let (iw, ih) = (self.input_res.width(), self.input_res.height());
        let sample = |x: u32, y: u32| {
            let sx = (x * view.width()) / iw;
            let sy = (y * view.height()) / ih;
            self.color_mapper.map(view.get(sx, sy))
        };

        let mut data = Vec::with_capacity(3 * iw as usize * ih as usize);
        let shape = match self.shape {
            CnnInputShape::NCHW => {
                for ch in 0..3 {
                    for y in 0..ih {
                        for x in 0..iw {
                            data.push(sample(x, y)[ch]);
                        }
                    }
                }
                [1, 3, ih as usize, iw as usize]
            }
            CnnInputShape::NHWC => {
                for y in 0..ih {
                    for x in 0..iw {
                        data.extend_from_slice(&sample(x, y));
                    }
                }
                [1, ih as usize, iw as usize, 3]
            }
        };
        let tensor = Tensor::from_vec(&shape, data);
        self.nn.estimate(&tensor.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_color_mapper() {
        let mapper = ColorMapper::linear(-1.0..=1.0);
        assert_eq!(mapper.map(Color::BLACK), [-1.0, -1.0, -1.0]);
        assert_eq!(mapper.map(Color::WHITE), [1.0, 1.0, 1.0]);
        let [r, g, b] = mapper.map(Color::rgb8(0, 127, 255));
        assert_eq!(r, -1.0);
        approx::assert_abs_diff_eq!(g, 0.0, epsilon = 0.01);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn linear_color_mapper_unit_range() {
        let mapper = ColorMapper::linear(0.0..=1.0);
        assert_eq!(mapper.map(Color::BLACK), [0.0, 0.0, 0.0]);
        assert_eq!(mapper.map(Color::WHITE), [1.0, 1.0, 1.0]);
    }
}
