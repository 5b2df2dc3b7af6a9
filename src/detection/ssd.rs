//! Anchor generation for Single Shot MultiBox Detector (SSD) networks.
//!
//! SSD networks predict box coordinates relative to a fixed grid of anchors that is determined by
//! the network architecture. Only anchor positions are generated here; the networks this crate
//! uses ignore anchor sizes.

/// Describes one SSD output layer.
pub struct LayerInfo {
    boxes_per_loc: u32,
    width: u32,
    height: u32,
}

impl LayerInfo {
    /// Creates a layer description with `boxes_per_loc` anchors at every position of a
    /// `width x height` grid.
    pub fn new(boxes_per_loc: u32, width: u32, height: u32) -> Self {
        Self {
            boxes_per_loc,
            width,
            height,
        }
    }
}

/// The full list of anchors used by a network.
pub struct Anchors {
    anchors: Vec<Anchor>,
}

impl Anchors {
    /// Computes the anchor positions for a network with the given output layers.
    ///
    /// The order of the generated anchors matches the order in which the network emits box
    /// predictions.
    pub fn calculate(layers: &[LayerInfo]) -> Self {
        let mut anchors = Vec::new();
        for layer in layers {
            for y in 0..layer.height {
                for x in 0..layer.width {
                    for _ in 0..layer.boxes_per_loc {
                        anchors.push(Anchor {
                            x_center: (x as f32 + 0.5) / layer.width as f32,
                            y_center: (y as f32 + 0.5) / layer.height as f32,
                        });
                    }
                }
            }
        }
        Self { anchors }
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anchor> + '_ {
        self.anchors.iter()
    }
}

/// An anchor position, in coordinates normalized to `0.0..=1.0`.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    x_center: f32,
    y_center: f32,
}

impl Anchor {
    pub fn x_center(&self) -> f32 {
        self.x_center
    }

    pub fn y_center(&self) -> f32 {
        self.y_center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_grid() {
        let anchors = Anchors::calculate(&[LayerInfo::new(2, 2, 1)]);
        assert_eq!(anchors.anchor_count(), 4);

        let positions: Vec<_> = anchors.iter().map(|a| (a.x_center(), a.y_center())).collect();
        assert_eq!(
            positions,
            [(0.25, 0.5), (0.25, 0.5), (0.75, 0.5), (0.75, 0.5)],
        );
    }

    #[test]
    fn palm_layer_count() {
        // The layer setup used by the palm detection networks.
        let anchors = Anchors::calculate(&[LayerInfo::new(2, 24, 24), LayerInfo::new(6, 12, 12)]);
        assert_eq!(anchors.anchor_count(), 24 * 24 * 2 + 12 * 12 * 6);
    }
}
